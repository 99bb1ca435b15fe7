#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
  #[error("Cannot find module \"{0}\"")]
  NotFound(String),
  #[error("{0}")]
  Package(#[from] oxc_resolver::ResolveError),
  #[error("Resolved path {0:?} is not valid UTF-8")]
  NonUtf8Path(std::path::PathBuf),
}
