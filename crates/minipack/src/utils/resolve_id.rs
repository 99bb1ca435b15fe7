use minipack_common::{BuildGeneration, ImportKind, ResolvedId};
use minipack_error::{BuildResult, BundleError};
use minipack_plugin::{PluginDriver, resolve_id_with_plugins};

/// Resolves `specifier` through the plugin chain and the default resolver.
///
/// Hook failures and cancellation are returned as the outer error. A specifier nothing could
/// resolve is the inner [`BundleError::Resolve`], the caller decides whether it is fatal.
pub async fn resolve_id(
  driver: &PluginDriver,
  generation: &BuildGeneration,
  specifier: &str,
  importer: Option<&str>,
  import_kind: ImportKind,
  is_user_defined_entry: bool,
) -> BuildResult<Result<ResolvedId, BundleError>> {
  let resolved = resolve_id_with_plugins(
    driver,
    generation,
    specifier,
    importer,
    import_kind,
    is_user_defined_entry,
    None,
  )
  .await?;

  Ok(resolved.map_err(|err| BundleError::Resolve {
    specifier: specifier.to_string(),
    importer: importer.map(ToString::to_string),
    reason: err.to_string(),
  }))
}
