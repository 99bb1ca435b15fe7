use std::path::{Path, PathBuf};

use arcstr::ArcStr;
use oxc_resolver::ResolveOptions as OxcResolveOptions;
use sugar_path::SugarPath;

use minipack_common::Platform;
use minipack_fs::SharedFileSystem;

use crate::ResolveError;

const EXTENSIONS: [&str; 8] = [".js", ".mjs", ".cjs", ".ts", ".mts", ".tsx", ".jsx", ".json"];

pub struct Resolver {
  cwd: PathBuf,
  fs: SharedFileSystem,
  package_resolver: oxc_resolver::Resolver,
}

impl std::fmt::Debug for Resolver {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Resolver").field("cwd", &self.cwd).finish_non_exhaustive()
  }
}

impl Resolver {
  pub fn new(platform: Platform, cwd: PathBuf, fs: SharedFileSystem) -> Self {
    let package_resolver = oxc_resolver::Resolver::new(OxcResolveOptions {
      condition_names: platform.condition_names(),
      main_fields: platform.main_fields(),
      extensions: EXTENSIONS.iter().map(ToString::to_string).collect(),
      ..Default::default()
    });

    Self { cwd, fs, package_resolver }
  }

  pub fn cwd(&self) -> &PathBuf {
    &self.cwd
  }

  /// Resolves `specifier` relative to the directory of `importer`, or `cwd` for entries.
  pub fn resolve(
    &self,
    importer: Option<&Path>,
    specifier: &str,
    is_user_defined_entry: bool,
  ) -> Result<ArcStr, ResolveError> {
    let dir = importer
      .filter(|importer| importer.is_absolute())
      .and_then(Path::parent)
      .filter(|inner| inner.components().next().is_some())
      .unwrap_or(self.cwd.as_path());

    let is_path_like = specifier.starts_with('.') || Path::new(specifier).is_absolute();
    if is_path_like {
      let candidate = dir.join(specifier).normalize();
      return self
        .find_file(&candidate)
        .ok_or_else(|| ResolveError::NotFound(specifier.to_string()))
        .and_then(into_arc_str);
    }

    // `{ input: 'main' }` means `<cwd>/main.js` when no package named `main` exists.
    if is_user_defined_entry {
      if let Some(found) = self.find_file(&self.cwd.join(specifier).normalize()) {
        return into_arc_str(found);
      }
    }

    let resolution = self.package_resolver.resolve(dir, specifier)?;
    tracing::trace!("resolved bare specifier {specifier:?} from {dir:?}");
    into_arc_str(resolution.full_path())
  }

  fn find_file(&self, candidate: &Path) -> Option<PathBuf> {
    if self.fs.is_file(candidate) {
      return Some(candidate.to_path_buf());
    }
    let with_extension = |base: &Path| {
      EXTENSIONS.iter().find_map(|ext| {
        let mut path = base.as_os_str().to_os_string();
        path.push(ext);
        let path = PathBuf::from(path);
        self.fs.is_file(&path).then_some(path)
      })
    };
    with_extension(candidate).or_else(|| {
      if self.fs.is_dir(candidate) { with_extension(&candidate.join("index")) } else { None }
    })
  }
}

fn into_arc_str(path: PathBuf) -> Result<ArcStr, ResolveError> {
  match path.to_str() {
    Some(path) => Ok(path.into()),
    None => Err(ResolveError::NonUtf8Path(path)),
  }
}
