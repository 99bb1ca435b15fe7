use std::path::Path;

use arcstr::ArcStr;
use minipack_common::{BuildGeneration, ModuleType, ResolvedId, SideEffects};
use minipack_error::{BuildResult, BundleError};
use minipack_fs::FileSystem;
use minipack_plugin::PluginDriver;

pub struct LoadedSource {
  pub code: ArcStr,
  pub module_type: ModuleType,
  /// Only set when a `load` hook declared it.
  pub side_effects: Option<SideEffects>,
}

/// Runs the `load` chain and falls back to reading the file.
///
/// The module type is taken from the hook, then from the import attribute, then from the
/// extension.
pub async fn load_source(
  driver: &PluginDriver,
  fs: &dyn FileSystem,
  generation: &BuildGeneration,
  resolved_id: &ResolvedId,
  asserted_module_type: Option<&ModuleType>,
  importer: Option<&str>,
) -> BuildResult<LoadedSource> {
  let id = &resolved_id.id;
  let fallback_type =
    || asserted_module_type.cloned().unwrap_or_else(|| ModuleType::from_extension(id));

  if let Some(output) = driver.load(generation, id).await? {
    return Ok(LoadedSource {
      code: output.code.into(),
      module_type: output.module_type.unwrap_or_else(fallback_type),
      side_effects: output.side_effects,
    });
  }

  let code = fs.read_to_string(Path::new(id.as_str())).map_err(|err| BundleError::Load {
    id: id.to_string(),
    reason: match importer {
      Some(importer) => format!("{err} (imported by {importer:?})"),
      None => err.to_string(),
    },
  })?;

  Ok(LoadedSource { code: code.into(), module_type: fallback_type(), side_effects: None })
}
