use std::path::Path;

use minipack_common::{BuildGeneration, ImportKind, ResolvedId};
use minipack_resolver::ResolveError;

use crate::{HookResolveIdArgs, PluginDriver, PluginIdx};

#[inline]
fn is_http_url(s: &str) -> bool {
  s.starts_with("http://") || s.starts_with("https://") || s.starts_with("//")
}

#[inline]
fn is_data_url(s: &str) -> bool {
  s.trim_start().starts_with("data:")
}

/// Resolution order: built-in externals, the `external` option, the `resolveId` chain, `node:`
/// builtins, then the default resolver.
///
/// The outer error is a failed hook or a cancelled build, the inner one a specifier nothing could
/// resolve. Callers decide whether the latter is fatal.
pub async fn resolve_id_with_plugins(
  driver: &PluginDriver,
  generation: &BuildGeneration,
  specifier: &str,
  importer: Option<&str>,
  kind: ImportKind,
  is_entry: bool,
  skip: Option<PluginIdx>,
) -> anyhow::Result<Result<ResolvedId, ResolveError>> {
  let options = driver.options();

  // Auto external http url or data url
  if is_http_url(specifier) || is_data_url(specifier) || options.is_external(specifier) {
    return Ok(Ok(ResolvedId::external(specifier)));
  }

  let args = HookResolveIdArgs {
    specifier: specifier.into(),
    importer: importer.map(Into::into),
    kind,
    is_entry,
  };
  if let Some(output) = driver.resolve_id(generation, &args, skip).await? {
    let external = output.external.unwrap_or(false) || options.is_external(&output.id);
    return Ok(Ok(ResolvedId { id: output.id.into(), external }));
  }

  if specifier.starts_with("node:") {
    return Ok(Ok(ResolvedId::external(specifier)));
  }

  let resolved = driver.resolver().resolve(importer.map(Path::new), specifier, is_entry);
  Ok(resolved.map(|id| {
    if options.is_external(&id) { ResolvedId::external(id) } else { ResolvedId::new(id) }
  }))
}
