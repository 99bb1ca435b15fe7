use std::sync::{Arc, Weak};

use arcstr::ArcStr;
use dashmap::{DashMap, DashSet};
use minipack_common::{
  BuildGeneration, EmittedFile, ImportKind, ModuleInfo, ResolvedId, SharedFileEmitter,
  SharedOptions,
};
use minipack_error::BundleError;
use minipack_resolver::SharedResolver;

use crate::{PluginDriver, PluginIdx, resolve_id_with_plugins};

/// State shared by every context handed out by one driver.
#[derive(Debug)]
pub(crate) struct ContextShared {
  pub(crate) driver: Weak<PluginDriver>,
  pub(crate) resolver: SharedResolver,
  pub(crate) options: SharedOptions,
  pub(crate) file_emitter: SharedFileEmitter,
  pub(crate) module_infos: DashMap<ArcStr, Arc<ModuleInfo>>,
  pub(crate) watch_files: DashSet<ArcStr>,
}

#[derive(Debug, Clone)]
pub struct PluginContextResolveOptions {
  pub kind: ImportKind,
  pub is_entry: bool,
  /// Leave the calling plugin out of the resolve chain.
  pub skip_self: bool,
}

impl Default for PluginContextResolveOptions {
  fn default() -> Self {
    Self { kind: ImportKind::Import, is_entry: false, skip_self: true }
  }
}

/// Handed to every hook call. Bound to the calling plugin and to the build generation the call
/// belongs to.
#[derive(Debug, Clone)]
pub struct PluginContext {
  shared: Arc<ContextShared>,
  plugin_idx: PluginIdx,
  plugin_name: ArcStr,
  generation: BuildGeneration,
  /// Set for calls of module hooks.
  module: Option<ArcStr>,
}

impl PluginContext {
  pub(crate) fn new(
    shared: Arc<ContextShared>,
    plugin_idx: PluginIdx,
    plugin_name: ArcStr,
    generation: BuildGeneration,
    module: Option<ArcStr>,
  ) -> Self {
    Self { shared, plugin_idx, plugin_name, generation, module }
  }

  pub fn plugin_name(&self) -> &str {
    &self.plugin_name
  }

  pub fn generation(&self) -> &BuildGeneration {
    &self.generation
  }

  pub fn options(&self) -> &SharedOptions {
    &self.shared.options
  }

  /// Returns the reference id of the file. Emitting the same file twice yields the same id.
  ///
  /// A file emitted by a module hook is dropped from later builds once that module changes.
  pub fn emit_file(&self, file: EmittedFile) -> ArcStr {
    let reference_id = self.shared.file_emitter.emit_file(file, self.module.as_ref());
    tracing::trace!("plugin {} emitted file {reference_id}", self.plugin_name);
    reference_id
  }

  /// Only available once the chunks are generated, e.g. in `writeBundle`.
  pub fn get_file_name(&self, reference_id: &str) -> anyhow::Result<ArcStr> {
    self.shared.file_emitter.get_file_name(reference_id)
  }

  pub async fn resolve(
    &self,
    specifier: &str,
    importer: Option<&str>,
    options: Option<PluginContextResolveOptions>,
  ) -> anyhow::Result<ResolvedId> {
    let options = options.unwrap_or_default();
    let Some(driver) = self.shared.driver.upgrade() else {
      anyhow::bail!("The plugin driver was dropped before `resolve` was called");
    };

    let resolved = resolve_id_with_plugins(
      &driver,
      &self.generation,
      specifier,
      importer,
      options.kind,
      options.is_entry,
      options.skip_self.then_some(self.plugin_idx),
    )
    .await?;

    resolved.map_err(|err| {
      BundleError::Resolve {
        specifier: specifier.to_string(),
        importer: importer.map(ToString::to_string),
        reason: err.to_string(),
      }
      .into()
    })
  }

  /// Info of a module loaded in the current build, `None` if it has not been parsed yet.
  pub fn get_module_info(&self, id: &str) -> Option<Arc<ModuleInfo>> {
    self.shared.module_infos.get(id).map(|info| Arc::clone(info.value()))
  }

  /// Rebuild when `path` changes, even though no module was loaded from it.
  pub fn add_watch_file(&self, path: impl Into<ArcStr>) {
    self.shared.watch_files.insert(path.into());
  }
}
