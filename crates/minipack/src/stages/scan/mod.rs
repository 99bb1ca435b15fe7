use arcstr::ArcStr;
use futures::future::join_all;
use minipack_common::{BuildGeneration, ImportKind, ResolvedId, SharedOptions};
use minipack_error::{BuildError, BuildResult, BundleError};
use minipack_fs::SharedFileSystem;
use minipack_plugin::SharedPluginDriver;

use crate::{
  module_graph::ModuleGraph,
  module_loader::{ModuleLoader, ModuleLoaderOutput},
  types::SharedTransformer,
  utils::resolve_id::resolve_id,
};

pub type ScanStageOutput = ModuleLoaderOutput;

pub struct ScanStage<'a> {
  fs: SharedFileSystem,
  options: SharedOptions,
  plugin_driver: SharedPluginDriver,
  transformer: SharedTransformer,
  generation: BuildGeneration,
  cache: Option<&'a ModuleGraph>,
}

impl<'a> ScanStage<'a> {
  pub fn new(
    fs: SharedFileSystem,
    options: SharedOptions,
    plugin_driver: SharedPluginDriver,
    transformer: SharedTransformer,
    generation: BuildGeneration,
    cache: Option<&'a ModuleGraph>,
  ) -> Self {
    Self { fs, options, plugin_driver, transformer, generation, cache }
  }

  /// On failure, `reached_files` receives the files the scan got to.
  #[tracing::instrument(level = "debug", skip_all)]
  pub async fn scan(self, reached_files: &mut Vec<ArcStr>) -> BuildResult<ScanStageOutput> {
    if self.options.input.is_empty() {
      Err(BundleError::Configuration("You must supply options.input to minipack".to_string()))?;
    }

    let user_entries = self.resolve_user_defined_entries().await?;

    let module_loader = ModuleLoader::new(
      self.fs,
      self.options,
      self.plugin_driver,
      self.transformer,
      self.generation,
      self.cache,
    );
    module_loader.fetch_all_modules(user_entries, reached_files).await
  }

  /// Entries resolve concurrently. Every failing entry is reported, not only the first one.
  async fn resolve_user_defined_entries(&self) -> BuildResult<Vec<(Option<ArcStr>, ResolvedId)>> {
    let resolved_ids = join_all(self.options.input.iter().map(|input_item| async move {
      let resolved = resolve_id(
        &self.plugin_driver,
        &self.generation,
        &input_item.import,
        None,
        ImportKind::Import,
        true,
      )
      .await;
      (input_item.name.as_deref().map(ArcStr::from), resolved)
    }))
    .await;

    let mut ret = Vec::with_capacity(self.options.input.len());
    let mut errors = vec![];

    for (name, resolved) in resolved_ids {
      match resolved {
        Ok(Ok(resolved_id)) if resolved_id.external => {
          errors.push(BundleError::UnresolvedEntry(resolved_id.id.to_string()).into());
        }
        Ok(Ok(resolved_id)) => ret.push((name, resolved_id)),
        Ok(Err(err)) => errors.push(err.into()),
        Err(err) => errors.extend(err.0),
      }
    }

    if !errors.is_empty() {
      return Err(BuildError(errors).without_cancellations());
    }

    Ok(ret)
  }
}
