use std::{path::Path, sync::Arc};

use anyhow::Context;
use arcstr::ArcStr;
use minipack_common::{
  BuildGeneration, BundleOutput, EntryPoint, ModuleIdx, Output, SharedOptions,
};
use minipack_error::BuildResult;
use minipack_fs::SharedFileSystem;
use minipack_plugin::{
  HookBuildEndArgs, HookGenerateBundleArgs, HookRenderErrorArgs, HookWriteBundleArgs,
  SharedPluginDriver,
};
use rustc_hash::FxHashSet;
use sugar_path::SugarPath;

use crate::{
  BundlerBuilder,
  module_graph::ModuleGraph,
  stages::{
    chunk::{ChunkStage, ChunkStageOutput},
    generate::GenerateStage,
    scan::{ScanStage, ScanStageOutput},
  },
  types::SharedTransformer,
  watch::{WatcherChange, WatcherChangeKind},
};

pub struct Bundler {
  pub closed: bool,
  pub(crate) fs: SharedFileSystem,
  pub(crate) options: SharedOptions,
  pub(crate) plugin_driver: SharedPluginDriver,
  pub(crate) transformer: SharedTransformer,
  pub(crate) generation: BuildGeneration,
  /// Module graph of the last successful build.
  pub(crate) cache: Option<ModuleGraph>,
  /// Files the last build reached before it failed.
  pub(crate) reached_files: Vec<ArcStr>,
}

impl Bundler {
  pub fn builder() -> BundlerBuilder {
    BundlerBuilder::default()
  }

  pub fn options(&self) -> &SharedOptions {
    &self.options
  }

  /// Handle sharing the generation counter of this bundler. Bumping it makes a running build
  /// stale without waiting for it.
  pub fn generation(&self) -> BuildGeneration {
    self.generation.current()
  }

  /// Builds and returns the outputs without touching the file system.
  pub async fn generate(&mut self) -> BuildResult<BundleOutput> {
    self.bundle_up(false).await
  }

  /// Builds, writes every output below the output directory, then runs `write_bundle`.
  pub async fn write(&mut self) -> BuildResult<BundleOutput> {
    let output = self.bundle_up(true).await?;
    self.write_output(&output).await?;
    Ok(output)
  }

  /// Runs `close_bundle` and drops the cache. Later builds fail, later calls do nothing.
  pub async fn close(&mut self) -> BuildResult<()> {
    if self.closed {
      return Ok(());
    }
    self.closed = true;
    self.cache = None;
    self.plugin_driver.close_bundle(&self.generation.current()).await
  }

  /// Files a watcher should follow, also after a failed build: the entry files, the files the last
  /// build reached and the files added through `add_watch_file`. After a successful build this is
  /// [`BundleOutput::watch_files`].
  pub fn watch_files(&self) -> Vec<ArcStr> {
    let cwd = &self.options.cwd;
    let entries = self
      .options
      .input
      .iter()
      .filter(|item| item.import.starts_with('.') || Path::new(&item.import).is_absolute())
      .map(|item| ArcStr::from(&*cwd.join(&item.import).normalize().to_string_lossy()));
    let reached = match &self.cache {
      Some(cache) if self.reached_files.is_empty() => cache.file_ids().cloned().collect(),
      _ => self.reached_files.clone(),
    };

    let mut files =
      entries.chain(reached).chain(self.plugin_driver.watch_files()).collect::<Vec<_>>();
    files.sort_unstable();
    files.dedup();
    files
  }

  /// Marks the modules behind `changes` stale in the cache. A created file nobody imported yet, or
  /// a change to a file added through `add_watch_file`, may change how anything resolves or
  /// loads, so the whole cache goes. Returns the ids whose output may change.
  pub fn invalidate(&mut self, changes: &[WatcherChange]) -> Vec<ArcStr> {
    let extra_watch_files = self.plugin_driver.watch_files();
    let Some(cache) = self.cache.as_mut() else {
      return changes.iter().map(|change| change.path.clone()).collect();
    };

    let mut stale = vec![];
    let mut drop_cache = false;
    for change in changes {
      match cache.get_idx(&change.path) {
        Some(idx) => stale.push(idx),
        None => {
          drop_cache |= change.kind == WatcherChangeKind::Create
            || extra_watch_files.binary_search(&change.path).is_ok();
        }
      }
    }

    if drop_cache {
      tracing::debug!("Dropping the module cache");
      self.cache = None;
      return changes.iter().map(|change| change.path.clone()).collect();
    }

    let affected = cache
      .importers_closure(stale.iter().copied())
      .into_iter()
      .map(|idx| ArcStr::clone(cache[idx].id().inner()))
      .collect::<Vec<_>>();

    for idx in stale {
      if let Some(module) = cache.invalidate(idx) {
        tracing::debug!("Invalidated {}", module.stable_id());
        self.plugin_driver.remove_module_info(module.id().inner());
        self.plugin_driver.file_emitter().forget_module(module.id().inner());
      }
    }
    affected
  }

  #[tracing::instrument(level = "debug", skip_all)]
  async fn bundle_up(&mut self, is_write: bool) -> BuildResult<BundleOutput> {
    if self.closed {
      Err(anyhow::anyhow!(
        "Bundle is already closed, no more calls to 'generate' or 'write' are allowed."
      ))?;
    }

    let generation = self.generation.bump();
    self.generation = generation.clone();
    tracing::debug!("Starting build generation {}", generation.id());

    if self.cache.is_none() {
      self.plugin_driver.clear_build_state();
      self.plugin_driver.file_emitter().clear();
    } else {
      self.plugin_driver.file_emitter().start_build();
    }

    self.plugin_driver.build_start(&generation).await?;

    let mut reached_files = vec![];
    let scan_output = ScanStage::new(
      Arc::clone(&self.fs),
      Arc::clone(&self.options),
      Arc::clone(&self.plugin_driver),
      Arc::clone(&self.transformer),
      generation.clone(),
      self.cache.as_ref(),
    )
    .scan(&mut reached_files)
    .await;
    self.reached_files = reached_files;

    let ScanStageOutput { mut module_graph, entry_points, emitted_chunk_modules, mut warnings } =
      match scan_output {
        Ok(output) => output,
        Err(err) => {
          let err = err.without_cancellations();
          if !err.is_cancelled() {
            let error = err.first().map(|err| format!("{err:#}"));
            self.plugin_driver.build_end(&generation, HookBuildEndArgs { error }).await?;
          }
          return Err(err);
        }
      };
    // Files of modules that left the graph.
    self.plugin_driver.file_emitter().retain_modules(|id| module_graph.get_idx(id).is_some());

    self.plugin_driver.build_end(&generation, HookBuildEndArgs { error: None }).await?;

    self.plugin_driver.render_start(&generation).await?;
    let rendered = self
      .render(&mut module_graph, &entry_points, &emitted_chunk_modules, &generation, &mut warnings)
      .await;
    let assets = match rendered {
      Ok(assets) => assets,
      Err(err) => {
        let err = err.without_cancellations();
        if !err.is_cancelled() {
          let error = err.first().map(|err| format!("{err:#}")).unwrap_or_default();
          self.plugin_driver.render_error(&generation, HookRenderErrorArgs { error }).await?;
        }
        return Err(err);
      }
    };

    let outputs: Arc<[Output]> = assets.clone().into();
    self
      .plugin_driver
      .generate_bundle(&generation, HookGenerateBundleArgs { is_write, outputs })
      .await?;

    let mut watch_files = module_graph
      .modules()
      .filter_map(|module| module.as_normal())
      .filter(|module| !module.is_virtual())
      .map(|module| ArcStr::clone(module.id.inner()))
      .chain(self.plugin_driver.watch_files())
      .collect::<FxHashSet<_>>()
      .into_iter()
      .collect::<Vec<_>>();
    watch_files.sort_unstable();

    self.cache = Some(module_graph);
    self.reached_files.clear();
    Ok(BundleOutput { assets, warnings, watch_files })
  }

  /// Chunks the module graph and renders the chunks and emitted assets.
  async fn render(
    &self,
    module_graph: &mut ModuleGraph,
    entry_points: &[EntryPoint],
    emitted_chunk_modules: &[(ArcStr, ModuleIdx)],
    generation: &BuildGeneration,
    warnings: &mut Vec<anyhow::Error>,
  ) -> BuildResult<Vec<Output>> {
    let ChunkStageOutput { mut chunk_graph, warnings: chunk_warnings, .. } =
      ChunkStage::new(module_graph, entry_points, &self.options).build()?;
    warnings.extend(chunk_warnings);

    let assets = GenerateStage::new(module_graph, &self.options, &self.plugin_driver, generation)
      .generate(&mut chunk_graph, emitted_chunk_modules)
      .await?;
    generation.ensure_fresh()?;
    Ok(assets)
  }

  async fn write_output(&self, output: &BundleOutput) -> BuildResult<()> {
    let dir = self.options.out_dir();
    self
      .fs
      .create_dir_all(&dir)
      .with_context(|| format!("Could not create the output directory {}", dir.display()))?;

    for asset in &output.assets {
      let dest = dir.join(asset.filename());
      if let Some(parent) = dest.parent().filter(|parent| *parent != Path::new("")) {
        self
          .fs
          .create_dir_all(parent)
          .with_context(|| format!("Could not create the directory {}", parent.display()))?;
      }
      self
        .fs
        .write(&dest, asset.content_as_bytes())
        .with_context(|| format!("Could not write {}", dest.display()))?;
    }

    let outputs: Arc<[Output]> = output.assets.clone().into();
    self
      .plugin_driver
      .write_bundle(
        &self.generation,
        HookWriteBundleArgs { dir: dir.to_string_lossy().into_owned(), outputs },
      )
      .await
  }
}
