mod module_task;
pub mod task_context;

use std::sync::Arc;

use arcstr::ArcStr;
use minipack_common::{
  BuildGeneration, EntryPoint, EntryPointKind, ExternalModule, ImportKind, ImportRecordIdx, Module,
  ModuleId, ModuleIdx, ModuleLoaderMsg, ModuleState, ModuleType, NormalModuleTaskResult,
  RawImportRecord, ResolvedId, SharedOptions,
};
use minipack_error::{BuildCancelled, BuildError, BuildResult, BuildWarning, BundleError};
use minipack_fs::SharedFileSystem;
use minipack_plugin::SharedPluginDriver;
use oxc_index::IndexVec;
use rustc_hash::FxHashSet;
use tokio::sync::mpsc::UnboundedReceiver;

use self::{module_task::ModuleTask, task_context::TaskContext};
use crate::{module_graph::ModuleGraph, types::SharedTransformer, utils::resolve_id::resolve_id};

/// The only writer of the module graph. Module tasks run concurrently and report back through an
/// unbounded channel; every graph mutation happens in [`ModuleLoader::fetch_all_modules`].
pub struct ModuleLoader<'cache> {
  rx: UnboundedReceiver<ModuleLoaderMsg>,
  remaining: u32,
  shared_context: Arc<TaskContext>,
  graph: ModuleGraph,
  /// Graph of the last successful build. Modules still in there are reused without running any
  /// hook.
  cache: Option<&'cache ModuleGraph>,
  user_defined_entries: FxHashSet<ModuleIdx>,
  /// Reference ids of the emitted chunks that were added as entries.
  emitted_chunks: FxHashSet<ArcStr>,
  emitted_chunk_modules: Vec<(ArcStr, ModuleIdx)>,
  entry_points: Vec<EntryPoint>,
  warnings: Vec<anyhow::Error>,
  errors: Vec<anyhow::Error>,
}

#[derive(Debug)]
pub struct ModuleLoaderOutput {
  pub module_graph: ModuleGraph,
  /// User defined entries in declaration order, then dynamic import entries ordered by stable id,
  /// then emitted chunks.
  pub entry_points: Vec<EntryPoint>,
  /// Module of every emitted chunk reference. Several references may share a module, and so one
  /// entry point.
  pub emitted_chunk_modules: Vec<(ArcStr, ModuleIdx)>,
  pub warnings: Vec<anyhow::Error>,
}

impl<'cache> ModuleLoader<'cache> {
  pub fn new(
    fs: SharedFileSystem,
    options: SharedOptions,
    plugin_driver: SharedPluginDriver,
    transformer: SharedTransformer,
    generation: BuildGeneration,
    cache: Option<&'cache ModuleGraph>,
  ) -> Self {
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    let shared_context =
      Arc::new(TaskContext { fs, options, plugin_driver, transformer, generation, tx });
    Self {
      rx,
      remaining: 0,
      shared_context,
      graph: ModuleGraph::default(),
      cache,
      user_defined_entries: FxHashSet::default(),
      emitted_chunks: FxHashSet::default(),
      emitted_chunk_modules: vec![],
      entry_points: vec![],
      warnings: vec![],
      errors: vec![],
    }
  }

  fn try_spawn_new_task(
    &mut self,
    resolved_id: ResolvedId,
    importer: Option<&ArcStr>,
    is_user_defined_entry: bool,
    asserted_module_type: Option<ModuleType>,
  ) -> BuildResult<ModuleIdx> {
    let (idx, inserted) = self.graph.add_module(resolved_id.clone());
    if !inserted {
      return Ok(idx);
    }
    // Whoever found this module already resolved its id.
    self.graph.advance_to(idx, ModuleState::Resolved).map_err(anyhow::Error::from)?;

    if resolved_id.external {
      self.graph.set_module(ExternalModule::new(idx, ModuleId::new(resolved_id.id)).into());
      // Externals are never loaded, they go straight through.
      self.graph.advance_to(idx, ModuleState::Ready).map_err(anyhow::Error::from)?;
      return Ok(idx);
    }

    if self.try_reuse_cached_module(idx, &resolved_id, is_user_defined_entry) {
      return Ok(idx);
    }

    self.remaining += 1;
    let task = ModuleTask::new(
      Arc::clone(&self.shared_context),
      idx,
      importer.cloned(),
      resolved_id,
      is_user_defined_entry,
      asserted_module_type,
    );
    tokio::spawn(task.run());

    Ok(idx)
  }

  /// Sends the cached copy of a module through the same path a finished task takes. Its imports
  /// point at the ids they resolved to last time, so they are spawned or reused in turn.
  fn try_reuse_cached_module(
    &mut self,
    idx: ModuleIdx,
    resolved_id: &ResolvedId,
    is_user_defined_entry: bool,
  ) -> bool {
    let Some(cache) = self.cache else { return false };
    let Some(cached_idx) = cache.get_idx(&resolved_id.id) else { return false };
    if cache.state(cached_idx) != ModuleState::Ready {
      return false;
    }
    let Some(Module::Normal(cached)) = cache.get(cached_idx) else { return false };

    let generation = self.shared_context.generation.id();
    let mut module = cached.as_ref().clone();
    module.idx = idx;
    module.exec_order = u32::MAX;
    module.is_user_defined_entry = is_user_defined_entry;
    module.generation = generation;
    module.tree_shakeable = false;
    module.importers.clear();
    module.dynamic_importers.clear();

    let mut warnings = vec![];
    let mut raw_import_records = IndexVec::<ImportRecordIdx, RawImportRecord>::default();
    let mut resolved_deps = IndexVec::<ImportRecordIdx, Option<ResolvedId>>::default();
    for record in std::mem::take(&mut module.import_records) {
      let resolved = record.resolved_module().map(|target| cache.resolved_id(target).clone());
      if resolved.is_none() {
        warnings.push(
          BuildWarning::UnresolvedDynamicImport {
            specifier: record.specifier.to_string(),
            importer: module.stable_id.clone(),
          }
          .into(),
        );
      }
      resolved_deps.push(resolved);
      raw_import_records.push(RawImportRecord {
        state: (),
        specifier: record.specifier,
        kind: record.kind,
        asserted_module_type: record.asserted_module_type,
        specifier_span: record.specifier_span,
        statement_span: record.statement_span,
        meta: record.meta,
      });
    }

    tracing::trace!("reusing {} from the cache", module.stable_id);
    self.remaining += 1;
    let _ = self.shared_context.tx.send(ModuleLoaderMsg::NormalModuleDone(Box::new(
      NormalModuleTaskResult {
        module,
        resolved_deps,
        raw_import_records,
        warnings,
        generation,
        from_cache: true,
      },
    )));
    true
  }

  /// Adds chunks emitted through `emit_file` since the last call as entries.
  async fn add_emitted_chunks(&mut self) -> BuildResult<()> {
    let ctx = Arc::clone(&self.shared_context);
    for (reference_id, chunk) in ctx.plugin_driver.file_emitter().emitted_chunks() {
      if !self.emitted_chunks.insert(reference_id.clone()) {
        continue;
      }
      let resolved = resolve_id(
        &ctx.plugin_driver,
        &ctx.generation,
        &chunk.id,
        chunk.importer.as_deref(),
        ImportKind::Import,
        true,
      )
      .await?;
      let resolved_id = match resolved {
        Ok(resolved_id) if resolved_id.external => {
          self.errors.push(BundleError::UnresolvedEntry(resolved_id.id.to_string()).into());
          continue;
        }
        Ok(resolved_id) => resolved_id,
        Err(err) => {
          self.errors.push(err.into());
          continue;
        }
      };
      let idx = self.try_spawn_new_task(resolved_id, None, false, None)?;
      self.emitted_chunk_modules.push((reference_id.clone(), idx));
      self.entry_points.push(EntryPoint {
        idx,
        name: chunk.name.map(ArcStr::from),
        kind: EntryPointKind::Emitted {
          reference_id,
          file_name: chunk.file_name.map(ArcStr::from),
        },
      });
    }
    Ok(())
  }

  fn on_module_done(
    &mut self,
    result: NormalModuleTaskResult,
    dynamic_import_entries: &mut FxHashSet<ModuleIdx>,
  ) -> BuildResult<()> {
    let NormalModuleTaskResult {
      mut module,
      resolved_deps,
      raw_import_records,
      warnings,
      generation,
      from_cache,
    } = result;
    let idx = module.idx;

    let current = &self.shared_context.generation;
    if generation != current.id() || current.is_stale() {
      tracing::debug!("dropping {} of stale generation {generation}", module.stable_id);
      let _ = self.graph.transition(idx, ModuleState::Failed);
      Err(BuildCancelled { generation })?;
    }

    self.warnings.extend(warnings);
    let importer = ArcStr::clone(module.id.inner());

    let mut import_records = IndexVec::with_capacity(raw_import_records.len());
    for (raw_record, resolved) in raw_import_records.into_iter().zip(resolved_deps) {
      let Some(resolved_id) = resolved else {
        import_records.push(raw_record.into_resolved(None));
        continue;
      };
      let target = self.try_spawn_new_task(
        resolved_id,
        Some(&importer),
        false,
        raw_record.asserted_module_type.clone(),
      )?;
      self.graph.add_edge(idx, target, raw_record.kind).map_err(anyhow::Error::from)?;
      if raw_record.kind.is_dynamic() && !self.user_defined_entries.contains(&target) {
        dynamic_import_entries.insert(target);
      }
      import_records.push(raw_record.into_resolved(Some(target)));
    }
    module.import_records = import_records;

    if from_cache {
      let info = Arc::new(module.to_module_info());
      self.shared_context.plugin_driver.set_module_info(importer, info);
    }
    self.graph.set_module(module.into());
    self.graph.advance_to(idx, ModuleState::Ready).map_err(anyhow::Error::from)?;
    Ok(())
  }

  #[tracing::instrument(level = "debug", skip_all)]
  pub async fn fetch_all_modules(
    mut self,
    user_defined_entries: Vec<(Option<ArcStr>, ResolvedId)>,
    reached_files: &mut Vec<ArcStr>,
  ) -> BuildResult<ModuleLoaderOutput> {
    for (name, resolved_id) in user_defined_entries {
      let idx = self.try_spawn_new_task(resolved_id, None, true, None)?;
      self.user_defined_entries.insert(idx);
      self.entry_points.push(EntryPoint { idx, name, kind: EntryPointKind::UserDefined });
    }
    let user_defined_count = self.entry_points.len();
    self.add_emitted_chunks().await?;

    let mut dynamic_import_entries = FxHashSet::default();

    while self.remaining > 0 {
      let Some(msg) = self.rx.recv().await else {
        break;
      };

      match msg {
        ModuleLoaderMsg::Progress { idx, state } => {
          if let Err(err) = self.graph.transition(idx, state) {
            self.errors.push(err.into());
          }
        }
        ModuleLoaderMsg::NormalModuleDone(result) => {
          self.remaining -= 1;
          if let Err(errors) = self.on_module_done(*result, &mut dynamic_import_entries) {
            self.errors.extend(errors.0);
          }
        }
        ModuleLoaderMsg::BuildErrors { idx, errors } => {
          self.remaining -= 1;
          let _ = self.graph.transition(idx, ModuleState::Failed);
          self.errors.extend(errors);
        }
      }

      if let Err(errors) = self.add_emitted_chunks().await {
        self.errors.extend(errors.0);
      }
    }

    if !self.errors.is_empty() {
      reached_files.extend(self.graph.file_ids().cloned());
      return Err(BuildError(self.errors).without_cancellations());
    }
    debug_assert!(self.graph.is_complete());

    let emitted_entries =
      self.entry_points.iter().map(|entry| entry.idx).collect::<FxHashSet<_>>();
    let mut dynamic_import_entries = dynamic_import_entries
      .into_iter()
      .filter(|idx| !emitted_entries.contains(idx))
      .collect::<Vec<_>>();
    dynamic_import_entries.sort_unstable_by(|a, b| {
      self.graph[*a].stable_id().cmp(self.graph[*b].stable_id())
    });

    // User entries keep their position in front, dynamic entries come before emitted ones.
    let emitted = self.entry_points.split_off(user_defined_count);
    let mut entry_points = self.entry_points;
    entry_points.extend(dynamic_import_entries.into_iter().map(|idx| EntryPoint {
      idx,
      name: None,
      kind: EntryPointKind::DynamicImport,
    }));
    let mut seen = entry_points.iter().map(|entry| entry.idx).collect::<FxHashSet<_>>();
    entry_points.extend(emitted.into_iter().filter(|entry| seen.insert(entry.idx)));

    let mut module_graph = self.graph;
    link_importers(&mut module_graph);
    module_graph.mark_tree_shakeable(entry_points.iter().map(|entry| entry.idx));

    let driver = &self.shared_context.plugin_driver;
    for module in module_graph.modules() {
      let info = Arc::new(module.to_module_info());
      driver.set_module_info(ArcStr::clone(module.id().inner()), info);
    }

    Ok(ModuleLoaderOutput {
      module_graph,
      entry_points,
      emitted_chunk_modules: self.emitted_chunk_modules,
      warnings: self.warnings,
    })
  }
}

/// Fills `importers` and `dynamic_importers` of every module, after `module_parsed` ran.
fn link_importers(graph: &mut ModuleGraph) {
  let edges = graph
    .modules()
    .flat_map(|module| {
      module.import_records().iter().filter_map(|record| {
        record.resolved_module().map(|target| (module.id().clone(), target, record.kind))
      })
    })
    .collect::<Vec<_>>();

  for (importer, target, kind) in edges {
    let (importers, dynamic_importers) = match &mut graph[target] {
      Module::Normal(module) => (&mut module.importers, &mut module.dynamic_importers),
      Module::External(module) => (&mut module.importers, &mut module.dynamic_importers),
    };
    let list = if kind.is_static() { importers } else { dynamic_importers };
    if !list.contains(&importer) {
      list.push(importer);
    }
  }
}
