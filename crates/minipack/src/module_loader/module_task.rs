use std::{path::Path, sync::Arc};

use arcstr::ArcStr;
use minipack_common::{
  ImportRecordIdx, ModuleId, ModuleIdx, ModuleLoaderMsg, ModuleState, ModuleType, NormalModule,
  NormalModuleTaskResult, RawImportRecord, ResolvedId, TransformerArgs,
};
use minipack_error::{BuildResult, BuildWarning};
use minipack_plugin::TransformedSource;
use minipack_sourcemap::{SourceMap, collapse_sourcemaps};
use minipack_utils::path_ext::PathExt;
use oxc_index::IndexVec;

use super::task_context::TaskContext;
use crate::utils::{
  load_source::{LoadedSource, load_source},
  resolve_id::resolve_id,
};

/// Loads, transforms and scans one module, then resolves its imports.
///
/// The task never touches the module graph. It reports progress and its result to the loader.
pub struct ModuleTask {
  ctx: Arc<TaskContext>,
  idx: ModuleIdx,
  importer: Option<ArcStr>,
  resolved_id: ResolvedId,
  is_user_defined_entry: bool,
  /// The module is asserted to be this specific module type.
  asserted_module_type: Option<ModuleType>,
}

impl ModuleTask {
  pub fn new(
    ctx: Arc<TaskContext>,
    idx: ModuleIdx,
    importer: Option<ArcStr>,
    resolved_id: ResolvedId,
    is_user_defined_entry: bool,
    asserted_module_type: Option<ModuleType>,
  ) -> Self {
    Self { ctx, idx, importer, resolved_id, is_user_defined_entry, asserted_module_type }
  }

  pub async fn run(self) {
    if let Err(errors) = self.run_inner().await {
      let _ = self.ctx.tx.send(ModuleLoaderMsg::BuildErrors { idx: self.idx, errors: errors.0 });
    }
  }

  fn progress(&self, state: ModuleState) {
    let _ = self.ctx.tx.send(ModuleLoaderMsg::Progress { idx: self.idx, state });
  }

  async fn run_inner(&self) -> BuildResult<()> {
    let ctx = &self.ctx;
    let generation = &ctx.generation;
    let id = &self.resolved_id.id;
    generation.ensure_fresh()?;

    self.progress(ModuleState::Loading);
    let LoadedSource { code: source, module_type, side_effects } = load_source(
      &ctx.plugin_driver,
      ctx.fs.as_ref(),
      generation,
      &self.resolved_id,
      self.asserted_module_type.as_ref(),
      self.importer.as_deref(),
    )
    .await?;
    self.progress(ModuleState::Loaded);

    generation.ensure_fresh()?;
    self.progress(ModuleState::Transforming);
    let transformed = ctx
      .plugin_driver
      .transform(
        generation,
        id,
        TransformedSource::new(source.clone(), module_type, side_effects),
      )
      .await?;

    let output = ctx.transformer.transform(TransformerArgs {
      id,
      code: &transformed.code,
      module_type: &transformed.module_type,
      sourcemap: ctx.options.sourcemap,
    })?;
    let side_effects = transformed.side_effects.unwrap_or(output.side_effects);

    let mut warnings = vec![];
    // Sourcemaps of the transforms are traced back to the loaded source.
    let sourcemap = output.map.map(|map| match &transformed.sourcemap_chain {
      Some(chain) if !chain.is_empty() => {
        let maps = chain.iter().map(|map| &**map).chain([&map]).collect::<Vec<&SourceMap>>();
        let collapsed = collapse_sourcemaps(&maps, id, &source);
        drop(maps);
        collapsed.unwrap_or(map)
      }
      Some(_) => map,
      None => {
        let module = self.resolved_id.debug_id(&ctx.options.cwd);
        warnings.push(BuildWarning::SourcemapBroken(module).into());
        map
      }
    });
    let resolved_deps = self.resolve_dependencies(&output.import_records, &mut warnings).await?;

    let mut imported_ids: Vec<ModuleId> = vec![];
    let mut dynamically_imported_ids: Vec<ModuleId> = vec![];
    for (record, resolved) in output.import_records.iter().zip(&resolved_deps) {
      let Some(resolved) = resolved else { continue };
      let target = ModuleId::new(ArcStr::clone(&resolved.id));
      let ids =
        if record.kind.is_static() { &mut imported_ids } else { &mut dynamically_imported_ids };
      if !ids.contains(&target) {
        ids.push(target);
      }
    }

    let module_id = ModuleId::new(ArcStr::clone(id));
    let stable_id = module_id.stabilize(&ctx.options.cwd);
    let repr_name = Path::new(id.as_str()).representative_file_name().into_owned();

    let module = NormalModule {
      exec_order: u32::MAX,
      idx: self.idx,
      is_user_defined_entry: self.is_user_defined_entry,
      id: module_id,
      stable_id,
      repr_name,
      module_type: transformed.module_type,
      source,
      code: output.code.into(),
      sourcemap: sourcemap.map(Arc::new),
      import_records: IndexVec::default(),
      side_effects,
      tree_shakeable: false,
      importers: vec![],
      dynamic_importers: vec![],
      imported_ids,
      dynamically_imported_ids,
      generation: generation.id(),
    };

    let info = Arc::new(module.to_module_info());
    ctx.plugin_driver.set_module_info(ArcStr::clone(id), Arc::clone(&info));
    ctx.plugin_driver.module_parsed(generation, &info).await?;

    tracing::trace!("{} is ready", module.stable_id);
    let _ = ctx.tx.send(ModuleLoaderMsg::NormalModuleDone(Box::new(NormalModuleTaskResult {
      module,
      resolved_deps,
      raw_import_records: output.import_records,
      warnings,
      generation: generation.id(),
      from_cache: false,
    })));

    Ok(())
  }

  /// Imports are resolved in source order. A dynamic import nothing can resolve is kept as it is
  /// when `optional_dynamic_imports` is on.
  async fn resolve_dependencies(
    &self,
    import_records: &IndexVec<ImportRecordIdx, RawImportRecord>,
    warnings: &mut Vec<anyhow::Error>,
  ) -> BuildResult<IndexVec<ImportRecordIdx, Option<ResolvedId>>> {
    let ctx = &self.ctx;
    let importer = self.resolved_id.id.as_str();
    let mut resolved_deps = IndexVec::with_capacity(import_records.len());

    for record in import_records {
      let resolved = resolve_id(
        &ctx.plugin_driver,
        &ctx.generation,
        &record.specifier,
        Some(importer),
        record.kind,
        false,
      )
      .await?;

      match resolved {
        Ok(resolved_id) => {
          resolved_deps.push(Some(resolved_id));
        }
        Err(err) if record.kind.is_dynamic() && ctx.options.optional_dynamic_imports => {
          tracing::debug!("{err}");
          warnings.push(
            BuildWarning::UnresolvedDynamicImport {
              specifier: record.specifier.to_string(),
              importer: self.resolved_id.debug_id(&ctx.options.cwd),
            }
            .into(),
          );
          resolved_deps.push(None);
        }
        Err(err) => Err(err)?,
      }
    }

    Ok(resolved_deps)
  }
}
