use oxc_index::IndexVec;

use crate::{ImportRecordIdx, ModuleIdx, ModuleState, NormalModule, RawImportRecord, ResolvedId};

/// Messages sent from module tasks to the module loader, the only writer of the module graph.
pub enum ModuleLoaderMsg {
  Progress { idx: ModuleIdx, state: ModuleState },
  NormalModuleDone(Box<NormalModuleTaskResult>),
  BuildErrors { idx: ModuleIdx, errors: Vec<anyhow::Error> },
}

pub struct NormalModuleTaskResult {
  pub module: NormalModule,
  /// `None` for optional dynamic imports that failed to resolve.
  pub resolved_deps: IndexVec<ImportRecordIdx, Option<ResolvedId>>,
  pub raw_import_records: IndexVec<ImportRecordIdx, RawImportRecord>,
  pub warnings: Vec<anyhow::Error>,
  /// Generation the task ran for. Results of stale generations are dropped.
  pub generation: u64,
  pub from_cache: bool,
}
