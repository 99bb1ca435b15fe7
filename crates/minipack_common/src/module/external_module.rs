use oxc_index::IndexVec;

use crate::{ImportRecordIdx, ModuleId, ModuleIdx, ModuleInfo, ResolvedImportRecord, SideEffects};

/// A module left for the runtime to load; imports of it are kept verbatim.
#[derive(Debug, Clone)]
pub struct ExternalModule {
  pub idx: ModuleIdx,
  pub id: ModuleId,
  pub exec_order: u32,
  /// Always empty, externals are never scanned.
  pub import_records: IndexVec<ImportRecordIdx, ResolvedImportRecord>,
  pub importers: Vec<ModuleId>,
  pub dynamic_importers: Vec<ModuleId>,
}

impl ExternalModule {
  pub fn new(idx: ModuleIdx, id: ModuleId) -> Self {
    Self {
      idx,
      id,
      exec_order: u32::MAX,
      import_records: IndexVec::default(),
      importers: Vec::new(),
      dynamic_importers: Vec::new(),
    }
  }

  pub fn to_module_info(&self) -> ModuleInfo {
    ModuleInfo {
      id: self.id.clone(),
      code: None,
      is_entry: false,
      is_external: true,
      side_effects: SideEffects::True,
      tree_shakeable: false,
      importers: self.importers.clone(),
      dynamic_importers: self.dynamic_importers.clone(),
      imported_ids: vec![],
      dynamically_imported_ids: vec![],
    }
  }
}
