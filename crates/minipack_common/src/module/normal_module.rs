use std::sync::Arc;

use arcstr::ArcStr;
use minipack_sourcemap::SourceMap;
use oxc_index::IndexVec;

use crate::{
  ImportRecordIdx, ModuleId, ModuleIdx, ModuleInfo, ModuleType, ResolvedImportRecord, SideEffects,
};

#[derive(Debug, Clone)]
pub struct NormalModule {
  pub exec_order: u32,
  pub idx: ModuleIdx,
  pub is_user_defined_entry: bool,
  pub id: ModuleId,
  /// `stable_id` is calculated based on `id` to be stable across machine and os.
  pub stable_id: String,
  pub repr_name: String,
  pub module_type: ModuleType,
  /// Source as returned by the load stage.
  pub source: ArcStr,
  /// Code after the transform hooks and the syntax transformer.
  pub code: ArcStr,
  /// Maps `code` back to `source`.
  pub sourcemap: Option<Arc<SourceMap>>,
  pub import_records: IndexVec<ImportRecordIdx, ResolvedImportRecord>,
  pub side_effects: SideEffects,
  pub tree_shakeable: bool,
  pub importers: Vec<ModuleId>,
  pub dynamic_importers: Vec<ModuleId>,
  pub imported_ids: Vec<ModuleId>,
  pub dynamically_imported_ids: Vec<ModuleId>,
  /// The build generation this module was last loaded and transformed in.
  pub generation: u64,
}

impl NormalModule {
  /// Modules whose id starts with `\0` are virtual and have no file on disk to map back to.
  pub fn is_virtual(&self) -> bool {
    self.id.starts_with('\0')
  }

  pub fn size(&self) -> usize {
    self.code.len()
  }

  pub fn to_module_info(&self) -> ModuleInfo {
    ModuleInfo {
      id: self.id.clone(),
      code: Some(self.code.clone()),
      is_entry: self.is_user_defined_entry,
      is_external: false,
      side_effects: self.side_effects,
      tree_shakeable: self.tree_shakeable,
      importers: {
        let mut value = self.importers.clone();
        value.sort_unstable();
        value
      },
      dynamic_importers: {
        let mut value = self.dynamic_importers.clone();
        value.sort_unstable();
        value
      },
      imported_ids: self.imported_ids.clone(),
      dynamically_imported_ids: self.dynamically_imported_ids.clone(),
    }
  }
}
