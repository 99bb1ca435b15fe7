use arcstr::ArcStr;
use serde::{Deserialize, Serialize};

use crate::{ModuleId, SideEffects};

/// Snapshot of a module handed to plugins through `get_module_info` and `module_parsed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleInfo {
  pub id: ModuleId,
  pub code: Option<ArcStr>,
  pub is_entry: bool,
  pub is_external: bool,
  pub side_effects: SideEffects,
  /// Advisory: side-effect free and never imported for its bindings.
  pub tree_shakeable: bool,
  pub importers: Vec<ModuleId>,
  pub dynamic_importers: Vec<ModuleId>,
  pub imported_ids: Vec<ModuleId>,
  pub dynamically_imported_ids: Vec<ModuleId>,
}
