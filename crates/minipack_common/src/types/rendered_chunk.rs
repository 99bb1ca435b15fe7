use arcstr::ArcStr;
use serde::{Deserialize, Serialize};

use crate::ModuleId;

/// Chunk metadata passed to `render_chunk`. File names still contain hash placeholders.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedChunk {
  pub name: ArcStr,
  pub filename: ArcStr,
  pub is_entry: bool,
  pub is_dynamic_entry: bool,
  pub facade_module_id: Option<ModuleId>,
  pub module_ids: Vec<ModuleId>,
  pub imports: Vec<ArcStr>,
  pub dynamic_imports: Vec<ArcStr>,
}
