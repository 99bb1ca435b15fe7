use std::path::Path;

use arcstr::ArcStr;
use serde::{Deserialize, Serialize};

use crate::ModuleId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedId {
  pub id: ArcStr,
  #[serde(default)]
  pub external: bool,
}

impl ResolvedId {
  pub fn new(id: impl Into<ArcStr>) -> Self {
    Self { id: id.into(), external: false }
  }

  pub fn external(id: impl Into<ArcStr>) -> Self {
    Self { id: id.into(), external: true }
  }

  pub fn debug_id(&self, cwd: impl AsRef<Path>) -> String {
    ModuleId::new(ArcStr::clone(&self.id)).stabilize(cwd.as_ref())
  }
}
