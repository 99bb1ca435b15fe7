use arcstr::ArcStr;

use crate::ModuleIdx;

#[derive(Debug, Clone)]
pub struct EntryPoint {
  pub idx: ModuleIdx,
  pub name: Option<ArcStr>,
  pub kind: EntryPointKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryPointKind {
  UserDefined,
  DynamicImport,
  /// Emitted through `emit_file({ type: "chunk" })`, with the reference id and optional fixed
  /// file name.
  Emitted { reference_id: ArcStr, file_name: Option<ArcStr> },
}

impl EntryPointKind {
  pub fn is_user_defined(&self) -> bool {
    matches!(self, Self::UserDefined)
  }
}
