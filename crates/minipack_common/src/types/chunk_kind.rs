use arcstr::ArcStr;

use crate::ModuleIdx;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ChunkKind {
  EntryPoint {
    module: ModuleIdx,
    is_user_defined: bool,
  },
  #[default]
  Common,
  /// Created by a manual chunk group.
  Manual {
    group: ArcStr,
  },
}
