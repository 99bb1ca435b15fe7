use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HookKind {
  ResolveId,
  Load,
  Transform,
  ModuleParsed,
  RenderChunk,
  BuildStart,
  BuildEnd,
  RenderStart,
  RenderError,
  GenerateBundle,
  WriteBundle,
  CloseBundle,
}

impl HookKind {
  pub const ALL: [Self; 12] = [
    Self::ResolveId,
    Self::Load,
    Self::Transform,
    Self::ModuleParsed,
    Self::RenderChunk,
    Self::BuildStart,
    Self::BuildEnd,
    Self::RenderStart,
    Self::RenderError,
    Self::GenerateBundle,
    Self::WriteBundle,
    Self::CloseBundle,
  ];

  /// A plugin may register an exclusive hook kind at most once. Notification hooks can be
  /// registered repeatedly.
  pub fn is_exclusive(self) -> bool {
    !matches!(
      self,
      Self::BuildStart
        | Self::BuildEnd
        | Self::RenderStart
        | Self::RenderError
        | Self::GenerateBundle
        | Self::WriteBundle
        | Self::CloseBundle
    )
  }

  /// Hooks called for one module. Files they emit belong to that module.
  pub fn is_module_hook(self) -> bool {
    matches!(self, Self::ResolveId | Self::Load | Self::Transform | Self::ModuleParsed)
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Self::ResolveId => "resolveId",
      Self::Load => "load",
      Self::Transform => "transform",
      Self::ModuleParsed => "moduleParsed",
      Self::RenderChunk => "renderChunk",
      Self::BuildStart => "buildStart",
      Self::BuildEnd => "buildEnd",
      Self::RenderStart => "renderStart",
      Self::RenderError => "renderError",
      Self::GenerateBundle => "generateBundle",
      Self::WriteBundle => "writeBundle",
      Self::CloseBundle => "closeBundle",
    }
  }
}

impl Display for HookKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

#[test]
fn test_hook_kind_serde() {
  assert_eq!(serde_json::to_string(&HookKind::ResolveId).unwrap(), "\"resolveId\"");
  for kind in HookKind::ALL {
    assert_eq!(serde_json::to_value(kind).unwrap(), kind.as_str());
  }
  assert!(HookKind::Transform.is_exclusive());
  assert!(!HookKind::BuildEnd.is_exclusive());
  assert!(!HookKind::CloseBundle.is_exclusive());
  assert_eq!(serde_json::to_string(&HookKind::GenerateBundle).unwrap(), "\"generateBundle\"");
  assert!(HookKind::ResolveId.is_module_hook());
  assert!(!HookKind::RenderChunk.is_module_hook());
}
