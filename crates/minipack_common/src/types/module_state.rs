use std::fmt::Display;

/// Lifecycle of a module inside one build generation.
///
/// `Pending → Resolving → Resolved → Loading → Loaded → Transforming → Ready`. `Failed` can be
/// entered from every state that is not terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleState {
  Pending,
  Resolving,
  Resolved,
  Loading,
  Loaded,
  Transforming,
  Ready,
  Failed,
}

impl ModuleState {
  pub fn is_terminal(self) -> bool {
    matches!(self, Self::Ready | Self::Failed)
  }

  /// Edges may only leave a module whose id is known.
  pub fn is_at_least_resolved(self) -> bool {
    !matches!(self, Self::Pending | Self::Resolving | Self::Failed)
  }

  pub fn can_transition_to(self, next: Self) -> bool {
    match (self, next) {
      (current, Self::Failed) => !current.is_terminal(),
      (Self::Pending, Self::Resolving)
      | (Self::Resolving, Self::Resolved)
      | (Self::Resolved, Self::Loading)
      | (Self::Loading, Self::Loaded)
      | (Self::Loaded, Self::Transforming)
      | (Self::Transforming, Self::Ready) => true,
      _ => false,
    }
  }
}

impl Display for ModuleState {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let name = match self {
      Self::Pending => "pending",
      Self::Resolving => "resolving",
      Self::Resolved => "resolved",
      Self::Loading => "loading",
      Self::Loaded => "loaded",
      Self::Transforming => "transforming",
      Self::Ready => "ready",
      Self::Failed => "failed",
    };
    f.write_str(name)
  }
}

#[test]
fn test_transitions() {
  use ModuleState::*;
  let happy_path = [Pending, Resolving, Resolved, Loading, Loaded, Transforming, Ready];
  for pair in happy_path.windows(2) {
    assert!(pair[0].can_transition_to(pair[1]), "{} -> {}", pair[0], pair[1]);
  }
  assert!(Loading.can_transition_to(Failed));
  assert!(!Ready.can_transition_to(Failed));
  assert!(!Failed.can_transition_to(Failed));
  assert!(!Pending.can_transition_to(Loading));
  assert!(!Ready.can_transition_to(Pending));
  assert!(Resolved.is_at_least_resolved());
  assert!(!Resolving.is_at_least_resolved());
}
