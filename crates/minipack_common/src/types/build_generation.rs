use std::sync::{
  Arc,
  atomic::{AtomicU64, Ordering},
};

use minipack_error::BuildCancelled;

/// Identifies one build pass. Cloned into every task of the pass, so concurrent passes never share
/// ambient state; `is_stale` compares against the counter shared by all passes of a bundler.
#[derive(Debug, Clone)]
pub struct BuildGeneration {
  id: u64,
  counter: Arc<AtomicU64>,
}

impl Default for BuildGeneration {
  fn default() -> Self {
    Self { id: 0, counter: Arc::new(AtomicU64::new(0)) }
  }
}

impl BuildGeneration {
  pub fn id(&self) -> u64 {
    self.id
  }

  /// The newest generation started so far.
  pub fn latest(&self) -> u64 {
    self.counter.load(Ordering::Acquire)
  }

  pub fn is_stale(&self) -> bool {
    self.latest() != self.id
  }

  /// Starts a new generation, making every earlier one stale.
  #[must_use]
  pub fn bump(&self) -> Self {
    let id = self.counter.fetch_add(1, Ordering::AcqRel) + 1;
    Self { id, counter: Arc::clone(&self.counter) }
  }

  /// Makes generation `id` stale by starting the one after it. Does nothing and returns `false`
  /// unless `id` is the latest generation, so a generation is superseded at most once.
  pub fn supersede(&self, id: u64) -> bool {
    self.counter.compare_exchange(id, id + 1, Ordering::AcqRel, Ordering::Acquire).is_ok()
  }

  /// Handle to the latest generation.
  #[must_use]
  pub fn current(&self) -> Self {
    Self { id: self.latest(), counter: Arc::clone(&self.counter) }
  }

  pub fn ensure_fresh(&self) -> Result<(), BuildCancelled> {
    if self.is_stale() { Err(BuildCancelled { generation: self.id }) } else { Ok(()) }
  }
}

#[test]
fn test_build_generation() {
  let initial = BuildGeneration::default();
  assert_eq!(initial.id(), 0);
  assert!(!initial.is_stale());

  let first = initial.bump();
  assert_eq!(first.id(), 1);
  assert!(initial.is_stale());
  assert!(!first.is_stale());
  assert!(initial.ensure_fresh().is_err());
  assert_eq!(initial.current().id(), 1);
}

#[test]
fn test_supersede() {
  let handle = BuildGeneration::default();
  let build = handle.bump();
  // Not the latest generation.
  assert!(!handle.supersede(0));
  assert!(!build.is_stale());

  assert!(handle.supersede(build.id()));
  assert!(build.is_stale());
  assert_eq!(handle.latest(), 2);
  assert!(!handle.supersede(build.id()));
  assert_eq!(handle.latest(), 2);
}
