use std::{sync::Arc, time::Duration};

use arcstr::ArcStr;
use minipack_common::BundleOutput;
use minipack_error::BuildError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WatcherChangeKind {
  Create,
  Modify,
  Delete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatcherChange {
  pub path: ArcStr,
  pub kind: WatcherChangeKind,
}

impl WatcherChange {
  pub fn new(path: impl Into<ArcStr>, kind: WatcherChangeKind) -> Self {
    Self { path: path.into(), kind }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WatcherState {
  /// Not started yet, or closed.
  #[default]
  Idle,
  Building,
  AwaitingChanges,
}

#[derive(Debug, Clone)]
pub enum WatcherEvent {
  BundleStart { generation: u64 },
  BundleEnd { generation: u64, output: Arc<BundleOutput>, duration: Duration },
  Error { generation: u64, error: Arc<BuildError> },
  Close,
}

impl WatcherEvent {
  pub fn generation(&self) -> Option<u64> {
    match self {
      Self::BundleStart { generation }
      | Self::BundleEnd { generation, .. }
      | Self::Error { generation, .. } => Some(*generation),
      Self::Close => None,
    }
  }
}
