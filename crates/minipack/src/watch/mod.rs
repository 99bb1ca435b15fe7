mod fs_watcher;
mod watcher;
mod watcher_event;

pub use self::{
  watcher::{Watcher, WatcherOptions},
  watcher_event::{WatcherChange, WatcherChangeKind, WatcherEvent, WatcherState},
};
