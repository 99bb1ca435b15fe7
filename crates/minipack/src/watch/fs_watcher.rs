use std::path::{Path, PathBuf};

use arcstr::ArcStr;
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher as _};
use rustc_hash::FxHashSet;
use tokio::sync::mpsc::UnboundedSender;

use super::{WatcherChange, WatcherChangeKind, watcher::WatcherMsg};

/// Watches the directories holding the files of the last build. Directories are watched instead of
/// files so that a created file is reported as well.
pub struct FsWatcher {
  inner: RecommendedWatcher,
  watched_dirs: FxHashSet<PathBuf>,
}

impl FsWatcher {
  pub fn new(tx: UnboundedSender<WatcherMsg>) -> notify::Result<Self> {
    let inner = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
      let event = match res {
        Ok(event) => event,
        Err(err) => {
          tracing::warn!("File watcher error: {err}");
          return;
        }
      };
      let kind = match event.kind {
        EventKind::Create(_) => WatcherChangeKind::Create,
        EventKind::Modify(_) => WatcherChangeKind::Modify,
        EventKind::Remove(_) => WatcherChangeKind::Delete,
        _ => return,
      };
      for path in event.paths {
        let path = ArcStr::from(path.to_string_lossy());
        // The receiver is gone once the watcher closed.
        let _ = tx.send(WatcherMsg::Change(WatcherChange::new(path, kind)));
      }
    })?;
    Ok(Self { inner, watched_dirs: FxHashSet::default() })
  }

  pub fn update(&mut self, files: &[ArcStr]) {
    let dirs = files
      .iter()
      .filter_map(|file| Path::new(file.as_str()).parent())
      .filter(|dir| dir.is_absolute())
      .map(Path::to_path_buf)
      .collect::<FxHashSet<_>>();

    for dir in self.watched_dirs.difference(&dirs) {
      if let Err(err) = self.inner.unwatch(dir) {
        tracing::debug!("Failed to unwatch {}: {err}", dir.display());
      }
    }
    for dir in dirs.difference(&self.watched_dirs) {
      if let Err(err) = self.inner.watch(dir, RecursiveMode::NonRecursive) {
        tracing::warn!("Failed to watch {}: {err}", dir.display());
      }
    }
    self.watched_dirs = dirs;
  }
}
