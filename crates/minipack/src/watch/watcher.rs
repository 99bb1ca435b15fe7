use std::{
  path::Path,
  sync::Arc,
  time::{Duration, Instant},
};

use arcstr::ArcStr;
use minipack_common::BundleOutput;
use minipack_error::BuildResult;
use minipack_utils::indexmap::FxIndexMap;
use tokio::{
  sync::{Mutex, broadcast, mpsc, watch},
  task::JoinHandle,
};

use super::{WatcherChange, WatcherChangeKind, WatcherEvent, WatcherState, fs_watcher::FsWatcher};
use crate::Bundler;

#[derive(Debug, Clone)]
pub struct WatcherOptions {
  /// How long to wait for more changes before a rebuild starts.
  pub debounce: Duration,
  /// Write the outputs after every successful build.
  pub write: bool,
  /// Watch the files of the last build on disk. Without it changes only come from
  /// [`Watcher::notify_change`].
  pub use_fs_events: bool,
}

impl Default for WatcherOptions {
  fn default() -> Self {
    Self { debounce: Duration::from_millis(20), write: true, use_fs_events: true }
  }
}

pub(super) enum WatcherMsg {
  Change(WatcherChange),
  Close,
}

/// Rebuilds a bundler whenever the files it depends on change.
///
/// Changes that arrive while a build runs make that build stale instead of waiting for it. Once it
/// returns, a single rebuild covers every change collected meanwhile plus the superseded ones.
pub struct Watcher {
  tx: mpsc::UnboundedSender<WatcherMsg>,
  events: broadcast::Sender<WatcherEvent>,
  /// Subscribed before the first build, so the first subscriber sees every event.
  first_subscriber: Option<broadcast::Receiver<WatcherEvent>>,
  state: watch::Receiver<WatcherState>,
  handle: JoinHandle<()>,
}

impl Watcher {
  /// Starts the coordinator task, which runs the initial build right away. Must be called within a
  /// tokio runtime.
  pub fn new(bundler: Arc<Mutex<Bundler>>, options: WatcherOptions) -> anyhow::Result<Self> {
    let (tx, rx) = mpsc::unbounded_channel();
    let (events, first_subscriber) = broadcast::channel(256);
    let (state_tx, state) = watch::channel(WatcherState::Idle);

    let fs_watcher = if options.use_fs_events { Some(FsWatcher::new(tx.clone())?) } else { None };

    let coordinator = Coordinator {
      bundler,
      options,
      rx,
      events: events.clone(),
      state: state_tx,
      fs_watcher,
      pending: FxIndexMap::default(),
      closing: false,
    };
    let handle = tokio::spawn(coordinator.run());

    Ok(Self { tx, events, first_subscriber: Some(first_subscriber), state, handle })
  }

  pub fn subscribe(&mut self) -> broadcast::Receiver<WatcherEvent> {
    self.first_subscriber.take().unwrap_or_else(|| self.events.subscribe())
  }

  pub fn state(&self) -> watch::Receiver<WatcherState> {
    self.state.clone()
  }

  pub fn notify_change(&self, change: WatcherChange) {
    let _ = self.tx.send(WatcherMsg::Change(change));
  }

  /// Cancels a running build and stops watching. Resolves once the coordinator is done.
  pub async fn close(self) {
    let _ = self.tx.send(WatcherMsg::Close);
    if let Err(err) = self.handle.await {
      tracing::error!("The watcher task failed: {err}");
    }
  }
}

struct Coordinator {
  bundler: Arc<Mutex<Bundler>>,
  options: WatcherOptions,
  rx: mpsc::UnboundedReceiver<WatcherMsg>,
  events: broadcast::Sender<WatcherEvent>,
  state: watch::Sender<WatcherState>,
  fs_watcher: Option<FsWatcher>,
  /// Changes not covered by a finished build yet, first kind wins.
  pending: FxIndexMap<ArcStr, WatcherChangeKind>,
  closing: bool,
}

enum BuildOutcome {
  Done,
  Cancelled,
  Failed,
}

impl Coordinator {
  async fn run(mut self) {
    let out_dir = self.bundler.lock().await.options().out_dir();
    let mut rebuild_now = true;

    while !self.closing {
      if !rebuild_now {
        self.set_state(WatcherState::AwaitingChanges);
        match self.rx.recv().await {
          Some(msg) => self.on_msg(msg, &out_dir),
          None => break,
        }
        if self.pending.is_empty() {
          continue;
        }
      }

      tokio::time::sleep(self.options.debounce).await;
      while let Ok(msg) = self.rx.try_recv() {
        self.on_msg(msg, &out_dir);
      }
      if self.closing {
        break;
      }

      let changes = self
        .pending
        .drain(..)
        .map(|(path, kind)| WatcherChange::new(path, kind))
        .collect::<Vec<_>>();
      rebuild_now = match self.build(&changes, &out_dir).await {
        BuildOutcome::Done => !self.pending.is_empty(),
        BuildOutcome::Cancelled => {
          self.requeue(changes);
          true
        }
        BuildOutcome::Failed => {
          // Only changes that came in while the failing build ran start another one.
          let newer_changes = !self.pending.is_empty();
          self.requeue(changes);
          newer_changes
        }
      };
    }

    self.set_state(WatcherState::Idle);
    let _ = self.events.send(WatcherEvent::Close);
    if let Err(err) = self.bundler.lock().await.close().await {
      tracing::warn!("closeBundle failed: {err}");
    }
    tracing::debug!("Watcher closed");
  }

  #[tracing::instrument(level = "debug", skip_all)]
  async fn build(&mut self, changes: &[WatcherChange], out_dir: &Path) -> BuildOutcome {
    let bundler = Arc::clone(&self.bundler);
    let mut bundler = bundler.lock().await;

    if !changes.is_empty() {
      let affected = bundler.invalidate(changes);
      tracing::debug!("Rebuilding for {} changes, {} affected", changes.len(), affected.len());
    }

    let handle = bundler.generation();
    // `bundle_up` starts the next generation.
    let generation = handle.latest() + 1;
    self.set_state(WatcherState::Building);
    let _ = self.events.send(WatcherEvent::BundleStart { generation });

    let start = Instant::now();
    let write = self.options.write;
    let result = {
      let build = async {
        if write { bundler.write().await } else { bundler.generate().await }
      };
      tokio::pin!(build);

      loop {
        // The build is polled first, so it has started `generation` before a message can
        // supersede it.
        tokio::select! {
          biased;
          result = &mut build => break result,
          Some(msg) = self.rx.recv() => {
            self.on_msg(msg, out_dir);
            if (!self.pending.is_empty() || self.closing) && handle.supersede(generation) {
              tracing::debug!("Changes arrived during build generation {generation}");
            }
          }
        }
      }
    };
    let superseded = handle.latest() != generation;
    // A failed build still tells which files it got to, so fixing any of them triggers a rebuild.
    if let (Err(err), Some(fs_watcher)) = (&result, self.fs_watcher.as_mut()) {
      if !err.is_cancelled() {
        fs_watcher.update(&bundler.watch_files());
      }
    }

    self.on_build_result(result, generation, superseded, start.elapsed())
  }

  fn on_build_result(
    &mut self,
    result: BuildResult<BundleOutput>,
    generation: u64,
    superseded: bool,
    duration: Duration,
  ) -> BuildOutcome {
    match result {
      // Finished writing after newer changes came in. The next build overwrites the outputs.
      Ok(_) if superseded => {
        tracing::debug!("Build generation {generation} finished but was superseded");
        BuildOutcome::Cancelled
      }
      Ok(output) => {
        tracing::debug!("Build generation {generation} done in {duration:?}");
        if let Some(fs_watcher) = self.fs_watcher.as_mut() {
          fs_watcher.update(&output.watch_files);
        }
        let output = Arc::new(output);
        let _ = self.events.send(WatcherEvent::BundleEnd { generation, output, duration });
        BuildOutcome::Done
      }
      Err(err) if err.is_cancelled() => {
        tracing::debug!("Build generation {generation} was superseded");
        BuildOutcome::Cancelled
      }
      Err(err) => {
        let _ = self.events.send(WatcherEvent::Error { generation, error: Arc::new(err) });
        BuildOutcome::Failed
      }
    }
  }

  fn on_msg(&mut self, msg: WatcherMsg, out_dir: &Path) {
    match msg {
      WatcherMsg::Change(change) => {
        // Writing the outputs must not trigger another build.
        if Path::new(change.path.as_str()).starts_with(out_dir) {
          return;
        }
        tracing::trace!("{:?} {}", change.kind, change.path);
        self.pending.entry(change.path).or_insert(change.kind);
      }
      WatcherMsg::Close => self.closing = true,
    }
  }

  /// Puts the changes of a build that did not finish back in front of the newer ones.
  fn requeue(&mut self, changes: Vec<WatcherChange>) {
    let newer = std::mem::take(&mut self.pending);
    self.pending = changes.into_iter().map(|change| (change.path, change.kind)).collect();
    for (path, kind) in newer {
      self.pending.entry(path).or_insert(kind);
    }
  }

  fn set_state(&self, state: WatcherState) {
    self.state.send_replace(state);
  }
}
