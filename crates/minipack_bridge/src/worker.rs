use std::{
  sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
  },
  thread::JoinHandle,
};

use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};

use crate::{BridgeError, ScriptCall, ScriptHost};

pub(crate) struct Request {
  pub call: ScriptCall,
  pub reply: oneshot::Sender<anyhow::Result<serde_json::Value>>,
}

pub(crate) struct Worker {
  pub index: usize,
  tx: Mutex<Option<mpsc::UnboundedSender<Request>>>,
  thread: Mutex<Option<JoinHandle<()>>>,
  /// Requests queued or running on this worker.
  pending: AtomicUsize,
}

/// Decrements the pending counter of a worker once the caller stops waiting for it.
pub(crate) struct PendingGuard<'a>(&'a AtomicUsize);

impl Drop for PendingGuard<'_> {
  fn drop(&mut self) {
    self.0.fetch_sub(1, Ordering::AcqRel);
  }
}

impl Worker {
  pub fn spawn<H, F>(index: usize, factory: Arc<F>) -> Result<Self, BridgeError>
  where
    H: ScriptHost,
    F: Fn(usize) -> anyhow::Result<H> + Send + Sync + 'static,
  {
    let (tx, mut rx) = mpsc::unbounded_channel::<Request>();
    let (ready_tx, ready_rx) = std::sync::mpsc::channel::<anyhow::Result<()>>();

    let thread = std::thread::Builder::new()
      .name(format!("minipack-bridge-{index}"))
      .spawn(move || {
        let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
          Ok(runtime) => runtime,
          Err(err) => {
            let _ = ready_tx.send(Err(err.into()));
            return;
          }
        };
        let mut host = match factory(index) {
          Ok(host) => host,
          Err(err) => {
            let _ = ready_tx.send(Err(err));
            return;
          }
        };
        let _ = ready_tx.send(Ok(()));

        tracing::debug!("script worker {index} is running");
        runtime.block_on(async move {
          while let Some(Request { call, reply }) = rx.recv().await {
            tracing::trace!("script worker {index} runs `{}` of {}", call.hook, call.plugin_id);
            let result = host.call(call).await;
            let _ = reply.send(result);
          }
        });
        tracing::debug!("script worker {index} stopped");
      })
      .map_err(|err| BridgeError::Startup { index, cause: err.into() })?;

    match ready_rx.recv() {
      Ok(Ok(())) => {}
      Ok(Err(cause)) => {
        let _ = thread.join();
        return Err(BridgeError::Startup { index, cause });
      }
      Err(_) => {
        let _ = thread.join();
        return Err(BridgeError::Startup {
          index,
          cause: anyhow::anyhow!("the worker thread exited during startup"),
        });
      }
    }

    Ok(Self {
      index,
      tx: Mutex::new(Some(tx)),
      thread: Mutex::new(Some(thread)),
      pending: AtomicUsize::new(0),
    })
  }

  pub fn load(&self) -> usize {
    self.pending.load(Ordering::Acquire)
  }

  pub fn is_open(&self) -> bool {
    self.tx.lock().is_some()
  }

  /// Queues `call` and returns the receiver of its reply together with a guard keeping the
  /// request counted as pending.
  pub fn enqueue(
    &self,
    call: ScriptCall,
  ) -> Result<(oneshot::Receiver<anyhow::Result<serde_json::Value>>, PendingGuard<'_>), BridgeError>
  {
    let (reply, rx) = oneshot::channel();
    let tx = self.tx.lock();
    let Some(tx) = tx.as_ref() else {
      return Err(BridgeError::ShutDown);
    };
    self.pending.fetch_add(1, Ordering::AcqRel);
    let guard = PendingGuard(&self.pending);
    tx.send(Request { call, reply }).map_err(|_| BridgeError::WorkerGone(self.index))?;
    Ok((rx, guard))
  }

  /// Closes the queue and waits for the thread to finish the request it is running.
  pub fn shutdown(&self) {
    self.tx.lock().take();
    if let Some(thread) = self.thread.lock().take() {
      if thread.join().is_err() {
        tracing::error!("script worker {} panicked", self.index);
      }
    }
  }
}
