use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
  #[error("The bridge was shut down")]
  ShutDown,

  #[error("Script worker {0} stopped before replying")]
  WorkerGone(usize),

  #[error("Failed to start script worker {index}: {cause:#}")]
  Startup { index: usize, cause: anyhow::Error },
}
