use minipack_common::{BuildGeneration, ModuleLoaderMsg, SharedOptions};
use minipack_fs::SharedFileSystem;
use minipack_plugin::SharedPluginDriver;
use tokio::sync::mpsc::UnboundedSender;

use crate::types::SharedTransformer;

/// Used to store common data shared between all tasks of one scan.
pub struct TaskContext {
  pub fs: SharedFileSystem,
  pub options: SharedOptions,
  pub plugin_driver: SharedPluginDriver,
  pub transformer: SharedTransformer,
  pub generation: BuildGeneration,
  pub tx: UnboundedSender<ModuleLoaderMsg>,
}
