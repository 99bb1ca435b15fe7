//! Runs hooks implemented in a script runtime on a pool of dedicated threads.
//!
//! Every worker thread owns one [`ScriptHost`] and drives it on a current-thread tokio runtime.
//! The bundler talks to workers through channels only: hook arguments are serialized with
//! `serde_json`, queued on the least loaded worker and answered through a oneshot channel.

mod bridge;
mod error;
mod script_host;
mod script_plugin;
mod worker;

pub use crate::{
  bridge::{Bridge, BridgeOptions, InvokeScope},
  error::BridgeError,
  script_host::{ScriptCall, ScriptHost},
  script_plugin::{ScriptHookDescriptor, ScriptPluginDescriptor},
};
