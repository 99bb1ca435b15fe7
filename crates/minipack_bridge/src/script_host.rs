use arcstr::ArcStr;
use futures::future::LocalBoxFuture;
use minipack_plugin::HookKind;

#[derive(Debug, Clone)]
pub struct ScriptCall {
  pub plugin_id: ArcStr,
  pub hook: HookKind,
  pub args: serde_json::Value,
}

/// A script runtime instance. Lives on exactly one worker thread, so it does not need to be
/// `Send`.
///
/// A hook that is not implemented answers `null`. A returned error is reported as a hook failure
/// of the calling plugin.
pub trait ScriptHost: 'static {
  fn call(&mut self, call: ScriptCall) -> LocalBoxFuture<'_, anyhow::Result<serde_json::Value>>;
}
