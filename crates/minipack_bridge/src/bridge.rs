use std::sync::Arc;

use arcstr::ArcStr;
use dashmap::DashMap;
use minipack_common::BuildGeneration;
use minipack_error::BuildCancelled;
use minipack_plugin::HookKind;

use crate::{BridgeError, ScriptCall, ScriptHost, worker::Worker};

#[derive(Debug, Clone, Copy)]
pub struct BridgeOptions {
  pub workers: usize,
}

impl Default for BridgeOptions {
  fn default() -> Self {
    Self { workers: std::thread::available_parallelism().map_or(1, |n| n.get().min(4)) }
  }
}

/// What a call is made for.
#[derive(Debug, Clone, Copy)]
pub struct InvokeScope<'a> {
  /// Calls naming the same module run one after another, whichever worker serves them.
  pub module: Option<&'a str>,
  pub generation: &'a BuildGeneration,
}

struct BridgeInner {
  workers: Vec<Worker>,
  module_locks: DashMap<ArcStr, Arc<tokio::sync::Mutex<()>>>,
}

impl Drop for BridgeInner {
  fn drop(&mut self) {
    self.workers.iter().for_each(Worker::shutdown);
  }
}

/// Handle to the worker pool. Cloning is cheap; the threads are joined on [`Bridge::shutdown`] or
/// when the last handle is dropped.
#[derive(Clone)]
pub struct Bridge {
  inner: Arc<BridgeInner>,
}

impl std::fmt::Debug for Bridge {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Bridge").field("workers", &self.inner.workers.len()).finish()
  }
}

impl Bridge {
  /// Spawns `options.workers` threads. `factory` runs on each of them to create its host.
  pub fn new<H, F>(options: BridgeOptions, factory: F) -> Result<Self, BridgeError>
  where
    H: ScriptHost,
    F: Fn(usize) -> anyhow::Result<H> + Send + Sync + 'static,
  {
    let factory = Arc::new(factory);
    let workers = (0..options.workers.max(1))
      .map(|index| Worker::spawn(index, Arc::clone(&factory)))
      .collect::<Result<Vec<_>, _>>()?;
    tracing::debug!("bridge started with {} script workers", workers.len());
    Ok(Self { inner: Arc::new(BridgeInner { workers, module_locks: DashMap::default() }) })
  }

  pub fn worker_count(&self) -> usize {
    self.inner.workers.len()
  }

  /// Runs `hook` of the script plugin `plugin_id` on the least loaded worker.
  ///
  /// A call of a stale generation is not started, and the result of a call whose generation went
  /// stale while it ran is dropped. Both report [`BuildCancelled`].
  pub async fn invoke(
    &self,
    plugin_id: &str,
    hook: HookKind,
    args: serde_json::Value,
    scope: InvokeScope<'_>,
  ) -> anyhow::Result<serde_json::Value> {
    let generation = scope.generation;
    generation.ensure_fresh()?;

    let mut module_slot = scope.module.map(|module| ModuleSlot {
      locks: &self.inner.module_locks,
      module,
      guard: None,
    });
    if let Some(slot) = module_slot.as_mut() {
      slot.guard = Some(self.module_lock(slot.module).lock_owned().await);
    }
    generation.ensure_fresh()?;

    let worker = self.least_loaded_worker().ok_or(BridgeError::ShutDown)?;
    tracing::trace!("`{hook}` of {plugin_id} scheduled on script worker {}", worker.index);
    let (reply, _pending) =
      worker.enqueue(ScriptCall { plugin_id: plugin_id.into(), hook, args })?;
    let result = reply.await.map_err(|_| BridgeError::WorkerGone(worker.index))?;

    if generation.is_stale() {
      tracing::debug!(
        "dropped `{hook}` result of {plugin_id}: generation {} is stale",
        generation.id()
      );
      return Err(BuildCancelled { generation: generation.id() }.into());
    }
    result
  }

  fn module_lock(&self, module: &str) -> Arc<tokio::sync::Mutex<()>> {
    if let Some(lock) = self.inner.module_locks.get(module) {
      return Arc::clone(lock.value());
    }
    Arc::clone(self.inner.module_locks.entry(module.into()).or_default().value())
  }

  fn least_loaded_worker(&self) -> Option<&Worker> {
    let open = self.inner.workers.iter().filter(|worker| worker.is_open()).collect::<Vec<_>>();
    least_loaded(open.iter().map(|worker| worker.load())).map(|position| open[position])
  }

  /// Closes every queue and joins the worker threads. Later calls fail with
  /// [`BridgeError::ShutDown`].
  pub fn shutdown(&self) {
    self.inner.workers.iter().for_each(Worker::shutdown);
  }
}

/// Turn of one call on a module. Dropping it releases the module's lock and removes the lock once
/// no other call holds or waits for it.
struct ModuleSlot<'a> {
  locks: &'a DashMap<ArcStr, Arc<tokio::sync::Mutex<()>>>,
  module: &'a str,
  guard: Option<tokio::sync::OwnedMutexGuard<()>>,
}

impl Drop for ModuleSlot<'_> {
  fn drop(&mut self) {
    // Every waiter and the holder keep a clone of the lock.
    drop(self.guard.take());
    self.locks.remove_if(self.module, |_, lock| Arc::strong_count(lock) == 1);
  }
}

/// Position of the smallest load. Ties go to the lowest position.
fn least_loaded(loads: impl Iterator<Item = usize>) -> Option<usize> {
  loads.enumerate().min_by_key(|(position, load)| (*load, *position)).map(|(position, _)| position)
}

#[cfg(test)]
mod tests {
  use std::{
    sync::{Arc, Mutex},
    time::Duration,
  };

  use futures::future::LocalBoxFuture;
  use minipack_common::BuildGeneration;
  use minipack_error::BuildCancelled;
  use minipack_plugin::HookKind;
  use serde_json::json;

  use super::least_loaded;
  use crate::{Bridge, BridgeError, BridgeOptions, InvokeScope, ScriptCall, ScriptHost};

  type Events = Arc<Mutex<Vec<String>>>;

  /// Echoes the arguments back. `load` blocks its worker for a while, `transform` with
  /// `{ "bump": true }` starts a new build generation before answering.
  struct FakeHost {
    index: usize,
    events: Events,
    generation: BuildGeneration,
  }

  impl ScriptHost for FakeHost {
    fn call(&mut self, call: ScriptCall) -> LocalBoxFuture<'_, anyhow::Result<serde_json::Value>> {
      Box::pin(async move {
        let label = format!("{}:{}", call.hook, call.args["id"].as_str().unwrap_or_default());
        self.events.lock().unwrap().push(format!("start {label}"));
        match call.hook {
          HookKind::Load => std::thread::sleep(Duration::from_millis(50)),
          HookKind::Transform if call.args["bump"] == json!(true) => {
            let _ = self.generation.bump();
          }
          HookKind::RenderChunk => anyhow::bail!("render failed in {}", call.plugin_id),
          _ => {}
        }
        self.events.lock().unwrap().push(format!("end {label}"));
        Ok(json!({ "worker": self.index, "args": call.args }))
      })
    }
  }

  fn create_bridge(workers: usize, events: &Events, generation: &BuildGeneration) -> Bridge {
    let events = Arc::clone(events);
    let generation = generation.clone();
    Bridge::new(BridgeOptions { workers }, move |index| {
      Ok(FakeHost { index, events: Arc::clone(&events), generation: generation.clone() })
    })
    .unwrap()
  }

  #[test]
  fn picks_the_least_loaded_worker() {
    assert_eq!(least_loaded([2, 0, 1].into_iter()), Some(1));
    assert_eq!(least_loaded([1, 1, 1].into_iter()), Some(0));
    assert_eq!(least_loaded([3, 2, 2].into_iter()), Some(1));
    assert_eq!(least_loaded(std::iter::empty()), None);
  }

  #[tokio::test(flavor = "multi_thread")]
  async fn calls_on_one_module_are_ordered() {
    let events = Events::default();
    let generation = BuildGeneration::default();
    let bridge = create_bridge(2, &events, &generation);
    let scope = InvokeScope { module: Some("/src/m.js"), generation: &generation };

    let (load, transform) = tokio::join!(
      bridge.invoke("p", HookKind::Load, json!({ "id": "m" }), scope),
      bridge.invoke("p", HookKind::Transform, json!({ "id": "m" }), scope),
    );
    load.unwrap();
    transform.unwrap();

    assert_eq!(
      *events.lock().unwrap(),
      vec!["start load:m", "end load:m", "start transform:m", "end transform:m"]
    );
    assert!(bridge.inner.module_locks.is_empty());
  }

  #[tokio::test(flavor = "multi_thread")]
  async fn module_locks_do_not_outlive_their_calls() {
    let events = Events::default();
    let generation = BuildGeneration::default();
    let bridge = create_bridge(2, &events, &generation);

    let ids = (0..20).map(|n| format!("/src/m{n}.js")).collect::<Vec<_>>();
    let calls = ids.iter().map(|id| {
      let scope = InvokeScope { module: Some(id.as_str()), generation: &generation };
      bridge.invoke("p", HookKind::Transform, json!({ "id": id }), scope)
    });
    for result in futures::future::join_all(calls).await {
      result.unwrap();
    }
    assert!(bridge.inner.module_locks.is_empty());

    // Calls that fail, or never start, release their module as well.
    let stale = generation.clone();
    let current = generation.bump();
    let scope = InvokeScope { module: Some("/src/stale.js"), generation: &stale };
    bridge.invoke("p", HookKind::Load, json!({ "id": "stale" }), scope).await.unwrap_err();
    let scope = InvokeScope { module: Some("/src/render.js"), generation: &current };
    bridge.invoke("p", HookKind::RenderChunk, json!({}), scope).await.unwrap_err();
    assert!(bridge.inner.module_locks.is_empty());
  }

  #[tokio::test(flavor = "multi_thread")]
  async fn unrelated_modules_run_concurrently() {
    let events = Events::default();
    let generation = BuildGeneration::default();
    let bridge = create_bridge(2, &events, &generation);

    let (a, b) = tokio::join!(
      bridge.invoke(
        "p",
        HookKind::Load,
        json!({ "id": "a" }),
        InvokeScope { module: Some("/src/a.js"), generation: &generation }
      ),
      bridge.invoke(
        "p",
        HookKind::Load,
        json!({ "id": "b" }),
        InvokeScope { module: Some("/src/b.js"), generation: &generation }
      ),
    );
    assert_ne!(a.unwrap()["worker"], b.unwrap()["worker"]);
  }

  #[tokio::test(flavor = "multi_thread")]
  async fn stale_calls_are_dropped() {
    let events = Events::default();
    let generation = BuildGeneration::default();
    let bridge = create_bridge(1, &events, &generation);

    let stale = generation.clone();
    let current = generation.bump();
    let scope = InvokeScope { module: None, generation: &stale };
    let err = bridge.invoke("p", HookKind::BuildStart, json!({}), scope).await.unwrap_err();
    assert!(err.is::<BuildCancelled>());
    assert!(events.lock().unwrap().is_empty());

    // The host starts a newer generation while the call runs.
    let scope = InvokeScope { module: Some("/src/x.js"), generation: &current };
    let args = json!({ "id": "x", "bump": true });
    let err = bridge.invoke("p", HookKind::Transform, args, scope).await.unwrap_err();
    assert!(err.is::<BuildCancelled>());
    assert_eq!(*events.lock().unwrap(), vec!["start transform:x", "end transform:x"]);
  }

  #[tokio::test(flavor = "multi_thread")]
  async fn rejections_and_shutdown() {
    let events = Events::default();
    let generation = BuildGeneration::default();
    let bridge = create_bridge(2, &events, &generation);
    let scope = InvokeScope { module: None, generation: &generation };

    let err = bridge.invoke("p", HookKind::RenderChunk, json!({}), scope).await.unwrap_err();
    assert_eq!(err.to_string(), "render failed in p");

    bridge.shutdown();
    let err = bridge.invoke("p", HookKind::BuildStart, json!({}), scope).await.unwrap_err();
    assert!(matches!(err.downcast_ref::<BridgeError>(), Some(BridgeError::ShutDown)));
  }

  #[test]
  fn failing_factory_fails_startup() {
    let result = Bridge::new(BridgeOptions { workers: 2 }, |index| -> anyhow::Result<FakeHost> {
      anyhow::bail!("no runtime for worker {index}")
    });
    assert!(matches!(result, Err(BridgeError::Startup { index: 0, .. })));
  }
}
