mod build_hooks;
mod output_hooks;

use std::sync::Arc;

use arcstr::ArcStr;
use dashmap::{DashMap, DashSet};
use futures::future::{BoxFuture, join_all};
use minipack_common::{BuildGeneration, ModuleInfo, SharedFileEmitter, SharedOptions};
use minipack_error::{BuildCancelled, BuildResult, BundleError};
use minipack_resolver::SharedResolver;

use crate::{
  HookKind, HookRegistration, HookRegistry, HookResult, Plugin, PluginContext, PluginIdx,
  plugin_context::ContextShared,
};

pub use build_hooks::TransformedSource;

pub type SharedPluginDriver = Arc<PluginDriver>;

/// Dispatches hook calls over the registrations of a [`HookRegistry`].
#[derive(Debug)]
pub struct PluginDriver {
  registry: HookRegistry,
  shared: Arc<ContextShared>,
}

impl PluginDriver {
  pub fn new(
    plugins: Vec<Plugin>,
    resolver: SharedResolver,
    options: SharedOptions,
    file_emitter: SharedFileEmitter,
  ) -> Result<SharedPluginDriver, BundleError> {
    let registry = HookRegistry::from_plugins(plugins)?;
    Ok(Arc::new_cyclic(|driver| Self {
      registry,
      shared: Arc::new(ContextShared {
        driver: driver.clone(),
        resolver,
        options,
        file_emitter,
        module_infos: DashMap::default(),
        watch_files: DashSet::default(),
      }),
    }))
  }

  pub fn registry(&self) -> &HookRegistry {
    &self.registry
  }

  pub fn resolver(&self) -> &SharedResolver {
    &self.shared.resolver
  }

  pub fn options(&self) -> &SharedOptions {
    &self.shared.options
  }

  pub fn file_emitter(&self) -> &SharedFileEmitter {
    &self.shared.file_emitter
  }

  /// `module` is the module a call of a module hook is about.
  fn context(
    &self,
    plugin_idx: PluginIdx,
    generation: &BuildGeneration,
    module: Option<&ArcStr>,
  ) -> PluginContext {
    PluginContext::new(
      Arc::clone(&self.shared),
      plugin_idx,
      self.registry.plugin_name(plugin_idx).clone(),
      generation.clone(),
      module.cloned(),
    )
  }

  pub fn set_module_info(&self, id: ArcStr, info: Arc<ModuleInfo>) {
    self.shared.module_infos.insert(id, info);
  }

  pub fn remove_module_info(&self, id: &str) {
    self.shared.module_infos.remove(id);
  }

  pub fn add_watch_file(&self, path: ArcStr) {
    self.shared.watch_files.insert(path);
  }

  pub fn watch_files(&self) -> Vec<ArcStr> {
    let mut files =
      self.shared.watch_files.iter().map(|path| path.key().clone()).collect::<Vec<_>>();
    files.sort_unstable();
    files
  }

  /// Forget per-build state before a build that starts from scratch.
  pub fn clear_build_state(&self) {
    self.shared.module_infos.clear();
    self.shared.watch_files.clear();
  }

  fn hook_error(
    &self,
    plugin_idx: PluginIdx,
    kind: HookKind,
    module: Option<&str>,
    cause: anyhow::Error,
  ) -> anyhow::Error {
    if cause.is::<BuildCancelled>() {
      return cause;
    }
    BundleError::Hook {
      plugin: self.registry.plugin_name(plugin_idx).to_string(),
      hook: kind.as_str(),
      module: module.map(ToString::to_string),
      cause,
    }
    .into()
  }

  /// Fires registrations in dispatch order until one returns `Some`.
  ///
  /// `invoke` returns `None` for registrations that should be skipped, e.g. when their filter
  /// does not match.
  pub async fn dispatch_chain<T>(
    &self,
    kind: HookKind,
    generation: &BuildGeneration,
    module: Option<&str>,
    skip: Option<PluginIdx>,
    mut invoke: impl FnMut(
      &HookRegistration,
      PluginContext,
    ) -> Option<BoxFuture<'static, HookResult<Option<T>>>>,
  ) -> anyhow::Result<Option<T>> {
    let owner = module_owner(kind, module);
    for registration in self.registry.registrations(kind) {
      if skip == Some(registration.plugin_idx) {
        continue;
      }
      generation.ensure_fresh()?;
      let ctx = self.context(registration.plugin_idx, generation, owner.as_ref());
      let Some(call) = invoke(registration, ctx) else {
        continue;
      };
      let value =
        call.await.map_err(|err| self.hook_error(registration.plugin_idx, kind, module, err))?;
      if value.is_some() {
        tracing::trace!(
          "`{kind}` answered by plugin {}",
          self.registry.plugin_name(registration.plugin_idx)
        );
        return Ok(value);
      }
    }
    Ok(None)
  }

  /// Pipes `value` through every registration in dispatch order. A registration returning `None`
  /// leaves the value as it is.
  pub async fn dispatch_sequential<T>(
    &self,
    kind: HookKind,
    generation: &BuildGeneration,
    module: Option<&str>,
    mut value: T,
    mut invoke: impl FnMut(
      &HookRegistration,
      PluginContext,
      &T,
    ) -> Option<BoxFuture<'static, HookResult<Option<T>>>>,
  ) -> anyhow::Result<T> {
    let owner = module_owner(kind, module);
    for registration in self.registry.registrations(kind) {
      generation.ensure_fresh()?;
      let ctx = self.context(registration.plugin_idx, generation, owner.as_ref());
      let Some(call) = invoke(registration, ctx, &value) else {
        continue;
      };
      if let Some(next) =
        call.await.map_err(|err| self.hook_error(registration.plugin_idx, kind, module, err))?
      {
        value = next;
      }
    }
    Ok(value)
  }

  /// Starts every registration in dispatch order and awaits them together. Errors are collected
  /// in dispatch order.
  pub async fn dispatch_parallel(
    &self,
    kind: HookKind,
    generation: &BuildGeneration,
    module: Option<&str>,
    mut invoke: impl FnMut(
      &HookRegistration,
      PluginContext,
    ) -> Option<BoxFuture<'static, HookResult<()>>>,
  ) -> BuildResult<()> {
    generation.ensure_fresh()?;

    let owner = module_owner(kind, module);
    let calls = self
      .registry
      .registrations(kind)
      .iter()
      .filter_map(|registration| {
        let ctx = self.context(registration.plugin_idx, generation, owner.as_ref());
        invoke(registration, ctx).map(|call| async move { (registration.plugin_idx, call.await) })
      })
      .collect::<Vec<_>>();

    let errors = join_all(calls)
      .await
      .into_iter()
      .filter_map(|(plugin_idx, result)| {
        result.err().map(|err| self.hook_error(plugin_idx, kind, module, err))
      })
      .collect::<Vec<_>>();

    if errors.is_empty() { Ok(()) } else { Err(errors.into()) }
  }
}

/// The module that files emitted during a `kind` call belong to.
fn module_owner(kind: HookKind, module: Option<&str>) -> Option<ArcStr> {
  module.filter(|_| kind.is_module_hook()).map(ArcStr::from)
}

#[cfg(test)]
mod tests {
  use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
  };

  use arcstr::ArcStr;
  use minipack_common::{
    AdvancedChunksOptions, BuildGeneration, EmittedAsset, EmittedFile, FileEmitter, ImportKind,
    ModuleType, NormalizedBundlerOptions, Platform,
  };
  use minipack_error::{BuildCancelled, BundleError};
  use minipack_fs::MemoryFileSystem;
  use minipack_resolver::Resolver;
  use minipack_sourcemap::line_sourcemap;
  use minipack_utils::pattern_filter::FilterPattern;

  use crate::{
    HookBuildEndArgs, HookFilter, HookOrder, HookResolveIdOutput, HookTransformOutput, Plugin,
    PluginContext, PluginContextResolveOptions, PluginDriver, PluginIdx, SharedPluginDriver,
    StringFilter, TransformedSource,
  };

  type Log = Arc<Mutex<Vec<String>>>;

  fn create_driver(plugins: Vec<Plugin>) -> SharedPluginDriver {
    let fs = MemoryFileSystem::new([("/src/main.js", "import './dep.js'"), ("/src/dep.js", "")]);
    let options = NormalizedBundlerOptions {
      input: vec![],
      cwd: PathBuf::from("/src"),
      platform: Platform::Browser,
      external: vec![FilterPattern::glob("lodash")],
      optional_dynamic_imports: false,
      dir: "dist".to_string(),
      file: None,
      entry_filenames: "[name].js".to_string(),
      chunk_filenames: "[name]-[hash].js".to_string(),
      asset_filenames: "assets/[name]-[hash][extname]".to_string(),
      sourcemap: false,
      manual_chunks: vec![],
      advanced_chunks: AdvancedChunksOptions::default(),
    };
    let resolver = Resolver::new(Platform::Browser, PathBuf::from("/src"), Arc::new(fs));
    let file_emitter = Arc::new(FileEmitter::default());
    PluginDriver::new(plugins, Arc::new(resolver), Arc::new(options), file_emitter).unwrap()
  }

  fn recording_plugin(name: &'static str, order: HookOrder, log: &Log) -> Plugin {
    let log = Arc::clone(log);
    Plugin::new(name).transform(order, move |_ctx, args| {
      let log = Arc::clone(&log);
      async move {
        log.lock().unwrap().push(name.to_string());
        Ok(Some(HookTransformOutput {
          code: Some(format!("{}{name};", args.code)),
          ..Default::default()
        }))
      }
    })
  }

  fn source(code: &str) -> TransformedSource {
    TransformedSource::new(code.into(), ModuleType::Js, None)
  }

  #[tokio::test]
  async fn sequential_dispatch_respects_tiers() {
    let log = Log::default();
    let driver = create_driver(vec![
      recording_plugin("post", HookOrder::Post, &log),
      recording_plugin("normal-1", HookOrder::Normal, &log),
      recording_plugin("pre", HookOrder::Pre, &log),
      recording_plugin("normal-2", HookOrder::Normal, &log),
    ]);

    let id = ArcStr::from("/src/main.js");
    let out = driver.transform(&BuildGeneration::default(), &id, source("")).await.unwrap();

    assert_eq!(out.code.as_str(), "pre;normal-1;normal-2;post;");
    assert_eq!(*log.lock().unwrap(), vec!["pre", "normal-1", "normal-2", "post"]);
  }

  #[tokio::test]
  async fn transform_maps_chain_until_one_is_missing() {
    let prepend = |name: &'static str, with_map: bool| {
      Plugin::new(name).transform(HookOrder::Normal, move |_ctx, args| async move {
        let code = format!("// {name}\n{}", args.code);
        let map = with_map.then(|| line_sourcemap("/src/main.js", &code));
        Ok(Some(HookTransformOutput { code: Some(code), map, ..Default::default() }))
      })
    };
    let unchanged = Plugin::new("unchanged").transform(HookOrder::Normal, |_ctx, args| async move {
      Ok(Some(HookTransformOutput { code: Some(args.code.to_string()), ..Default::default() }))
    });
    let id = ArcStr::from("/src/main.js");
    let generation = BuildGeneration::default();

    let driver = create_driver(vec![prepend("a", true), unchanged, prepend("b", true)]);
    let out = driver.transform(&generation, &id, source("x")).await.unwrap();
    assert_eq!(out.code.as_str(), "// b\n// a\nx");
    assert_eq!(out.sourcemap_chain.map(|chain| chain.len()), Some(2));

    let driver = create_driver(vec![prepend("a", true), prepend("b", false), prepend("c", true)]);
    let out = driver.transform(&generation, &id, source("x")).await.unwrap();
    assert!(out.sourcemap_chain.is_none());
  }

  #[tokio::test]
  async fn chain_dispatch_stops_at_first_answer() {
    let log = Log::default();
    let answering = |name: &'static str, answer: Option<&'static str>, log: &Log| {
      let log = Arc::clone(log);
      Plugin::new(name).resolve_id(HookOrder::Normal, move |_ctx, _args| {
        let log = Arc::clone(&log);
        async move {
          log.lock().unwrap().push(name.to_string());
          Ok(answer.map(|id| HookResolveIdOutput { id: id.to_string(), external: None }))
        }
      })
    };
    let driver = create_driver(vec![
      answering("skip", None, &log),
      answering("answer", Some("\0virtual"), &log),
      answering("unreached", Some("/never"), &log),
    ]);

    let ctx = driver.context(PluginIdx::new(0), &BuildGeneration::default(), None);
    let options = PluginContextResolveOptions { skip_self: false, ..Default::default() };
    let resolved = ctx.resolve("virtual", None, Some(options)).await.unwrap();
    assert_eq!(resolved.id.as_str(), "\0virtual");
    assert_eq!(*log.lock().unwrap(), vec!["skip", "answer"]);

    // The calling plugin is left out, the rest of the chain still runs.
    let ctx = driver.context(PluginIdx::new(1), &BuildGeneration::default(), None);
    let resolved = ctx.resolve("virtual", None, None).await.unwrap();
    assert_eq!(resolved.id.as_str(), "/never");
    assert_eq!(*log.lock().unwrap(), vec!["skip", "answer", "skip", "unreached"]);
  }

  #[tokio::test]
  async fn filtered_registrations_are_not_invoked() {
    let log = Log::default();
    let filter = HookFilter::id(StringFilter::include([FilterPattern::glob("**/*.ts")]));
    let filtered = {
      let log = Arc::clone(&log);
      Plugin::new("ts-only").load(filter, move |_ctx, args| {
        let log = Arc::clone(&log);
        async move {
          log.lock().unwrap().push(args.id.to_string());
          Ok(None)
        }
      })
    };
    let driver = create_driver(vec![filtered]);
    let generation = BuildGeneration::default();

    assert!(driver.load(&generation, &"/src/a.js".into()).await.unwrap().is_none());
    assert!(driver.load(&generation, &"/src/b.ts".into()).await.unwrap().is_none());
    assert_eq!(*log.lock().unwrap(), vec!["/src/b.ts"]);
  }

  #[tokio::test]
  async fn failures_name_plugin_hook_and_module() {
    let failing = Plugin::new("failing")
      .transform(HookOrder::Normal, |_ctx, _args| async { anyhow::bail!("boom") });
    let driver = create_driver(vec![failing]);

    let id = ArcStr::from("/src/x.js");
    let err = driver.transform(&BuildGeneration::default(), &id, source("")).await.unwrap_err();
    let err = err.downcast_ref::<BundleError>().unwrap();
    assert_eq!(err.plugin_name(), Some("failing"));
    assert_eq!(err.module_id(), Some("/src/x.js"));
    assert!(matches!(err, BundleError::Hook { hook: "transform", .. }));
  }

  #[tokio::test]
  async fn stale_generations_are_not_dispatched() {
    let log = Log::default();
    let driver = create_driver(vec![recording_plugin("a", HookOrder::Normal, &log)]);

    let stale = BuildGeneration::default();
    let _fresh = stale.bump();
    let id = ArcStr::from("/src/main.js");
    let err = driver.transform(&stale, &id, source("")).await.unwrap_err();
    assert!(err.is::<BuildCancelled>());
    assert!(log.lock().unwrap().is_empty());
  }

  #[tokio::test]
  async fn parallel_dispatch_collects_every_error_in_order() {
    let log = Log::default();
    let notify = |name: &'static str, fail: bool, log: &Log| {
      let log = Arc::clone(log);
      Plugin::new(name).build_end(HookOrder::Normal, move |_ctx, args: HookBuildEndArgs| {
        let log = Arc::clone(&log);
        async move {
          log.lock().unwrap().push(format!("{name}:{}", args.error.unwrap_or_default()));
          if fail {
            anyhow::bail!("{name} failed");
          }
          Ok(())
        }
      })
    };
    let driver = create_driver(vec![
      notify("a", true, &log),
      notify("b", false, &log),
      notify("c", true, &log),
    ]);

    let args = HookBuildEndArgs { error: Some("oops".to_string()) };
    let errors = driver.build_end(&BuildGeneration::default(), args).await.unwrap_err();
    let plugins = errors.bundle_errors().filter_map(BundleError::plugin_name).collect::<Vec<_>>();
    assert_eq!(plugins, vec!["a", "c"]);
    assert_eq!(*log.lock().unwrap(), vec!["a:oops", "b:oops", "c:oops"]);
  }

  #[tokio::test]
  async fn context_resolve_falls_back_to_default_resolution() {
    let driver = create_driver(vec![Plugin::new("noop")]);
    let ctx = driver.context(PluginIdx::new(0), &BuildGeneration::default(), None);

    let resolved = ctx.resolve("./dep.js", Some("/src/main.js"), None).await.unwrap();
    assert_eq!(resolved.id.as_str(), "/src/dep.js");
    assert!(!resolved.external);

    let external = ctx.resolve("lodash", Some("/src/main.js"), None).await.unwrap();
    assert!(external.external);

    let options =
      PluginContextResolveOptions { kind: ImportKind::DynamicImport, ..Default::default() };
    assert!(ctx.resolve("./missing.js", Some("/src/main.js"), Some(options)).await.is_err());
  }

  #[tokio::test]
  async fn files_emitted_by_module_hooks_belong_to_the_module() {
    let emit = |ctx: &PluginContext, source: &str| {
      let name = Some("copy.txt".to_string());
      let asset = EmittedAsset { name, file_name: None, source: source.into() };
      ctx.emit_file(EmittedFile::Asset(asset))
    };
    let plugin = Plugin::new("emit")
      .build_start(HookOrder::Normal, move |ctx, ()| {
        emit(&ctx, "start");
        async { Ok(()) }
      })
      .transform(HookOrder::Normal, move |ctx, args| {
        emit(&ctx, &args.code);
        async { Ok(None) }
      });
    let driver = create_driver(vec![plugin]);
    let generation = BuildGeneration::default();
    let id = ArcStr::from("/src/main.js");

    driver.build_start(&generation).await.unwrap();
    driver.transform(&generation, &id, source("main")).await.unwrap();
    assert_eq!(driver.file_emitter().emitted_assets().len(), 2);

    // The next build runs `buildStart` again, `main.js` stays cached.
    driver.file_emitter().start_build();
    let assets = driver.file_emitter().emitted_assets();
    assert_eq!(assets.len(), 1);
    assert_eq!(assets[0].1.source.as_bytes(), b"main");

    driver.file_emitter().forget_module(&id);
    assert!(driver.file_emitter().emitted_assets().is_empty());
  }
}
