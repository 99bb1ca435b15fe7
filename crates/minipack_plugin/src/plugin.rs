use std::{future::Future, sync::Arc};

use arcstr::ArcStr;
use minipack_common::ModuleInfo;

use crate::{
  HookBuildEndArgs, HookCallback, HookGenerateBundleArgs, HookLoadArgs, HookLoadOutput,
  HookOptions, HookRenderChunkArgs, HookRenderChunkOutput, HookRenderErrorArgs, HookResolveIdArgs,
  HookResolveIdOutput, HookResult, HookTransformArgs, HookTransformOutput, HookWriteBundleArgs,
  PluginContext, types::hook_callback::boxed_hook,
};

/// A named set of hook registrations.
///
/// ```ignore
/// let plugin = Plugin::new("virtual")
///   .resolve_id(HookOrder::Pre, |_ctx, args| async move {
///     Ok((args.specifier == "virtual:env").then(|| HookResolveIdOutput {
///       id: "\0virtual:env".to_string(),
///       external: None,
///     }))
///   });
/// ```
#[derive(Debug, Clone)]
pub struct Plugin {
  pub(crate) name: ArcStr,
  pub(crate) hooks: Vec<(HookOptions, HookCallback)>,
}

impl Plugin {
  pub fn new(name: impl Into<ArcStr>) -> Self {
    Self { name: name.into(), hooks: vec![] }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  /// Registrations are validated when the plugin is added to a [`crate::HookRegistry`].
  #[must_use]
  pub fn hook(mut self, options: impl Into<HookOptions>, callback: HookCallback) -> Self {
    self.hooks.push((options.into(), callback));
    self
  }

  #[must_use]
  pub fn resolve_id<F, Fut>(self, options: impl Into<HookOptions>, f: F) -> Self
  where
    F: Fn(PluginContext, HookResolveIdArgs) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HookResult<Option<HookResolveIdOutput>>> + Send + 'static,
  {
    self.hook(options, HookCallback::ResolveId(boxed_hook(f)))
  }

  #[must_use]
  pub fn load<F, Fut>(self, options: impl Into<HookOptions>, f: F) -> Self
  where
    F: Fn(PluginContext, HookLoadArgs) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HookResult<Option<HookLoadOutput>>> + Send + 'static,
  {
    self.hook(options, HookCallback::Load(boxed_hook(f)))
  }

  #[must_use]
  pub fn transform<F, Fut>(self, options: impl Into<HookOptions>, f: F) -> Self
  where
    F: Fn(PluginContext, HookTransformArgs) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HookResult<Option<HookTransformOutput>>> + Send + 'static,
  {
    self.hook(options, HookCallback::Transform(boxed_hook(f)))
  }

  #[must_use]
  pub fn module_parsed<F, Fut>(self, options: impl Into<HookOptions>, f: F) -> Self
  where
    F: Fn(PluginContext, Arc<ModuleInfo>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HookResult<()>> + Send + 'static,
  {
    self.hook(options, HookCallback::ModuleParsed(boxed_hook(f)))
  }

  #[must_use]
  pub fn render_chunk<F, Fut>(self, options: impl Into<HookOptions>, f: F) -> Self
  where
    F: Fn(PluginContext, HookRenderChunkArgs) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HookResult<Option<HookRenderChunkOutput>>> + Send + 'static,
  {
    self.hook(options, HookCallback::RenderChunk(boxed_hook(f)))
  }

  #[must_use]
  pub fn build_start<F, Fut>(self, options: impl Into<HookOptions>, f: F) -> Self
  where
    F: Fn(PluginContext, ()) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HookResult<()>> + Send + 'static,
  {
    self.hook(options, HookCallback::BuildStart(boxed_hook(f)))
  }

  #[must_use]
  pub fn build_end<F, Fut>(self, options: impl Into<HookOptions>, f: F) -> Self
  where
    F: Fn(PluginContext, HookBuildEndArgs) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HookResult<()>> + Send + 'static,
  {
    self.hook(options, HookCallback::BuildEnd(boxed_hook(f)))
  }

  #[must_use]
  pub fn render_start<F, Fut>(self, options: impl Into<HookOptions>, f: F) -> Self
  where
    F: Fn(PluginContext, ()) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HookResult<()>> + Send + 'static,
  {
    self.hook(options, HookCallback::RenderStart(boxed_hook(f)))
  }

  /// Called when generating the outputs fails after the module graph was built.
  #[must_use]
  pub fn render_error<F, Fut>(self, options: impl Into<HookOptions>, f: F) -> Self
  where
    F: Fn(PluginContext, HookRenderErrorArgs) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HookResult<()>> + Send + 'static,
  {
    self.hook(options, HookCallback::RenderError(boxed_hook(f)))
  }

  #[must_use]
  pub fn generate_bundle<F, Fut>(self, options: impl Into<HookOptions>, f: F) -> Self
  where
    F: Fn(PluginContext, HookGenerateBundleArgs) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HookResult<()>> + Send + 'static,
  {
    self.hook(options, HookCallback::GenerateBundle(boxed_hook(f)))
  }

  #[must_use]
  pub fn write_bundle<F, Fut>(self, options: impl Into<HookOptions>, f: F) -> Self
  where
    F: Fn(PluginContext, HookWriteBundleArgs) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HookResult<()>> + Send + 'static,
  {
    self.hook(options, HookCallback::WriteBundle(boxed_hook(f)))
  }

  #[must_use]
  pub fn close_bundle<F, Fut>(self, options: impl Into<HookOptions>, f: F) -> Self
  where
    F: Fn(PluginContext, ()) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HookResult<()>> + Send + 'static,
  {
    self.hook(options, HookCallback::CloseBundle(boxed_hook(f)))
  }
}
