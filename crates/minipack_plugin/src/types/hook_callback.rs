use std::{future::Future, sync::Arc};

use futures::future::BoxFuture;
use minipack_common::ModuleInfo;

use crate::{
  HookBuildEndArgs, HookGenerateBundleArgs, HookKind, HookLoadArgs, HookLoadOutput,
  HookRenderChunkArgs, HookRenderChunkOutput, HookRenderErrorArgs, HookResolveIdArgs,
  HookResolveIdOutput, HookTransformArgs, HookTransformOutput, HookWriteBundleArgs, PluginContext,
};

pub type HookResult<T> = anyhow::Result<T>;

type HookFn<Args, Ret> =
  dyn Fn(PluginContext, Args) -> BoxFuture<'static, HookResult<Ret>> + Send + Sync;

pub type ResolveIdHook = Arc<HookFn<HookResolveIdArgs, Option<HookResolveIdOutput>>>;
pub type LoadHook = Arc<HookFn<HookLoadArgs, Option<HookLoadOutput>>>;
pub type TransformHook = Arc<HookFn<HookTransformArgs, Option<HookTransformOutput>>>;
pub type ModuleParsedHook = Arc<HookFn<Arc<ModuleInfo>, ()>>;
pub type RenderChunkHook = Arc<HookFn<HookRenderChunkArgs, Option<HookRenderChunkOutput>>>;
pub type BuildStartHook = Arc<HookFn<(), ()>>;
pub type BuildEndHook = Arc<HookFn<HookBuildEndArgs, ()>>;
pub type RenderStartHook = Arc<HookFn<(), ()>>;
pub type RenderErrorHook = Arc<HookFn<HookRenderErrorArgs, ()>>;
pub type GenerateBundleHook = Arc<HookFn<HookGenerateBundleArgs, ()>>;
pub type WriteBundleHook = Arc<HookFn<HookWriteBundleArgs, ()>>;
pub type CloseBundleHook = Arc<HookFn<(), ()>>;

/// A callback tagged with the hook kind it implements.
#[derive(Clone)]
pub enum HookCallback {
  ResolveId(ResolveIdHook),
  Load(LoadHook),
  Transform(TransformHook),
  ModuleParsed(ModuleParsedHook),
  RenderChunk(RenderChunkHook),
  BuildStart(BuildStartHook),
  BuildEnd(BuildEndHook),
  RenderStart(RenderStartHook),
  RenderError(RenderErrorHook),
  GenerateBundle(GenerateBundleHook),
  WriteBundle(WriteBundleHook),
  CloseBundle(CloseBundleHook),
}

impl HookCallback {
  pub fn kind(&self) -> HookKind {
    match self {
      Self::ResolveId(_) => HookKind::ResolveId,
      Self::Load(_) => HookKind::Load,
      Self::Transform(_) => HookKind::Transform,
      Self::ModuleParsed(_) => HookKind::ModuleParsed,
      Self::RenderChunk(_) => HookKind::RenderChunk,
      Self::BuildStart(_) => HookKind::BuildStart,
      Self::BuildEnd(_) => HookKind::BuildEnd,
      Self::RenderStart(_) => HookKind::RenderStart,
      Self::RenderError(_) => HookKind::RenderError,
      Self::GenerateBundle(_) => HookKind::GenerateBundle,
      Self::WriteBundle(_) => HookKind::WriteBundle,
      Self::CloseBundle(_) => HookKind::CloseBundle,
    }
  }
}

impl std::fmt::Debug for HookCallback {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "HookCallback({})", self.kind())
  }
}

pub(crate) fn boxed_hook<Args, Ret, F, Fut>(f: F) -> Arc<HookFn<Args, Ret>>
where
  Args: Send + 'static,
  Ret: Send + 'static,
  F: Fn(PluginContext, Args) -> Fut + Send + Sync + 'static,
  Fut: Future<Output = HookResult<Ret>> + Send + 'static,
{
  Arc::new(move |ctx: PluginContext, args: Args| -> BoxFuture<'static, HookResult<Ret>> {
    Box::pin(f(ctx, args))
  })
}
