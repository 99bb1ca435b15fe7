use std::sync::Arc;

use arcstr::ArcStr;
use futures::future::BoxFuture;
use minipack_common::{BuildGeneration, RenderedChunk};
use minipack_error::BuildResult;

use crate::{
  HookCallback, HookGenerateBundleArgs, HookKind, HookRenderChunkArgs, HookRenderErrorArgs,
  HookResult, HookWriteBundleArgs, PluginDriver,
};

impl PluginDriver {
  #[tracing::instrument(level = "debug", skip_all)]
  pub async fn render_start(&self, generation: &BuildGeneration) -> BuildResult<()> {
    self
      .dispatch_parallel(HookKind::RenderStart, generation, None, |registration, ctx| {
        let HookCallback::RenderStart(hook) = &registration.callback else { return None };
        Some(hook(ctx, ()))
      })
      .await
  }

  #[tracing::instrument(level = "debug", skip_all)]
  pub async fn render_error(
    &self,
    generation: &BuildGeneration,
    args: HookRenderErrorArgs,
  ) -> BuildResult<()> {
    self
      .dispatch_parallel(HookKind::RenderError, generation, None, |registration, ctx| {
        let HookCallback::RenderError(hook) = &registration.callback else { return None };
        Some(hook(ctx, args.clone()))
      })
      .await
  }

  pub async fn render_chunk(
    &self,
    generation: &BuildGeneration,
    code: ArcStr,
    chunk: &Arc<RenderedChunk>,
  ) -> anyhow::Result<ArcStr> {
    self
      .dispatch_sequential(
        HookKind::RenderChunk,
        generation,
        Some(chunk.filename.as_str()),
        code,
        |registration, ctx, prev| {
          let HookCallback::RenderChunk(hook) = &registration.callback else { return None };
          if !registration.accepts(None, Some(prev.as_str())) {
            return None;
          }
          let call =
            hook(ctx, HookRenderChunkArgs { code: prev.clone(), chunk: Arc::clone(chunk) });
          let rendered: BoxFuture<'static, HookResult<Option<ArcStr>>> =
            Box::pin(async move { Ok(call.await?.map(|output| ArcStr::from(output.code))) });
          Some(rendered)
        },
      )
      .await
  }

  #[tracing::instrument(level = "debug", skip_all)]
  pub async fn write_bundle(
    &self,
    generation: &BuildGeneration,
    args: HookWriteBundleArgs,
  ) -> BuildResult<()> {
    self
      .dispatch_parallel(HookKind::WriteBundle, generation, None, |registration, ctx| {
        let HookCallback::WriteBundle(hook) = &registration.callback else { return None };
        Some(hook(ctx, args.clone()))
      })
      .await
  }

  #[tracing::instrument(level = "debug", skip_all)]
  pub async fn generate_bundle(
    &self,
    generation: &BuildGeneration,
    args: HookGenerateBundleArgs,
  ) -> BuildResult<()> {
    self
      .dispatch_parallel(HookKind::GenerateBundle, generation, None, |registration, ctx| {
        let HookCallback::GenerateBundle(hook) = &registration.callback else { return None };
        Some(hook(ctx, args.clone()))
      })
      .await
  }

  #[tracing::instrument(level = "debug", skip_all)]
  pub async fn close_bundle(&self, generation: &BuildGeneration) -> BuildResult<()> {
    self
      .dispatch_parallel(HookKind::CloseBundle, generation, None, |registration, ctx| {
        let HookCallback::CloseBundle(hook) = &registration.callback else { return None };
        Some(hook(ctx, ()))
      })
      .await
  }
}
