use std::sync::Arc;

use arcstr::ArcStr;
use futures::future::BoxFuture;
use minipack_common::{BuildGeneration, ModuleInfo, ModuleType, SideEffects};
use minipack_error::BuildResult;
use minipack_sourcemap::SourceMap;

use crate::{
  HookBuildEndArgs, HookCallback, HookKind, HookLoadArgs, HookLoadOutput, HookResolveIdArgs,
  HookResolveIdOutput, HookResult, HookTransformArgs, HookTransformOutput, PluginDriver,
  PluginIdx,
};

/// Source of a module after the transform chain.
#[derive(Debug, Clone)]
pub struct TransformedSource {
  pub code: ArcStr,
  pub module_type: ModuleType,
  /// Set when a plugin declared the side effects of the module.
  pub side_effects: Option<SideEffects>,
  /// Maps of the transforms that changed the code, oldest first. `None` once a transform
  /// changed it without a map.
  pub sourcemap_chain: Option<Vec<Arc<SourceMap>>>,
}

impl TransformedSource {
  pub fn new(code: ArcStr, module_type: ModuleType, side_effects: Option<SideEffects>) -> Self {
    Self { code, module_type, side_effects, sourcemap_chain: Some(vec![]) }
  }

  fn apply(self, output: HookTransformOutput) -> Self {
    let changed = output.code.as_deref().is_some_and(|code| code != self.code.as_str());
    let sourcemap_chain = match (changed, output.map) {
      (false, _) => self.sourcemap_chain,
      (true, Some(map)) => self.sourcemap_chain.map(|mut chain| {
        chain.push(Arc::new(map));
        chain
      }),
      (true, None) => None,
    };
    Self {
      code: output.code.map_or(self.code, ArcStr::from),
      module_type: output.module_type.unwrap_or(self.module_type),
      side_effects: output.side_effects.or(self.side_effects),
      sourcemap_chain,
    }
  }
}

impl PluginDriver {
  #[tracing::instrument(level = "debug", skip_all)]
  pub async fn build_start(&self, generation: &BuildGeneration) -> BuildResult<()> {
    self
      .dispatch_parallel(HookKind::BuildStart, generation, None, |registration, ctx| {
        let HookCallback::BuildStart(hook) = &registration.callback else { return None };
        Some(hook(ctx, ()))
      })
      .await
  }

  #[tracing::instrument(level = "debug", skip_all)]
  pub async fn build_end(
    &self,
    generation: &BuildGeneration,
    args: HookBuildEndArgs,
  ) -> BuildResult<()> {
    self
      .dispatch_parallel(HookKind::BuildEnd, generation, None, |registration, ctx| {
        let HookCallback::BuildEnd(hook) = &registration.callback else { return None };
        Some(hook(ctx, args.clone()))
      })
      .await
  }

  pub async fn resolve_id(
    &self,
    generation: &BuildGeneration,
    args: &HookResolveIdArgs,
    skip: Option<PluginIdx>,
  ) -> anyhow::Result<Option<HookResolveIdOutput>> {
    self
      .dispatch_chain(
        HookKind::ResolveId,
        generation,
        args.importer.as_deref(),
        skip,
        |registration, ctx| {
          let HookCallback::ResolveId(hook) = &registration.callback else { return None };
          registration
            .accepts(Some(args.specifier.as_str()), None)
            .then(|| hook(ctx, args.clone()))
        },
      )
      .await
  }

  pub async fn load(
    &self,
    generation: &BuildGeneration,
    id: &ArcStr,
  ) -> anyhow::Result<Option<HookLoadOutput>> {
    self
      .dispatch_chain(HookKind::Load, generation, Some(id.as_str()), None, |registration, ctx| {
        let HookCallback::Load(hook) = &registration.callback else { return None };
        registration
          .accepts(Some(id.as_str()), None)
          .then(|| hook(ctx, HookLoadArgs { id: id.clone() }))
      })
      .await
  }

  pub async fn transform(
    &self,
    generation: &BuildGeneration,
    id: &ArcStr,
    source: TransformedSource,
  ) -> anyhow::Result<TransformedSource> {
    self
      .dispatch_sequential(
        HookKind::Transform,
        generation,
        Some(id.as_str()),
        source,
        |registration, ctx, prev| {
          let HookCallback::Transform(hook) = &registration.callback else { return None };
          if !registration.accepts(Some(id.as_str()), Some(prev.code.as_str())) {
            return None;
          }
          let call = hook(
            ctx,
            HookTransformArgs {
              id: id.clone(),
              code: prev.code.clone(),
              module_type: prev.module_type.clone(),
            },
          );
          let prev = prev.clone();
          let merged: BoxFuture<'static, HookResult<Option<TransformedSource>>> =
            Box::pin(async move {
              Ok(call.await?.map(|output| prev.apply(output)))
            });
          Some(merged)
        },
      )
      .await
  }

  pub async fn module_parsed(
    &self,
    generation: &BuildGeneration,
    info: &Arc<ModuleInfo>,
  ) -> BuildResult<()> {
    let id: &str = &info.id;
    self
      .dispatch_parallel(HookKind::ModuleParsed, generation, Some(id), |registration, ctx| {
        let HookCallback::ModuleParsed(hook) = &registration.callback else { return None };
        registration.accepts(Some(id), None).then(|| hook(ctx, Arc::clone(info)))
      })
      .await
  }
}
