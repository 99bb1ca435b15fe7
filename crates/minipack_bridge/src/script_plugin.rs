use arcstr::ArcStr;
use minipack_plugin::{
  HookFilter, HookKind, HookLoadOutput, HookOptions, HookOrder, HookRenderChunkOutput,
  HookResolveIdOutput, HookTransformOutput, Plugin, PluginContext,
};
use serde::{Deserialize, Serialize, de::DeserializeOwned, de::IgnoredAny};

use crate::{Bridge, InvokeScope};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptHookDescriptor {
  pub kind: HookKind,
  #[serde(default)]
  pub order: HookOrder,
  #[serde(default)]
  pub filter: Option<HookFilter>,
}

/// Describes a plugin living in the script runtime: the id the hosts know it by and the hooks it
/// implements.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptPluginDescriptor {
  pub id: String,
  pub name: String,
  pub hooks: Vec<ScriptHookDescriptor>,
}

async fn invoke_typed<Args: Serialize, Ret: DeserializeOwned>(
  bridge: &Bridge,
  plugin_id: &str,
  hook: HookKind,
  args: &Args,
  module: Option<&str>,
  ctx: &PluginContext,
) -> anyhow::Result<Ret> {
  let args = serde_json::to_value(args)?;
  let scope = InvokeScope { module, generation: ctx.generation() };
  let value = bridge.invoke(plugin_id, hook, args, scope).await?;
  serde_json::from_value(value).map_err(|err| {
    anyhow::anyhow!("Invalid `{hook}` result from script plugin {plugin_id:?}: {err}")
  })
}

impl Bridge {
  /// A plugin whose hooks are served by the script workers of this bridge.
  pub fn plugin(&self, descriptor: ScriptPluginDescriptor) -> Plugin {
    let ScriptPluginDescriptor { id, name, hooks } = descriptor;
    let plugin_id = ArcStr::from(id);

    hooks.into_iter().fold(Plugin::new(name), |plugin, hook| {
      let options = HookOptions { order: hook.order, filter: hook.filter };
      let bridge = self.clone();
      let plugin_id = plugin_id.clone();

      match hook.kind {
        HookKind::ResolveId => plugin.resolve_id(options, move |ctx, args| {
          let (bridge, plugin_id) = (bridge.clone(), plugin_id.clone());
          async move {
            let module = args.importer.as_deref();
            invoke_typed::<_, Option<HookResolveIdOutput>>(
              &bridge,
              &plugin_id,
              HookKind::ResolveId,
              &args,
              module,
              &ctx,
            )
            .await
          }
        }),
        HookKind::Load => plugin.load(options, move |ctx, args| {
          let (bridge, plugin_id) = (bridge.clone(), plugin_id.clone());
          async move {
            invoke_typed::<_, Option<HookLoadOutput>>(
              &bridge,
              &plugin_id,
              HookKind::Load,
              &args,
              Some(args.id.as_str()),
              &ctx,
            )
            .await
          }
        }),
        HookKind::Transform => plugin.transform(options, move |ctx, args| {
          let (bridge, plugin_id) = (bridge.clone(), plugin_id.clone());
          async move {
            invoke_typed::<_, Option<HookTransformOutput>>(
              &bridge,
              &plugin_id,
              HookKind::Transform,
              &args,
              Some(args.id.as_str()),
              &ctx,
            )
            .await
          }
        }),
        HookKind::ModuleParsed => plugin.module_parsed(options, move |ctx, info| {
          let (bridge, plugin_id) = (bridge.clone(), plugin_id.clone());
          async move {
            invoke_typed::<_, IgnoredAny>(
              &bridge,
              &plugin_id,
              HookKind::ModuleParsed,
              info.as_ref(),
              Some(&*info.id),
              &ctx,
            )
            .await
            .map(|_| ())
          }
        }),
        HookKind::RenderChunk => plugin.render_chunk(options, move |ctx, args| {
          let (bridge, plugin_id) = (bridge.clone(), plugin_id.clone());
          async move {
            invoke_typed::<_, Option<HookRenderChunkOutput>>(
              &bridge,
              &plugin_id,
              HookKind::RenderChunk,
              &args,
              None,
              &ctx,
            )
            .await
          }
        }),
        HookKind::BuildStart => plugin.build_start(options, move |ctx, ()| {
          let (bridge, plugin_id) = (bridge.clone(), plugin_id.clone());
          async move {
            invoke_typed::<_, IgnoredAny>(
              &bridge,
              &plugin_id,
              HookKind::BuildStart,
              &serde_json::Value::Null,
              None,
              &ctx,
            )
            .await
            .map(|_| ())
          }
        }),
        HookKind::BuildEnd => plugin.build_end(options, move |ctx, args| {
          let (bridge, plugin_id) = (bridge.clone(), plugin_id.clone());
          async move {
            invoke_typed::<_, IgnoredAny>(
              &bridge,
              &plugin_id,
              HookKind::BuildEnd,
              &args,
              None,
              &ctx,
            )
            .await
            .map(|_| ())
          }
        }),
        HookKind::RenderStart => plugin.render_start(options, move |ctx, ()| {
          let (bridge, plugin_id) = (bridge.clone(), plugin_id.clone());
          async move {
            invoke_typed::<_, IgnoredAny>(
              &bridge,
              &plugin_id,
              HookKind::RenderStart,
              &serde_json::Value::Null,
              None,
              &ctx,
            )
            .await
            .map(|_| ())
          }
        }),
        HookKind::RenderError => plugin.render_error(options, move |ctx, args| {
          let (bridge, plugin_id) = (bridge.clone(), plugin_id.clone());
          async move {
            invoke_typed::<_, IgnoredAny>(
              &bridge,
              &plugin_id,
              HookKind::RenderError,
              &args,
              None,
              &ctx,
            )
            .await
            .map(|_| ())
          }
        }),
        HookKind::GenerateBundle => plugin.generate_bundle(options, move |ctx, args| {
          let (bridge, plugin_id) = (bridge.clone(), plugin_id.clone());
          async move {
            invoke_typed::<_, IgnoredAny>(
              &bridge,
              &plugin_id,
              HookKind::GenerateBundle,
              &args,
              None,
              &ctx,
            )
            .await
            .map(|_| ())
          }
        }),
        HookKind::WriteBundle => plugin.write_bundle(options, move |ctx, args| {
          let (bridge, plugin_id) = (bridge.clone(), plugin_id.clone());
          async move {
            invoke_typed::<_, IgnoredAny>(
              &bridge,
              &plugin_id,
              HookKind::WriteBundle,
              &args,
              None,
              &ctx,
            )
            .await
            .map(|_| ())
          }
        }),
        HookKind::CloseBundle => plugin.close_bundle(options, move |ctx, ()| {
          let (bridge, plugin_id) = (bridge.clone(), plugin_id.clone());
          async move {
            invoke_typed::<_, IgnoredAny>(
              &bridge,
              &plugin_id,
              HookKind::CloseBundle,
              &serde_json::Value::Null,
              None,
              &ctx,
            )
            .await
            .map(|_| ())
          }
        }),
      }
    })
  }
}

#[test]
fn test_deserialize_descriptor() {
  let descriptor: ScriptPluginDescriptor = serde_json::from_str(
    r#"{
      "id": "plugin-0",
      "name": "svelte",
      "hooks": [
        { "kind": "resolveId", "order": "pre" },
        { "kind": "transform", "filter": { "id": { "include": ["**/*.svelte"] } } },
        { "kind": "buildEnd" }
      ]
    }"#,
  )
  .unwrap();

  assert_eq!(descriptor.name, "svelte");
  assert_eq!(descriptor.hooks[0].order, HookOrder::Pre);
  assert_eq!(descriptor.hooks[1].order, HookOrder::Normal);
  let filter = descriptor.hooks[1].filter.as_ref().unwrap();
  assert!(filter.is_match(Some("/src/App.svelte"), None));
  assert!(!filter.is_match(Some("/src/main.js"), None));
  assert_eq!(descriptor.hooks[2].kind, HookKind::BuildEnd);
}
