mod hook_registry;
mod plugin;
mod plugin_context;
mod plugin_driver;
mod types;
mod utils;

pub use crate::{
  hook_registry::{HookRegistration, HookRegistry},
  plugin::Plugin,
  plugin_context::{PluginContext, PluginContextResolveOptions},
  plugin_driver::{PluginDriver, SharedPluginDriver, TransformedSource},
  types::{
    hook_args::{
      HookBuildEndArgs, HookGenerateBundleArgs, HookLoadArgs, HookLoadOutput, HookRenderChunkArgs,
      HookRenderChunkOutput, HookRenderErrorArgs, HookResolveIdArgs, HookResolveIdOutput,
      HookTransformArgs, HookTransformOutput, HookWriteBundleArgs,
    },
    hook_callback::{
      BuildEndHook, BuildStartHook, CloseBundleHook, GenerateBundleHook, HookCallback, HookResult,
      LoadHook, ModuleParsedHook, RenderChunkHook, RenderErrorHook, RenderStartHook,
      ResolveIdHook, TransformHook, WriteBundleHook,
    },
    hook_filter::{HookFilter, StringFilter},
    hook_kind::HookKind,
    hook_order::{HookOptions, HookOrder},
    plugin_idx::PluginIdx,
  },
  utils::resolve_id_with_plugins::resolve_id_with_plugins,
};
