mod bundler;
mod bundler_builder;
mod chunk_graph;
mod module_graph;
mod module_loader;
mod stages;
mod types;
mod utils;
mod watch;

pub use crate::{
  bundler::Bundler,
  bundler_builder::BundlerBuilder,
  chunk_graph::ChunkGraph,
  module_graph::{ModuleEdge, ModuleGraph},
  types::SharedTransformer,
  watch::{Watcher, WatcherChange, WatcherChangeKind, WatcherEvent, WatcherOptions, WatcherState},
};
pub use minipack_common::*;
pub use minipack_error::{BuildCancelled, BuildError, BuildResult, BuildWarning, BundleError};
pub use minipack_fs::{FileSystem, MemoryFileSystem, OsFileSystem, SharedFileSystem};
pub use minipack_plugin::{
  HookBuildEndArgs, HookFilter, HookGenerateBundleArgs, HookKind, HookLoadArgs, HookLoadOutput,
  HookOptions, HookOrder, HookRenderChunkArgs, HookRenderChunkOutput, HookRenderErrorArgs,
  HookResolveIdArgs, HookResolveIdOutput, HookResult, HookTransformArgs, HookTransformOutput,
  HookWriteBundleArgs, Plugin, PluginContext, PluginContextResolveOptions, StringFilter,
};
pub use minipack_sourcemap::SourceMap;
pub use minipack_utils::pattern_filter::FilterPattern;
