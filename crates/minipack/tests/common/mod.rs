#![allow(dead_code)]

use std::sync::Arc;

use minipack::{
  Bundler, BundlerOptions, InputItem, MemoryFileSystem, OutputChunk, Plugin, SharedFileSystem,
};

pub const CWD: &str = "/app";

pub fn memory_fs(files: &[(&str, &str)]) -> Arc<MemoryFileSystem> {
  Arc::new(MemoryFileSystem::new(
    files.iter().map(|(path, content)| (format!("{CWD}/{path}"), *content)),
  ))
}

pub fn options(input: &[&str]) -> BundlerOptions {
  BundlerOptions {
    input: Some(input.iter().map(|item| InputItem::from(*item)).collect()),
    cwd: Some(CWD.into()),
    chunk_filenames: Some("[name].js".to_string()),
    ..Default::default()
  }
}

pub fn bundler(
  fs: &Arc<MemoryFileSystem>,
  options: BundlerOptions,
  plugins: Vec<Plugin>,
) -> Bundler {
  let fs: SharedFileSystem = Arc::clone(fs) as SharedFileSystem;
  Bundler::builder()
    .with_options(options)
    .with_plugins(plugins)
    .with_file_system(fs)
    .build()
    .expect("valid options")
}

pub fn chunk_by_name<'a>(
  chunks: impl IntoIterator<Item = &'a OutputChunk>,
  name: &str,
) -> &'a OutputChunk {
  chunks
    .into_iter()
    .find(|chunk| chunk.name == name)
    .unwrap_or_else(|| panic!("no chunk named {name:?}"))
}

/// Stable ids of the modules in `code`, in the order they are rendered.
pub fn regions(code: &str) -> Vec<&str> {
  code.lines().filter_map(|line| line.strip_prefix("//#region ")).collect()
}

pub fn module_ids(chunk: &OutputChunk) -> Vec<String> {
  chunk
    .module_ids
    .iter()
    .map(|id| id.inner().trim_start_matches(CWD).trim_start_matches('/').to_string())
    .collect()
}
