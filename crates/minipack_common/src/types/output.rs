use arcstr::ArcStr;
use minipack_sourcemap::SourceMap;

use crate::{ModuleId, StrOrBytes};

#[derive(Debug, Clone)]
pub struct OutputChunk {
  pub name: ArcStr,
  pub filename: ArcStr,
  pub code: String,
  pub map: Option<SourceMap>,
  pub sourcemap_filename: Option<String>,
  pub is_entry: bool,
  pub is_dynamic_entry: bool,
  pub facade_module_id: Option<ModuleId>,
  /// In execution order.
  pub module_ids: Vec<ModuleId>,
  pub imports: Vec<ArcStr>,
  pub dynamic_imports: Vec<ArcStr>,
  pub preliminary_filename: String,
}

#[derive(Debug, Clone)]
pub struct OutputAsset {
  pub filename: ArcStr,
  pub source: StrOrBytes,
  pub names: Vec<String>,
}

#[derive(Debug, Clone)]
pub enum Output {
  Chunk(Box<OutputChunk>),
  Asset(Box<OutputAsset>),
}

impl Output {
  pub fn filename(&self) -> &str {
    match self {
      Self::Chunk(chunk) => &chunk.filename,
      Self::Asset(asset) => &asset.filename,
    }
  }

  pub fn content_as_bytes(&self) -> &[u8] {
    match self {
      Self::Chunk(chunk) => chunk.code.as_bytes(),
      Self::Asset(asset) => asset.source.as_bytes(),
    }
  }

  pub fn as_chunk(&self) -> Option<&OutputChunk> {
    match self {
      Self::Chunk(chunk) => Some(chunk),
      Self::Asset(_) => None,
    }
  }
}

#[derive(Debug, Default)]
pub struct BundleOutput {
  /// Chunks in chunk order, then assets ordered by file name.
  pub assets: Vec<Output>,
  pub warnings: Vec<anyhow::Error>,
  /// Every file the build depended on: module ids plus files added by `add_watch_file`.
  pub watch_files: Vec<ArcStr>,
}

impl BundleOutput {
  pub fn chunks(&self) -> impl Iterator<Item = &OutputChunk> {
    self.assets.iter().filter_map(Output::as_chunk)
  }

  pub fn get(&self, filename: &str) -> Option<&Output> {
    self.assets.iter().find(|output| output.filename() == filename)
  }
}
