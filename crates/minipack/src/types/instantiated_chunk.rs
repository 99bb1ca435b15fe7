use std::sync::Arc;

use arcstr::ArcStr;
use minipack_common::{ChunkIdx, PreliminaryFilename, RenderedChunk};
use minipack_sourcemap::SourceMap;

/// A rendered chunk whose file name and content may still contain hash placeholders.
#[derive(Debug)]
pub struct InstantiatedChunk {
  pub origin_chunk: ChunkIdx,
  pub content: String,
  pub map: Option<SourceMap>,
  pub preliminary_filename: PreliminaryFilename,
  pub rendered_chunk: Arc<RenderedChunk>,
}

impl InstantiatedChunk {
  pub fn finalize(self, filename: String) -> FinalizedChunk {
    FinalizedChunk {
      origin_chunk: self.origin_chunk,
      filename: filename.into(),
      content: self.content,
      map: self.map,
      preliminary_filename: self.preliminary_filename,
      rendered_chunk: self.rendered_chunk,
    }
  }
}

#[derive(Debug)]
pub struct FinalizedChunk {
  pub origin_chunk: ChunkIdx,
  pub filename: ArcStr,
  pub content: String,
  pub map: Option<SourceMap>,
  pub preliminary_filename: PreliminaryFilename,
  pub rendered_chunk: Arc<RenderedChunk>,
}
