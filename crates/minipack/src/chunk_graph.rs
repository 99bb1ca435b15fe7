use minipack_common::{Chunk, ChunkIdx, ModuleIdx};
use oxc_index::{IndexVec, index_vec};
use rustc_hash::FxHashMap;

#[derive(Debug, Default)]
pub struct ChunkGraph {
  pub chunk_table: IndexVec<ChunkIdx, Chunk>,
  /// Entry chunks first, then manual and common chunks.
  pub sorted_chunk_idx_vec: Vec<ChunkIdx>,
  pub module_to_chunk: IndexVec<ModuleIdx, Option<ChunkIdx>>,
  pub entry_module_to_entry_chunk: FxHashMap<ModuleIdx, ChunkIdx>,
}

impl ChunkGraph {
  pub fn new(module_slots: usize) -> Self {
    Self { module_to_chunk: index_vec![None; module_slots], ..Self::default() }
  }

  pub fn add_chunk(&mut self, chunk: Chunk) -> ChunkIdx {
    let idx = self.chunk_table.push(chunk);
    self.sorted_chunk_idx_vec.push(idx);
    idx
  }

  pub fn add_module_to_chunk(&mut self, module_idx: ModuleIdx, chunk_idx: ChunkIdx) {
    self.chunk_table[chunk_idx].modules.push(module_idx);
    self.module_to_chunk[module_idx] = Some(chunk_idx);
  }

  /// The chunk a dynamic import of `module_idx` loads.
  pub fn entry_chunk_of(&self, module_idx: ModuleIdx) -> Option<ChunkIdx> {
    self.entry_module_to_entry_chunk.get(&module_idx).copied()
  }
}
