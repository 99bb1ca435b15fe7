use std::path::PathBuf;

use minipack_utils::pattern_filter::FilterPattern;

use crate::{AdvancedChunksOptions, InputItem, ManualChunkGroup, Platform};

#[derive(Debug)]
pub struct NormalizedBundlerOptions {
  // --- Input
  pub input: Vec<InputItem>,
  pub cwd: PathBuf,
  pub platform: Platform,
  pub external: Vec<FilterPattern>,
  pub optional_dynamic_imports: bool,

  // --- Output
  pub dir: String,
  pub file: Option<String>,
  pub entry_filenames: String,
  pub chunk_filenames: String,
  pub asset_filenames: String,
  pub sourcemap: bool,

  // --- Chunking
  pub manual_chunks: Vec<ManualChunkGroup>,
  pub advanced_chunks: AdvancedChunksOptions,
}

impl NormalizedBundlerOptions {
  pub fn is_external(&self, id: &str) -> bool {
    self.external.iter().any(|pattern| pattern.matches(id))
  }

  /// Absolute directory output files are written to.
  pub fn out_dir(&self) -> PathBuf {
    match &self.file {
      Some(file) => {
        self.cwd.join(file).parent().map_or_else(|| self.cwd.clone(), std::path::Path::to_path_buf)
      }
      None => self.cwd.join(&self.dir),
    }
  }
}
