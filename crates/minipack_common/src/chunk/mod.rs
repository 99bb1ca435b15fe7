mod preliminary_filename;

use std::borrow::Cow;

use arcstr::ArcStr;
use minipack_utils::{bitset::BitSet, hash_placeholder::HashPlaceholderGenerator};

use crate::{ChunkIdx, ChunkKind, FilenameTemplate, ModuleIdx, NormalizedBundlerOptions};

pub use self::preliminary_filename::PreliminaryFilename;

#[derive(Debug, Default, Clone)]
pub struct Chunk {
  pub exec_order: u32,
  pub kind: ChunkKind,
  /// In execution order.
  pub modules: Vec<ModuleIdx>,
  pub name: Option<ArcStr>,
  /// Literal file name fixed by the user, bypassing the naming templates.
  pub file_name: Option<ArcStr>,
  /// Reference id of the `emit_file` call that created this chunk.
  pub reference_id: Option<ArcStr>,
  pub preliminary_filename: Option<PreliminaryFilename>,
  /// Chunks this chunk imports statically, ordered by chunk index.
  pub cross_chunk_imports: Vec<ChunkIdx>,
  pub cross_chunk_dynamic_imports: Vec<ChunkIdx>,
  /// Entry points whose static import graph reaches every module of this chunk.
  pub bits: BitSet,
}

impl Chunk {
  pub fn new(name: Option<ArcStr>, bits: BitSet, modules: Vec<ModuleIdx>, kind: ChunkKind) -> Self {
    Self { exec_order: u32::MAX, modules, name, bits, kind, ..Self::default() }
  }

  pub fn is_entry(&self) -> bool {
    matches!(self.kind, ChunkKind::EntryPoint { is_user_defined: true, .. })
  }

  pub fn is_dynamic_entry(&self) -> bool {
    matches!(self.kind, ChunkKind::EntryPoint { is_user_defined: false, .. })
  }

  pub fn entry_module_idx(&self) -> Option<ModuleIdx> {
    match &self.kind {
      ChunkKind::EntryPoint { module, .. } => Some(*module),
      ChunkKind::Common | ChunkKind::Manual { .. } => None,
    }
  }

  pub fn filename_template(&self, options: &NormalizedBundlerOptions) -> FilenameTemplate {
    let template = if self.is_entry() {
      options.entry_filenames.clone()
    } else {
      options.chunk_filenames.clone()
    };

    FilenameTemplate::new(template)
  }

  /// File name with hash placeholders. The placeholders are replaced once every chunk has been
  /// rendered and content hashes are known.
  pub fn generate_preliminary_filename(
    &self,
    options: &NormalizedBundlerOptions,
    chunk_name: &ArcStr,
    hash_placeholder_generator: &mut HashPlaceholderGenerator,
    make_unique_name: &mut impl FnMut(&ArcStr) -> ArcStr,
  ) -> PreliminaryFilename {
    if let Some(file_name) = &self.file_name {
      return PreliminaryFilename::new(file_name.to_string(), None);
    }
    if let (Some(file), true) = (&options.file, self.is_entry()) {
      let file_name = std::path::Path::new(file)
        .file_name()
        .map_or_else(|| file.clone(), |name| name.to_string_lossy().into_owned());
      return PreliminaryFilename::new(file_name, None);
    }

    let filename_template = self.filename_template(options);
    let has_hash_pattern = filename_template.has_hash_pattern();

    // With a hash pattern the hash tells same-named chunks apart.
    let name = if has_hash_pattern {
      make_unique_name(chunk_name);
      Cow::Borrowed(chunk_name)
    } else {
      Cow::Owned(make_unique_name(chunk_name))
    };

    let mut hash_placeholder = has_hash_pattern.then_some(vec![]);
    let hash_replacer = has_hash_pattern.then_some({
      |len: Option<usize>| {
        let hash = hash_placeholder_generator.generate(len.unwrap_or(8));
        if let Some(hash_placeholder) = hash_placeholder.as_mut() {
          hash_placeholder.push(hash.clone());
        }
        hash
      }
    });

    let filename = filename_template.render(Some(&name), Some(".js"), hash_replacer);

    PreliminaryFilename::new(filename, hash_placeholder)
  }
}
