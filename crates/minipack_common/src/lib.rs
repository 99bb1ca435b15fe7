mod bundler_options;
mod chunk;
mod module;
mod module_loader;
mod types;

pub use crate::{
  bundler_options::{
    BundlerOptions,
    advanced_chunks::{AdvancedChunksOptions, ManualChunkGroup},
    filename_template::FilenameTemplate,
    input_item::InputItem,
    module_type::ModuleType,
    normalized_bundler_options::NormalizedBundlerOptions,
    platform::Platform,
  },
  chunk::{Chunk, PreliminaryFilename},
  module::{Module, external_module::ExternalModule, normal_module::NormalModule},
  module_loader::{ModuleLoaderMsg, NormalModuleTaskResult},
  types::{
    build_generation::BuildGeneration,
    chunk_kind::ChunkKind,
    emitted_file::{EmittedAsset, EmittedChunk, EmittedFile, FileEmitter},
    entry_point::{EntryPoint, EntryPointKind},
    import_kind::ImportKind,
    import_record::{ImportRecord, ImportRecordMeta, RawImportRecord, ResolvedImportRecord},
    module_id::ModuleId,
    module_info::ModuleInfo,
    module_state::ModuleState,
    output::{BundleOutput, Output, OutputAsset, OutputChunk},
    raw_idx::{AssetIdx, ChunkIdx, ImportRecordIdx, ModuleIdx},
    rendered_chunk::RenderedChunk,
    resolved_id::ResolvedId,
    side_effects::SideEffects,
    str_or_bytes::StrOrBytes,
    syntax_transformer::{SyntaxTransformer, TransformerArgs, TransformerOutput},
  },
};

pub type SharedOptions = std::sync::Arc<NormalizedBundlerOptions>;
pub type SharedFileEmitter = std::sync::Arc<FileEmitter>;
