pub mod instantiated_chunk;

use std::sync::Arc;

use minipack_common::{AssetIdx, SyntaxTransformer};
use oxc_index::IndexVec;

use self::instantiated_chunk::InstantiatedChunk;

pub type SharedTransformer = Arc<dyn SyntaxTransformer>;
pub type IndexInstantiatedChunks = IndexVec<AssetIdx, InstantiatedChunk>;
