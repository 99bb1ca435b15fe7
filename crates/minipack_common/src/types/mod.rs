pub mod build_generation;
pub mod chunk_kind;
pub mod emitted_file;
pub mod entry_point;
pub mod import_kind;
pub mod import_record;
pub mod module_id;
pub mod module_info;
pub mod module_state;
pub mod output;
pub mod raw_idx;
pub mod rendered_chunk;
pub mod resolved_id;
pub mod side_effects;
pub mod str_or_bytes;
pub mod syntax_transformer;
