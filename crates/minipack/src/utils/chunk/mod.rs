pub mod finalize_chunks;
pub mod generate_rendered_chunk;
pub mod validate_options_for_multi_chunk_output;
