pub mod base64;
pub mod bitset;
pub mod concat_string;
pub mod hash_placeholder;
pub mod indexmap;
pub mod option_ext;
pub mod path_ext;
pub mod pattern_filter;
pub mod rayon;
pub mod sanitize_file_name;
pub mod xxhash;
