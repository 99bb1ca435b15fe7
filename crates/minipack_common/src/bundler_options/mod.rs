pub mod advanced_chunks;
pub mod filename_template;
pub mod input_item;
pub mod module_type;
pub mod normalized_bundler_options;
pub mod platform;

use std::path::PathBuf;

use minipack_utils::pattern_filter::FilterPattern;
use serde::Deserialize;

use crate::{AdvancedChunksOptions, InputItem, ManualChunkGroup, Platform};

/// User facing options. Every field is optional and gets its default while normalizing.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BundlerOptions {
  // --- Input
  pub input: Option<Vec<InputItem>>,
  pub cwd: Option<PathBuf>,
  pub platform: Option<Platform>,
  pub external: Option<Vec<FilterPattern>>,
  pub optional_dynamic_imports: Option<bool>,

  // --- Output
  pub dir: Option<String>,
  pub file: Option<String>,
  pub entry_filenames: Option<String>,
  pub chunk_filenames: Option<String>,
  pub asset_filenames: Option<String>,
  pub sourcemap: Option<bool>,

  // --- Chunking
  pub manual_chunks: Option<Vec<ManualChunkGroup>>,
  pub advanced_chunks: Option<AdvancedChunksOptions>,
}

#[test]
fn test_deserialize_bundler_options() {
  let options: BundlerOptions = serde_json::from_str(
    r#"{
      "input": ["./src/main.js", { "name": "admin", "import": "./src/admin.js" }],
      "external": ["react", { "regex": "^node:" }],
      "manualChunks": [{ "name": "vendor", "test": "**/node_modules/**" }],
      "advancedChunks": { "maxModuleCount": 10 },
      "sourcemap": true
    }"#,
  )
  .unwrap();

  let input = options.input.unwrap();
  assert_eq!(input[0].name, None);
  assert_eq!(input[1].name.as_deref(), Some("admin"));
  assert_eq!(options.external.unwrap().len(), 2);
  assert_eq!(options.manual_chunks.unwrap()[0].name, "vendor");
  assert_eq!(options.advanced_chunks.unwrap().max_module_count, Some(10));
  assert_eq!(options.sourcemap, Some(true));
}
