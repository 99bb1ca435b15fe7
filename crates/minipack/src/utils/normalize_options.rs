use std::path::Path;

use minipack_common::{
  AdvancedChunksOptions, BundlerOptions, ManualChunkGroup, NormalizedBundlerOptions,
};
use minipack_error::BundleError;
use minipack_utils::pattern_filter::FilterPattern;
use rustc_hash::FxHashSet;

pub fn normalize_options(
  raw_options: BundlerOptions,
) -> Result<NormalizedBundlerOptions, BundleError> {
  let manual_chunks = raw_options.manual_chunks.unwrap_or_default();
  validate_manual_chunks(&manual_chunks)?;

  let advanced_chunks = raw_options.advanced_chunks.unwrap_or_default();
  validate_advanced_chunks(&advanced_chunks)?;

  let cwd = match raw_options.cwd {
    Some(cwd) => cwd,
    None => std::env::current_dir().map_err(|err| {
      BundleError::Configuration(format!("Failed to get the current directory: {err}"))
    })?,
  };

  let dir = raw_options.file.as_ref().map_or_else(
    || raw_options.dir.unwrap_or_else(|| "dist".to_string()),
    |file| {
      Path::new(file.as_str())
        .parent()
        .map(|parent| parent.to_string_lossy().to_string())
        .unwrap_or_default()
    },
  );

  Ok(NormalizedBundlerOptions {
    input: raw_options.input.unwrap_or_default(),
    cwd,
    platform: raw_options.platform.unwrap_or_default(),
    external: raw_options.external.unwrap_or_default(),
    optional_dynamic_imports: raw_options.optional_dynamic_imports.unwrap_or(false),
    dir,
    file: raw_options.file,
    entry_filenames: raw_options.entry_filenames.unwrap_or_else(|| "[name].js".to_string()),
    chunk_filenames: raw_options
      .chunk_filenames
      .unwrap_or_else(|| "[name]-[hash].js".to_string()),
    asset_filenames: raw_options
      .asset_filenames
      .unwrap_or_else(|| "assets/[name]-[hash][extname]".to_string()),
    sourcemap: raw_options.sourcemap.unwrap_or(false),
    manual_chunks,
    advanced_chunks,
  })
}

fn validate_manual_chunks(groups: &[ManualChunkGroup]) -> Result<(), BundleError> {
  let mut seen = FxHashSet::default();
  for group in groups {
    if group.name.trim().is_empty() {
      return Err(BundleError::Configuration(
        "Every manual chunk group needs a non-empty name".to_string(),
      ));
    }
    if !seen.insert(group.name.as_str()) {
      return Err(BundleError::Configuration(format!(
        "Manual chunk group {:?} is declared more than once",
        group.name
      )));
    }
    if matches!(&group.test, FilterPattern::Glob(glob) if glob.is_empty()) {
      return Err(BundleError::Configuration(format!(
        "Manual chunk group {:?} has an empty `test` pattern",
        group.name
      )));
    }
  }
  Ok(())
}

fn validate_advanced_chunks(options: &AdvancedChunksOptions) -> Result<(), BundleError> {
  let check = |min: Option<usize>, max: Option<usize>, what: &str| match (min, max) {
    (Some(min), Some(max)) if min > max => Err(BundleError::Configuration(format!(
      "advancedChunks.min{what} ({min}) is greater than advancedChunks.max{what} ({max})"
    ))),
    _ => Ok(()),
  };
  check(options.min_size, options.max_size, "Size")?;
  check(options.min_module_count, options.max_module_count, "ModuleCount")?;
  if options.max_module_count == Some(0) {
    return Err(BundleError::Configuration(
      "advancedChunks.maxModuleCount must be at least 1".to_string(),
    ));
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use minipack_common::{AdvancedChunksOptions, BundlerOptions, ManualChunkGroup};
  use minipack_error::BundleError;
  use minipack_utils::pattern_filter::FilterPattern;

  use super::normalize_options;

  fn options() -> BundlerOptions {
    BundlerOptions { cwd: Some("/app".into()), ..Default::default() }
  }

  #[test]
  fn fills_in_defaults() {
    let options = normalize_options(options()).unwrap();
    assert_eq!(options.dir, "dist");
    assert_eq!(options.entry_filenames, "[name].js");
    assert_eq!(options.chunk_filenames, "[name]-[hash].js");
    assert_eq!(options.asset_filenames, "assets/[name]-[hash][extname]");
    assert!(!options.sourcemap);
    assert!(!options.optional_dynamic_imports);
    assert!(options.advanced_chunks.is_empty());
  }

  #[test]
  fn file_decides_the_output_directory() {
    let options = normalize_options(BundlerOptions {
      file: Some("build/bundle.js".to_string()),
      dir: Some("ignored".to_string()),
      ..options()
    })
    .unwrap();
    assert_eq!(options.dir, "build");
    assert_eq!(options.out_dir(), std::path::Path::new("/app/build"));
  }

  #[test]
  fn rejects_duplicate_manual_groups() {
    let err = normalize_options(BundlerOptions {
      manual_chunks: Some(vec![
        ManualChunkGroup::new("vendor", FilterPattern::glob("**/node_modules/**")),
        ManualChunkGroup::new("vendor", FilterPattern::glob("**/lib/**")),
      ]),
      ..options()
    })
    .unwrap_err();
    assert!(matches!(err, BundleError::Configuration(message) if message.contains("\"vendor\"")));

    let err = normalize_options(BundlerOptions {
      manual_chunks: Some(vec![ManualChunkGroup::new(" ", FilterPattern::glob("**"))]),
      ..options()
    })
    .unwrap_err();
    assert!(matches!(err, BundleError::Configuration(_)));
  }

  #[test]
  fn rejects_inverted_thresholds() {
    let err = normalize_options(BundlerOptions {
      advanced_chunks: Some(AdvancedChunksOptions {
        min_size: Some(100),
        max_size: Some(10),
        ..Default::default()
      }),
      ..options()
    })
    .unwrap_err();
    assert_eq!(
      err.to_string(),
      "Invalid configuration: advancedChunks.minSize (100) is greater than advancedChunks.maxSize (10)"
    );
  }
}
