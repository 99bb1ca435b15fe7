use minipack_common::NormalizedBundlerOptions;
use minipack_error::{BuildResult, BundleError};

pub fn validate_options_for_multi_chunk_output(
  options: &NormalizedBundlerOptions,
) -> BuildResult<()> {
  options.file.as_ref().map_or(Ok(()), |_| {
    Err(BundleError::Configuration(
      "When building multiple chunks, the \"dir\" option must be used, not \"file\".".to_string(),
    ))?
  })
}
