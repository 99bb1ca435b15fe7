mod build_error;
mod diagnostics;

pub use crate::build_error::{BuildError, BuildResult};
pub use crate::diagnostics::{BuildCancelled, BuildWarning, BundleError};
