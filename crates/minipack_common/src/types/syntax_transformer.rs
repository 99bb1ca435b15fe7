use minipack_error::BundleError;
use minipack_sourcemap::SourceMap;
use oxc_index::IndexVec;

use crate::{ImportRecordIdx, ModuleType, RawImportRecord, SideEffects};

pub struct TransformerArgs<'a> {
  pub id: &'a str,
  pub code: &'a str,
  pub module_type: &'a ModuleType,
  pub sourcemap: bool,
}

pub struct TransformerOutput {
  pub code: String,
  /// Maps `code` back to the code the transformer received.
  pub map: Option<SourceMap>,
  pub import_records: IndexVec<ImportRecordIdx, RawImportRecord>,
  pub side_effects: SideEffects,
}

/// The language layer. Parses a module after the transform hooks ran, reports its imports and
/// classifies its side effects. Rejections are reported as [`BundleError::Syntax`].
pub trait SyntaxTransformer: Send + Sync + 'static {
  fn transform(&self, args: TransformerArgs<'_>) -> Result<TransformerOutput, BundleError>;
}
