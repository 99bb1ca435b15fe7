use std::fmt::Debug;

use arcstr::ArcStr;
use oxc::span::Span;

use crate::{ImportKind, ModuleIdx, ModuleType};

/// Edge found by scanning the module. Resolution has not happened yet.
pub type RawImportRecord = ImportRecord<()>;
/// `None` marks an optional dynamic import that could not be resolved.
pub type ResolvedImportRecord = ImportRecord<Option<ModuleIdx>>;

bitflags::bitflags! {
  #[derive(Debug, Clone, Copy, PartialEq, Eq)]
  pub struct ImportRecordMeta: u8 {
    /// `import '...'` or `import {} from '...'`: no binding of the target is used.
    const IS_PLAIN_IMPORT = 1;
    /// `export * from '...'` or `export { a } from '...'`
    const IS_REEXPORT = 1 << 1;
  }
}

#[derive(Debug, Clone)]
pub struct ImportRecord<State: Debug> {
  pub state: State,
  /// `./lib.js` in `import { foo } from './lib.js';`
  pub specifier: ArcStr,
  pub kind: ImportKind,
  /// Set by `with { type: "..." }`.
  pub asserted_module_type: Option<ModuleType>,
  /// Span of the specifier string literal, quotes included.
  pub specifier_span: Span,
  /// Span of the whole statement for static imports, of the `import(...)` call for dynamic ones.
  pub statement_span: Span,
  pub meta: ImportRecordMeta,
}

impl<State: Debug> ImportRecord<State> {
  pub fn is_plain_import(&self) -> bool {
    self.meta.contains(ImportRecordMeta::IS_PLAIN_IMPORT)
  }
}

impl RawImportRecord {
  pub fn new(
    specifier: impl Into<ArcStr>,
    kind: ImportKind,
    specifier_span: Span,
    statement_span: Span,
  ) -> Self {
    Self {
      state: (),
      specifier: specifier.into(),
      kind,
      asserted_module_type: None,
      specifier_span,
      statement_span,
      meta: ImportRecordMeta::empty(),
    }
  }

  #[must_use]
  pub fn with_meta(mut self, meta: ImportRecordMeta) -> Self {
    self.meta = meta;
    self
  }

  #[must_use]
  pub fn with_asserted_module_type(mut self, module_type: Option<ModuleType>) -> Self {
    self.asserted_module_type = module_type;
    self
  }

  pub fn into_resolved(self, resolved_module: Option<ModuleIdx>) -> ResolvedImportRecord {
    ResolvedImportRecord {
      state: resolved_module,
      specifier: self.specifier,
      kind: self.kind,
      asserted_module_type: self.asserted_module_type,
      specifier_span: self.specifier_span,
      statement_span: self.statement_span,
      meta: self.meta,
    }
  }
}

impl ResolvedImportRecord {
  pub fn resolved_module(&self) -> Option<ModuleIdx> {
    self.state
  }
}
