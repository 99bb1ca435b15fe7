use minipack_common::{ImportKind, ImportRecordIdx, ImportRecordMeta, ModuleType, RawImportRecord};
use oxc::{
  ast::ast::{
    self, ExportAllDeclaration, ExportNamedDeclaration, ImportAttributeKey, ImportDeclaration,
    ImportExpression, WithClause,
  },
  ast_visit::{Visit, walk},
  span::GetSpan,
};
use oxc_index::IndexVec;

/// Collects static imports, re-exports and dynamic imports with string literal specifiers.
/// Type-only imports and exports are skipped.
#[derive(Default)]
pub struct ImportScanner {
  records: IndexVec<ImportRecordIdx, RawImportRecord>,
}

impl ImportScanner {
  pub fn into_records(self) -> IndexVec<ImportRecordIdx, RawImportRecord> {
    self.records
  }

  fn add_static_record(
    &mut self,
    source: &ast::StringLiteral,
    statement: oxc::span::Span,
    with_clause: Option<&WithClause>,
    meta: ImportRecordMeta,
  ) {
    let record =
      RawImportRecord::new(source.value.as_str(), ImportKind::Import, source.span, statement)
        .with_meta(meta)
        .with_asserted_module_type(with_clause.and_then(asserted_module_type));
    self.records.push(record);
  }
}

fn asserted_module_type(with_clause: &WithClause) -> Option<ModuleType> {
  with_clause.with_entries.iter().find_map(|attribute| {
    let key = match &attribute.key {
      ImportAttributeKey::Identifier(ident) => ident.name.as_str(),
      ImportAttributeKey::StringLiteral(literal) => literal.value.as_str(),
    };
    (key == "type").then(|| ModuleType::from_import_attribute(attribute.value.value.as_str()))
  })
}

impl<'a> Visit<'a> for ImportScanner {
  fn visit_import_declaration(&mut self, decl: &ImportDeclaration<'a>) {
    if decl.import_kind.is_type() {
      return;
    }
    let is_plain = decl.specifiers.as_ref().is_none_or(|specifiers| specifiers.is_empty());
    let meta = if is_plain { ImportRecordMeta::IS_PLAIN_IMPORT } else { ImportRecordMeta::empty() };
    self.add_static_record(&decl.source, decl.span, decl.with_clause.as_deref(), meta);
  }

  fn visit_export_all_declaration(&mut self, decl: &ExportAllDeclaration<'a>) {
    if decl.export_kind.is_type() {
      return;
    }
    self.add_static_record(
      &decl.source,
      decl.span,
      decl.with_clause.as_deref(),
      ImportRecordMeta::IS_REEXPORT,
    );
  }

  fn visit_export_named_declaration(&mut self, decl: &ExportNamedDeclaration<'a>) {
    match &decl.source {
      Some(source) if !decl.export_kind.is_type() => {
        self.add_static_record(
          source,
          decl.span,
          decl.with_clause.as_deref(),
          ImportRecordMeta::IS_REEXPORT,
        );
      }
      Some(_) => {}
      None => walk::walk_export_named_declaration(self, decl),
    }
  }

  fn visit_import_expression(&mut self, expr: &ImportExpression<'a>) {
    if let ast::Expression::StringLiteral(request) = &expr.source {
      self.records.push(RawImportRecord::new(
        request.value.as_str(),
        ImportKind::DynamicImport,
        expr.source.span(),
        expr.span,
      ));
    }
    walk::walk_import_expression(self, expr);
  }
}

#[cfg(test)]
mod tests {
  use minipack_common::{ImportKind, ImportRecordMeta, ModuleType};
  use oxc::{allocator::Allocator, ast_visit::Visit, parser::Parser, span::SourceType};

  use super::ImportScanner;

  fn scan(source: &str, source_type: SourceType) -> Vec<minipack_common::RawImportRecord> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, source_type).parse();
    assert!(ret.errors.is_empty());
    let mut scanner = ImportScanner::default();
    scanner.visit_program(&ret.program);
    scanner.into_records().raw
  }

  fn slice(source: &str, span: oxc::span::Span) -> &str {
    &source[span.start as usize..span.end as usize]
  }

  #[test]
  fn collects_spans_and_kinds() {
    let source = "import './side-effect.js';\nimport { a } from './a.js';\n\
                  function f() { return import('./lazy.js'); }\n";
    let records = scan(source, SourceType::mjs());
    assert_eq!(records.len(), 3);

    assert!(records[0].meta.contains(ImportRecordMeta::IS_PLAIN_IMPORT));
    assert_eq!(slice(source, records[0].statement_span), "import './side-effect.js';");
    assert!(!records[1].meta.contains(ImportRecordMeta::IS_PLAIN_IMPORT));
    assert_eq!(slice(source, records[1].specifier_span), "'./a.js'");

    assert_eq!(records[2].kind, ImportKind::DynamicImport);
    assert_eq!(slice(source, records[2].statement_span), "import('./lazy.js')");
  }

  #[test]
  fn reads_import_attributes_and_skips_types() {
    let source = "import data from './data.json' with { type: 'json' };\n\
                  import type { T } from './types';\n\
                  export type { U } from './types';\n\
                  export { b } from './b';\n";
    let records = scan(source, SourceType::ts());
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].asserted_module_type, Some(ModuleType::Json));
    assert_eq!(records[1].specifier.as_str(), "./b");
    assert!(records[1].meta.contains(ImportRecordMeta::IS_REEXPORT));
  }
}
