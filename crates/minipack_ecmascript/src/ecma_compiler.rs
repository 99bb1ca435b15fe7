use minipack_common::{ImportRecordIdx, ModuleType, RawImportRecord, SideEffects};
use oxc::{allocator::Allocator, ast_visit::Visit, parser::Parser, span::SourceType};
use oxc_index::IndexVec;

use crate::{ImportScanner, SideEffectDetector};

pub struct ScanReturn {
  pub import_records: IndexVec<ImportRecordIdx, RawImportRecord>,
  pub side_effects: SideEffects,
}

pub struct EcmaCompiler;

impl EcmaCompiler {
  pub fn source_type_for(module_type: &ModuleType) -> SourceType {
    match module_type {
      ModuleType::Ts => SourceType::ts(),
      ModuleType::Tsx => SourceType::tsx(),
      ModuleType::Jsx => SourceType::jsx(),
      _ => SourceType::mjs(),
    }
  }

  /// Parses `source` and collects its import records. Parse errors are returned as messages.
  pub fn scan(source: &str, source_type: SourceType) -> Result<ScanReturn, Vec<String>> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, source_type).parse();
    if ret.panicked || !ret.errors.is_empty() {
      return Err(ret.errors.iter().map(ToString::to_string).collect());
    }

    let mut scanner = ImportScanner::default();
    scanner.visit_program(&ret.program);
    let side_effects = SideEffectDetector::detect_program(&ret.program);

    Ok(ScanReturn { import_records: scanner.into_records(), side_effects })
  }
}

#[test]
fn test_scan() {
  let ret = EcmaCompiler::scan(
    "import a from './a.js';\nexport * from './b.js';\nconst c = () => import('./c.js');\n",
    SourceType::mjs(),
  )
  .unwrap_or_else(|errors| panic!("{errors:?}"));

  let specifiers = ret.import_records.iter().map(|rec| rec.specifier.as_str()).collect::<Vec<_>>();
  assert_eq!(specifiers, vec!["./a.js", "./b.js", "./c.js"]);
  assert_eq!(ret.side_effects, SideEffects::False);

  assert!(EcmaCompiler::scan("import from;", SourceType::mjs()).is_err());
}
