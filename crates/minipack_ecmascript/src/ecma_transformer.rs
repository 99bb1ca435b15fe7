use std::borrow::Cow;

use minipack_common::{
  ModuleType, SideEffects, SyntaxTransformer, TransformerArgs, TransformerOutput,
};
use minipack_error::BundleError;
use minipack_sourcemap::line_sourcemap;

use crate::EcmaCompiler;

/// Default language layer. Modules are parsed as ES modules and passed through without
/// rewriting. JSON and text modules are wrapped into a default export first.
#[derive(Debug, Default)]
pub struct EcmaTransformer;

impl EcmaTransformer {
  fn prepare_source<'a>(
    id: &str,
    code: &'a str,
    module_type: &ModuleType,
  ) -> Result<Cow<'a, str>, BundleError> {
    Ok(match module_type {
      ModuleType::Json => {
        serde_json::from_str::<serde_json::Value>(code)
          .map_err(|err| BundleError::Syntax { id: id.to_string(), message: err.to_string() })?;
        Cow::Owned(format!("export default {};\n", code.trim_end()))
      }
      ModuleType::Text => Cow::Owned(format!(
        "export default {};\n",
        serde_json::Value::String(code.to_string())
      )),
      ModuleType::Empty => Cow::Borrowed(""),
      _ => Cow::Borrowed(code),
    })
  }
}

impl SyntaxTransformer for EcmaTransformer {
  fn transform(&self, args: TransformerArgs<'_>) -> Result<TransformerOutput, BundleError> {
    let TransformerArgs { id, code, module_type, sourcemap } = args;

    if let ModuleType::Custom(ty) = module_type {
      return Err(BundleError::Syntax {
        id: id.to_string(),
        message: format!("Unsupported module type \"{ty}\"."),
      });
    }

    let source = Self::prepare_source(id, code, module_type)?;
    let scanned = EcmaCompiler::scan(&source, EcmaCompiler::source_type_for(module_type))
      .map_err(|messages| BundleError::Syntax {
        id: id.to_string(),
        message: messages.join("\n"),
      })?;

    let side_effects = match module_type {
      ModuleType::Json | ModuleType::Text | ModuleType::Empty => SideEffects::False,
      _ => scanned.side_effects,
    };
    let map = sourcemap.then(|| line_sourcemap(id, code));

    Ok(TransformerOutput {
      code: source.into_owned(),
      map,
      import_records: scanned.import_records,
      side_effects,
    })
  }
}

#[cfg(test)]
mod tests {
  use minipack_common::{ModuleType, SideEffects, SyntaxTransformer, TransformerArgs};
  use minipack_error::BundleError;

  use super::EcmaTransformer;

  fn args<'a>(code: &'a str, module_type: &'a ModuleType) -> TransformerArgs<'a> {
    TransformerArgs { id: "/src/mod", code, module_type, sourcemap: true }
  }

  #[test]
  fn wraps_json_and_text() {
    let out = EcmaTransformer.transform(args("{\"a\": 1}", &ModuleType::Json)).unwrap();
    assert_eq!(out.code, "export default {\"a\": 1};\n");
    assert_eq!(out.side_effects, SideEffects::False);

    let out = EcmaTransformer.transform(args("hello \"world\"", &ModuleType::Text)).unwrap();
    assert_eq!(out.code, "export default \"hello \\\"world\\\"\";\n");
    assert!(out.map.is_some());
  }

  #[test]
  fn rejects_invalid_code() {
    let Err(err) = EcmaTransformer.transform(args("export const = ;", &ModuleType::Js)) else {
      panic!("expected a syntax error");
    };
    assert!(matches!(err, BundleError::Syntax { ref id, .. } if id == "/src/mod"));

    assert!(EcmaTransformer.transform(args("{", &ModuleType::Json)).is_err());
    assert!(EcmaTransformer.transform(args("", &ModuleType::Custom("css".into()))).is_err());
  }
}
