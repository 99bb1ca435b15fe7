use minipack_common::SideEffects;
use oxc::ast::ast::{
  ArrayExpressionElement, Class, ClassElement, Declaration, ExportDefaultDeclarationKind,
  Expression, ObjectPropertyKind, Program, Statement, UnaryOperator, VariableDeclaration,
};

/// Conservative top-level analysis. A module is free of side effects only when every top-level
/// statement is a declaration whose evaluation cannot be observed.
pub struct SideEffectDetector;

impl SideEffectDetector {
  pub fn detect_program(program: &Program) -> SideEffects {
    SideEffects::from(program.body.iter().any(Self::detect_stmt))
  }

  fn detect_stmt(stmt: &Statement) -> bool {
    match stmt {
      Statement::ImportDeclaration(_)
      | Statement::ExportAllDeclaration(_)
      | Statement::EmptyStatement(_)
      | Statement::FunctionDeclaration(_)
      | Statement::TSTypeAliasDeclaration(_)
      | Statement::TSInterfaceDeclaration(_) => false,
      Statement::ClassDeclaration(class) => Self::detect_class(class),
      Statement::VariableDeclaration(decl) => Self::detect_var_decl(decl),
      Statement::ExportNamedDeclaration(decl) => {
        decl.declaration.as_ref().is_some_and(Self::detect_decl)
      }
      Statement::ExportDefaultDeclaration(decl) => match &decl.declaration {
        ExportDefaultDeclarationKind::FunctionDeclaration(_)
        | ExportDefaultDeclarationKind::TSInterfaceDeclaration(_) => false,
        ExportDefaultDeclarationKind::ClassDeclaration(class) => Self::detect_class(class),
        kind => kind.as_expression().is_none_or(Self::detect_expr),
      },
      _ => true,
    }
  }

  fn detect_decl(decl: &Declaration) -> bool {
    match decl {
      Declaration::VariableDeclaration(decl) => Self::detect_var_decl(decl),
      Declaration::ClassDeclaration(class) => Self::detect_class(class),
      Declaration::FunctionDeclaration(_)
      | Declaration::TSTypeAliasDeclaration(_)
      | Declaration::TSInterfaceDeclaration(_) => false,
      _ => true,
    }
  }

  fn detect_var_decl(decl: &VariableDeclaration) -> bool {
    decl.declarations.iter().any(|declarator| {
      // Destructuring may run getters or iterators.
      !declarator.id.kind.is_binding_identifier()
        || declarator.init.as_ref().is_some_and(Self::detect_expr)
    })
  }

  fn detect_class(class: &Class) -> bool {
    class.super_class.is_some()
      || class.body.body.iter().any(|element| match element {
        ClassElement::MethodDefinition(method) => method.computed,
        ClassElement::PropertyDefinition(prop) => {
          prop.computed || (prop.r#static && prop.value.as_ref().is_some_and(Self::detect_expr))
        }
        ClassElement::TSIndexSignature(_) => false,
        _ => true,
      })
  }

  fn detect_expr(expr: &Expression) -> bool {
    match expr {
      Expression::BooleanLiteral(_)
      | Expression::NullLiteral(_)
      | Expression::NumericLiteral(_)
      | Expression::BigIntLiteral(_)
      | Expression::StringLiteral(_)
      | Expression::RegExpLiteral(_)
      | Expression::Identifier(_)
      | Expression::FunctionExpression(_)
      | Expression::ArrowFunctionExpression(_) => false,
      Expression::TemplateLiteral(literal) => !literal.expressions.is_empty(),
      Expression::ClassExpression(class) => Self::detect_class(class),
      Expression::ParenthesizedExpression(paren) => Self::detect_expr(&paren.expression),
      Expression::UnaryExpression(unary) => {
        unary.operator == UnaryOperator::Delete || Self::detect_expr(&unary.argument)
      }
      Expression::ArrayExpression(array) => array.elements.iter().any(|element| match element {
        ArrayExpressionElement::Elision(_) => false,
        ArrayExpressionElement::SpreadElement(_) => true,
        element => element.as_expression().is_none_or(Self::detect_expr),
      }),
      Expression::ObjectExpression(object) => {
        object.properties.iter().any(|property| match property {
          ObjectPropertyKind::ObjectProperty(prop) => {
            prop.computed || Self::detect_expr(&prop.value)
          }
          ObjectPropertyKind::SpreadProperty(_) => true,
        })
      }
      _ => true,
    }
  }
}

#[cfg(test)]
mod tests {
  use minipack_common::SideEffects;
  use oxc::{allocator::Allocator, parser::Parser, span::SourceType};

  use super::SideEffectDetector;

  fn detect(source: &str) -> SideEffects {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, SourceType::mjs()).parse();
    assert!(ret.errors.is_empty());
    SideEffectDetector::detect_program(&ret.program)
  }

  #[test]
  fn declarations_are_pure() {
    assert_eq!(
      detect("export const a = 1;\nexport function b() {}\nlet c = { d: [1, 'x'] };"),
      SideEffects::False
    );
    assert_eq!(detect("import './polyfill.js';\nexport class E { m() {} }"), SideEffects::False);
    assert_eq!(detect("export default () => 1;"), SideEffects::False);
  }

  #[test]
  fn statements_and_calls_are_impure() {
    assert_eq!(detect("console.log(1);"), SideEffects::True);
    assert_eq!(detect("export const a = init();"), SideEffects::True);
    assert_eq!(detect("const { a } = obj;"), SideEffects::True);
    assert_eq!(detect("class A extends B {}"), SideEffects::True);
    assert_eq!(detect("export default `${x}`;"), SideEffects::True);
  }
}
