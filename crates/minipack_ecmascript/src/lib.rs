mod ecma_compiler;
mod ecma_transformer;
mod import_scanner;
mod side_effect_detector;

pub use crate::{
  ecma_compiler::EcmaCompiler, ecma_transformer::EcmaTransformer, import_scanner::ImportScanner,
  side_effect_detector::SideEffectDetector,
};
