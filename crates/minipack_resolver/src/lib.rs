// Path-like specifiers are looked up through the bundler's `FileSystem`; bare specifiers go
// through `oxc_resolver` and its package.json / exports handling.

pub mod error;
mod resolver;

pub use crate::{error::ResolveError, resolver::Resolver};

pub type SharedResolver = std::sync::Arc<Resolver>;
