use thiserror::Error;

/// Errors that abort a build generation.
#[derive(Debug, Error)]
pub enum BundleError {
  #[error("Could not resolve {specifier:?}{}: {reason}", .importer.as_ref().map(|importer| format!(" from {importer:?}")).unwrap_or_default())]
  Resolve { specifier: String, importer: Option<String>, reason: String },

  #[error("Could not load {id:?}: {reason}")]
  Load { id: String, reason: String },

  #[error("Failed to parse {id:?}: {message}")]
  Syntax { id: String, message: String },

  #[error("[plugin {plugin}] hook `{hook}` failed{}: {cause:#}", .module.as_ref().map(|module| format!(" on {module:?}")).unwrap_or_default())]
  Hook { plugin: String, hook: &'static str, module: Option<String>, cause: anyhow::Error },

  #[error("Invalid configuration: {0}")]
  Configuration(String),

  #[error("Entry module {0:?} cannot be external")]
  UnresolvedEntry(String),
}

impl BundleError {
  /// The module this error is about, if any.
  pub fn module_id(&self) -> Option<&str> {
    match self {
      Self::Resolve { importer, .. } => importer.as_deref(),
      Self::Load { id, .. } | Self::Syntax { id, .. } => Some(id),
      Self::Hook { module, .. } => module.as_deref(),
      Self::Configuration(_) | Self::UnresolvedEntry(_) => None,
    }
  }

  pub fn plugin_name(&self) -> Option<&str> {
    match self {
      Self::Hook { plugin, .. } => Some(plugin),
      _ => None,
    }
  }
}

/// Reported when the generation a piece of work belongs to was superseded before it committed.
#[derive(Debug, Error)]
#[error("Build generation {generation} was superseded")]
pub struct BuildCancelled {
  pub generation: u64,
}

/// Non-fatal diagnostics collected alongside a successful build.
#[derive(Debug, Error)]
pub enum BuildWarning {
  #[error("Circular dependency: {}.", .0.join(" -> "))]
  CircularDependency(Vec<String>),

  #[error("Manual chunk group {0:?} did not match any module")]
  UnusedManualChunkGroup(String),

  #[error("Dynamic import {specifier:?} in {importer:?} could not be resolved and is left as-is")]
  UnresolvedDynamicImport { specifier: String, importer: String },

  #[error("Sourcemap of {0:?} is likely to be incorrect: a plugin changed it without a map")]
  SourcemapBroken(String),
}

#[test]
fn test_bundle_error_messages() {
  let err = BundleError::Hook {
    plugin: "failing".into(),
    hook: "transform",
    module: Some("/src/x.js".into()),
    cause: anyhow::anyhow!("boom"),
  };
  assert_eq!(err.to_string(), "[plugin failing] hook `transform` failed on \"/src/x.js\": boom");
  assert_eq!(err.module_id(), Some("/src/x.js"));
  assert_eq!(err.plugin_name(), Some("failing"));

  let err =
    BundleError::Resolve { specifier: "./b".into(), importer: None, reason: "not found".into() };
  assert_eq!(err.to_string(), "Could not resolve \"./b\": not found");

  let warning =
    BuildWarning::CircularDependency(vec!["a.js".into(), "b.js".into(), "a.js".into()]);
  assert_eq!(warning.to_string(), "Circular dependency: a.js -> b.js -> a.js.");
}
