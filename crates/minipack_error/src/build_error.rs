use std::ops::{Deref, DerefMut};

use crate::{BuildCancelled, BundleError};

#[derive(Debug)]
pub struct BuildError(pub Vec<anyhow::Error>);

impl BuildError {
  /// A build is cancelled when every collected error says so. Cancellation is not a failure, the
  /// caller is expected to start over with a newer build generation.
  pub fn is_cancelled(&self) -> bool {
    !self.0.is_empty() && self.0.iter().all(|err| err.is::<BuildCancelled>())
  }

  pub fn bundle_errors(&self) -> impl Iterator<Item = &BundleError> {
    self.0.iter().filter_map(|err| err.downcast_ref::<BundleError>())
  }

  /// Drop cancellation markers if a real failure was collected as well.
  pub fn without_cancellations(mut self) -> Self {
    if !self.is_cancelled() {
      self.0.retain(|err| !err.is::<BuildCancelled>());
    }
    self
  }
}

impl Deref for BuildError {
  type Target = Vec<anyhow::Error>;

  fn deref(&self) -> &Self::Target {
    &self.0
  }
}

impl DerefMut for BuildError {
  fn deref_mut(&mut self) -> &mut Self::Target {
    &mut self.0
  }
}

impl From<anyhow::Error> for BuildError {
  fn from(error: anyhow::Error) -> Self {
    Self(vec![error])
  }
}

impl From<Vec<anyhow::Error>> for BuildError {
  fn from(errors: Vec<anyhow::Error>) -> Self {
    Self(errors)
  }
}

impl From<BundleError> for BuildError {
  fn from(error: BundleError) -> Self {
    Self(vec![error.into()])
  }
}

impl From<BuildCancelled> for BuildError {
  fn from(error: BuildCancelled) -> Self {
    Self(vec![error.into()])
  }
}

impl std::fmt::Display for BuildError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    for (idx, err) in self.0.iter().enumerate() {
      if idx > 0 {
        writeln!(f)?;
      }
      write!(f, "{err:#}")?;
    }
    Ok(())
  }
}

pub type BuildResult<T> = anyhow::Result<T, BuildError>;

#[test]
fn test_cancelled_build_error() {
  let cancelled = BuildError::from(BuildCancelled { generation: 3 });
  assert!(cancelled.is_cancelled());

  let mut mixed = BuildError::from(BuildCancelled { generation: 3 });
  mixed.push(BundleError::Load { id: "/a.js".into(), reason: "missing".into() }.into());
  assert!(!mixed.is_cancelled());
  let mixed = mixed.without_cancellations();
  assert_eq!(mixed.len(), 1);
  assert_eq!(mixed.bundle_errors().count(), 1);
}
