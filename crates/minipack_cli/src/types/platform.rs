use clap::ValueEnum;

/// Target environment of the bundle, decides how bare specifiers resolve.
#[derive(Debug, Clone, Copy, ValueEnum)]
#[clap(rename_all = "lower")]
pub enum Platform {
  Browser,
  Node,
  Neutral,
}

impl From<Platform> for minipack::Platform {
  fn from(platform: Platform) -> Self {
    match platform {
      Platform::Browser => Self::Browser,
      Platform::Node => Self::Node,
      Platform::Neutral => Self::Neutral,
    }
  }
}
