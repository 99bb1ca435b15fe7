use std::path::PathBuf;

use clap::Args;

use crate::types::platform::Platform;

#[derive(Args)]
pub struct InputArgs {
  /// JSON file with the bundler options. Flags given on the command line take precedence.
  #[clap(long, short = 'c')]
  pub config: Option<PathBuf>,

  #[clap(long)]
  pub cwd: Option<PathBuf>,

  #[clap(long, action = clap::ArgAction::Append)]
  pub input: Option<Vec<PathBuf>>,

  #[clap(long, short)]
  pub platform: Option<Platform>,

  /// Glob of module ids to leave to the runtime.
  #[clap(long, short = 'e', action = clap::ArgAction::Append)]
  pub external: Option<Vec<String>>,
}

#[derive(Args)]
pub struct OutputArgs {
  #[clap(long, short = 'd')]
  pub dir: Option<String>,

  #[clap(long, short = 'o')]
  pub file: Option<String>,

  #[clap(long)]
  pub entry_filenames: Option<String>,

  #[clap(long)]
  pub chunk_filenames: Option<String>,

  #[clap(long)]
  pub asset_filenames: Option<String>,

  #[clap(long, short = 's')]
  pub sourcemap: bool,
}

#[derive(Args)]
pub struct WatchArgs {
  /// Rebuild when a bundled file changes.
  #[clap(long, short = 'w')]
  pub watch: bool,

  /// Only report errors.
  #[clap(long)]
  pub silent: bool,
}
