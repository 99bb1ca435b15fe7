use std::sync::Arc;

use minipack_common::{BuildGeneration, BundlerOptions, FileEmitter};
use minipack_ecmascript::EcmaTransformer;
use minipack_error::BuildResult;
use minipack_fs::{OsFileSystem, SharedFileSystem};
use minipack_plugin::{Plugin, PluginDriver};
use minipack_resolver::{Resolver, SharedResolver};

use crate::{Bundler, types::SharedTransformer, utils::normalize_options::normalize_options};

/// Assembles a [`Bundler`] from options, plugins and collaborators. Collaborators that are not
/// given fall back to the real file system and the oxc based transformer.
#[derive(Default)]
pub struct BundlerBuilder {
  options: BundlerOptions,
  plugins: Vec<Plugin>,
  fs: Option<SharedFileSystem>,
  transformer: Option<SharedTransformer>,
}

impl BundlerBuilder {
  #[must_use]
  pub fn with_options(mut self, options: BundlerOptions) -> Self {
    self.options = options;
    self
  }

  #[must_use]
  pub fn with_plugins(mut self, plugins: Vec<Plugin>) -> Self {
    self.plugins = plugins;
    self
  }

  #[must_use]
  pub fn with_file_system(mut self, fs: SharedFileSystem) -> Self {
    self.fs = Some(fs);
    self
  }

  #[must_use]
  pub fn with_transformer(mut self, transformer: SharedTransformer) -> Self {
    self.transformer = Some(transformer);
    self
  }

  pub fn build(self) -> BuildResult<Bundler> {
    let options = Arc::new(normalize_options(self.options)?);
    let fs = self.fs.unwrap_or_else(|| Arc::new(OsFileSystem));
    let transformer = self.transformer.unwrap_or_else(|| Arc::new(EcmaTransformer));

    let resolver: SharedResolver =
      Resolver::new(options.platform, options.cwd.clone(), Arc::clone(&fs)).into();
    let file_emitter = Arc::new(FileEmitter::default());
    let plugin_driver =
      PluginDriver::new(self.plugins, resolver, Arc::clone(&options), file_emitter)?;

    Ok(Bundler {
      closed: false,
      fs,
      options,
      plugin_driver,
      transformer,
      generation: BuildGeneration::default(),
      cache: None,
      reached_files: vec![],
    })
  }
}
