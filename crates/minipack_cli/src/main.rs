mod args;
mod types;

use std::{process::ExitCode, sync::Arc, time::Instant};

use ansi_term::Colour;
use anyhow::Context;
use args::{InputArgs, OutputArgs, WatchArgs};
use clap::Parser;
use tokio::sync::{Mutex, broadcast::error::RecvError};
use tracing_subscriber::EnvFilter;

use minipack::{
  BuildError, Bundler, BundlerOptions, FilterPattern, Output, Watcher, WatcherEvent,
  WatcherOptions,
};

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Commands {
  #[clap(flatten)]
  input: InputArgs,

  #[clap(flatten)]
  output: OutputArgs,

  #[clap(flatten)]
  watch: WatchArgs,
}

impl Commands {
  /// Options of the config file, overridden by the flags that were given.
  fn into_bundler_options(self) -> anyhow::Result<BundlerOptions> {
    let mut options = match &self.input.config {
      Some(path) => {
        let content = std::fs::read_to_string(path)
          .with_context(|| format!("Could not read {}", path.display()))?;
        serde_json::from_str::<BundlerOptions>(&content)
          .with_context(|| format!("Invalid config file {}", path.display()))?
      }
      None => BundlerOptions::default(),
    };

    let InputArgs { cwd, input, platform, external, .. } = self.input;
    if let Some(input) = input {
      options.input = Some(input.iter().map(|path| path.to_string_lossy().into()).collect());
    }
    options.cwd = cwd.or(options.cwd);
    options.platform = platform.map(Into::into).or(options.platform);
    if let Some(external) = external {
      options.external = Some(external.into_iter().map(FilterPattern::glob).collect());
    }

    let OutputArgs { dir, file, entry_filenames, chunk_filenames, asset_filenames, sourcemap } =
      self.output;
    options.dir = dir.or(options.dir);
    options.file = file.or(options.file);
    options.entry_filenames = entry_filenames.or(options.entry_filenames);
    options.chunk_filenames = chunk_filenames.or(options.chunk_filenames);
    options.asset_filenames = asset_filenames.or(options.asset_filenames);
    if sourcemap {
      options.sourcemap = Some(true);
    }
    Ok(options)
  }
}

fn print_outputs(outputs: &[Output]) {
  let mut left = 0;
  let mut right = 0;

  let mut assets = Vec::with_capacity(outputs.len());

  for output in outputs {
    #[allow(clippy::cast_precision_loss)]
    let size = format!("{:.2}", output.content_as_bytes().len() as f64 / 1024.0);

    if size.len() > right {
      right = size.len();
    }

    let filename = output.filename();
    if filename.len() > left {
      left = filename.len();
    }

    assets.push((filename, size, matches!(output, Output::Chunk(_))));
  }

  let dim = Colour::White.dimmed();
  let color = Colour::Cyan;

  for (filename, size, is_chunk) in assets {
    let asset_type = if is_chunk { "chunk" } else { "asset" };
    let filename_len = filename.len();

    println!(
      "{}{}{:left$} {}{}{:right$}{} kB",
      dim.paint("<DIR>/"),
      color.paint(filename),
      "",
      dim.paint(asset_type),
      dim.paint(" │ size: "),
      "",
      size,
      left = left - filename_len,
      right = right - size.len()
    );
  }
}

fn print_warnings(warnings: &[anyhow::Error]) {
  for warning in warnings {
    println!("{} {warning:#}", Colour::Yellow.paint("Warning:"));
  }
}

fn print_errors(errors: &BuildError) {
  for error in &**errors {
    eprintln!("{} {error:#}", Colour::Red.paint("Error:"));
  }
}

fn print_elapsed(millis: f64) {
  let elapsed = format!("{millis:.2} ms");
  println!("\n{} Finished in {}", Colour::Green.paint("✔"), Colour::White.bold().paint(elapsed));
}

async fn build_once(mut bundler: Bundler, silent: bool) -> ExitCode {
  let start = Instant::now();
  match bundler.write().await {
    Ok(output) => {
      if !silent {
        print_warnings(&output.warnings);
        if !output.assets.is_empty() {
          print_outputs(&output.assets);
        }
        print_elapsed(start.elapsed().as_secs_f64() * 1000.0);
      }
      ExitCode::SUCCESS
    }
    Err(errors) => {
      print_errors(&errors);
      ExitCode::FAILURE
    }
  }
}

async fn watch(bundler: Bundler, silent: bool) -> anyhow::Result<()> {
  let mut watcher = Watcher::new(Arc::new(Mutex::new(bundler)), WatcherOptions::default())?;
  let mut events = watcher.subscribe();

  loop {
    let event = tokio::select! {
      event = events.recv() => event,
      _ = tokio::signal::ctrl_c() => break,
    };
    match event {
      Ok(WatcherEvent::BundleStart { generation }) => {
        tracing::debug!("Build {generation} started");
      }
      Ok(WatcherEvent::BundleEnd { output, duration, .. }) => {
        if !silent {
          print_warnings(&output.warnings);
          print_outputs(&output.assets);
          print_elapsed(duration.as_secs_f64() * 1000.0);
        }
        println!("{}", Colour::White.dimmed().paint("Waiting for changes..."));
      }
      Ok(WatcherEvent::Error { error, .. }) => print_errors(&error),
      Ok(WatcherEvent::Close) | Err(RecvError::Closed) => break,
      Err(RecvError::Lagged(skipped)) => tracing::debug!("Skipped {skipped} watcher events"),
    }
  }

  watcher.close().await;
  Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
  if let Ok(filter) = EnvFilter::try_from_env("MINIPACK_LOG") {
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
  }

  let args = Commands::parse();
  let (watch_mode, silent) = (args.watch.watch, args.watch.silent);

  let bundler = match args.into_bundler_options().map_err(BuildError::from).and_then(|options| {
    Bundler::builder().with_options(options).build()
  }) {
    Ok(bundler) => bundler,
    Err(errors) => {
      print_errors(&errors);
      return ExitCode::FAILURE;
    }
  };

  if !watch_mode {
    return build_once(bundler, silent).await;
  }

  match watch(bundler, silent).await {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      eprintln!("{} {err:#}", Colour::Red.paint("Error:"));
      ExitCode::FAILURE
    }
  }
}
