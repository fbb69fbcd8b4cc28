use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod cmd;
mod output;

use cmd::{BuildArgs, cmd_build, cmd_clean};
use output::OutputFormat;

/// Environment variable holding a tracing filter, e.g. `sandstone_lib=debug`.
const LOG_ENV: &str = "SANDSTONE_LOG";

/// sand - build sandstone projects
#[derive(Parser)]
#[command(name = "sand")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Build the project into .sandstone/output
  Build {
    /// Project root directory
    #[arg(default_value = ".")]
    project: PathBuf,

    /// Project config file, relative to the project root
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Production build: output directories are not pre-created and archives run in the background
    #[arg(long)]
    production: bool,

    /// Run the entry script without writing any output
    #[arg(long)]
    dry: bool,

    /// Wait for each archive before moving to the next pack type
    #[arg(long)]
    await_archives: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,
  },

  /// Remove the project's output directory
  Clean {
    /// Project root directory
    #[arg(default_value = ".")]
    project: PathBuf,
  },
}

fn log_filter(verbose: bool) -> EnvFilter {
  EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }))
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  tracing_subscriber::fmt()
    .with_env_filter(log_filter(cli.verbose))
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  match cli.command {
    Commands::Build {
      project,
      config,
      production,
      dry,
      await_archives,
      output,
    } => cmd_build(&BuildArgs {
      project,
      config,
      production,
      dry,
      await_archives,
      verbose: cli.verbose,
      output,
    }),
    Commands::Clean { project } => cmd_clean(&project),
  }
}
