//! protopack - build typed Python packages from protobuf definitions.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use protopack_lib::layout::ProjectLayout;

mod cmd;
mod output;

use cmd::{AssembleArgs, GenerateArgs};
use output::OutputFormat;

#[derive(Parser)]
#[command(name = "protopack")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable debug logging
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Project root containing package_info.json and src/
  #[arg(short = 'C', long, global = true, default_value = ".")]
  project: PathBuf,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Compile every .proto file into Python bindings, gRPC stubs and type stubs
  Generate(GenerateArgs),

  /// Merge sources and generated code into a package and write a source distribution
  Assemble(AssembleArgs),

  /// Show the resolved project layout and package metadata
  Info {
    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  let layout = ProjectLayout::new(&cli.project);

  match cli.command {
    Commands::Generate(args) => cmd::cmd_generate(&layout, args),
    Commands::Assemble(args) => cmd::cmd_assemble(&layout, args),
    Commands::Info { output } => cmd::cmd_info(&layout, output),
  }
}

/// Logs go to stderr so `-o json` output on stdout stays parseable.
fn init_tracing(verbose: bool) {
  let default = if verbose { "debug" } else { "info" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();
}
