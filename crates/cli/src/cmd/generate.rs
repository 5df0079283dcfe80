//! Implementation of the `protopack generate` command.
//!
//! Compiles every definition file under the definitions root with
//! `python -m grpc_tools.protoc`, producing message bindings, gRPC service
//! stubs and type stubs in the bindings directory.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;
use clap::builder::RangedU64ValueParser;
use tracing::{debug, info};

use protopack_lib::compile::{GenerateOptions, GenerateReport, ProtocCompiler, generate, probe_include_paths};
use protopack_lib::layout::{ProjectLayout, python_interpreter};
use protopack_lib::metadata::load_metadata;

use crate::output::{OutputFormat, Status, elapsed, field, json, status};

const MAX_JOBS: u64 = 256;

#[derive(Debug, Args)]
pub struct GenerateArgs {
  /// Exit with a non-zero status on the first definition that fails to compile
  #[arg(short, long)]
  pub strict_mode: bool,

  /// Number of compiler processes to run at once
  #[arg(
    short,
    long,
    default_value_t = 1,
    value_parser = RangedU64ValueParser::<usize>::new().range(1..=MAX_JOBS)
  )]
  pub jobs: usize,

  /// Python interpreter with grpcio-tools installed (default: $PROTOPACK_PYTHON or python3)
  #[arg(long, value_name = "PY")]
  pub python: Option<String>,

  /// Root of the .proto tree (default: src/main/proto)
  #[arg(long, value_name = "DIR")]
  pub definitions: Option<PathBuf>,

  /// Output directory for generated code (default: src/gen/main/python)
  #[arg(long, value_name = "DIR")]
  pub out: Option<PathBuf>,

  /// Extra include directory, searched after the toolchain's own; repeatable
  #[arg(long = "proto-path", value_name = "DIR")]
  pub proto_path: Vec<PathBuf>,

  /// Do not ask the interpreter for its bundled include paths
  #[arg(long)]
  pub no_probe: bool,

  #[arg(short, long, value_enum, default_value_t)]
  pub output: OutputFormat,
}

/// Execute the generate command.
///
/// Failing definitions are reported and skipped unless `--strict-mode` is set,
/// in which case the first failure ends the command with an error.
pub fn cmd_generate(layout: &ProjectLayout, args: GenerateArgs) -> Result<()> {
  let start = Instant::now();
  let metadata = load_metadata(&layout.metadata_file).context("Failed to load package metadata")?;
  info!(package = %metadata.name, version = %metadata.version, "generating bindings");

  let python = python_interpreter(args.python.as_deref());
  debug!(python = %python, "selected interpreter");

  let mut options = GenerateOptions::new(
    args.definitions.map_or_else(|| layout.definitions_dir.clone(), |p| layout.resolve(&p)),
    args.out.map_or_else(|| layout.bindings_dir.clone(), |p| layout.resolve(&p)),
  );
  options.strict = args.strict_mode;
  options.jobs = args.jobs;
  options.package = Some(metadata.name);

  let extra_includes: Vec<PathBuf> = args.proto_path.iter().map(|p| layout.resolve(p)).collect();
  let probe = !args.no_probe;

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let report = rt.block_on(async {
    if probe {
      let found = probe_include_paths(&python)
        .await
        .context("Failed to locate toolchain include paths")?;
      options.include_paths.extend(found.into_paths());
    }
    options.include_paths.extend(extra_includes);

    let compiler = Arc::new(ProtocCompiler::grpc_tools(&python));
    generate(compiler, &options).await.context("Generation failed")
  })?;

  if args.output.is_json() {
    json(&report)?;
  } else {
    print_summary(&report, &options, start);
  }

  Ok(())
}

fn print_summary(report: &GenerateReport, options: &GenerateOptions, start: Instant) {
  println!();
  if report.discovered == 0 {
    status(Status::Note, "No definition files found");
  } else if report.is_clean() {
    status(Status::Done, "Generation complete!");
  } else {
    status(
      Status::Partial,
      &format!("Generation finished with {} failed definition(s)", report.skipped.len()),
    );
    for skipped in &report.skipped {
      status(Status::Partial, &format!("  {}", skipped.input.display()));
    }
  }
  if let Some(package) = &report.package {
    field("Package", package);
  }
  field("Definitions", report.discovered);
  field("Compiled", report.compiled.len());
  field("Skipped", report.skipped.len());
  field("Output", options.output_dir.display());
  field("Duration", elapsed(start.elapsed()));
}
