//! Implementation of the `protopack assemble` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use protopack_lib::assemble::{AssembleOptions, AssembleReport, PackageAssembler, SdistPackager};
use protopack_lib::layout::ProjectLayout;
use protopack_lib::metadata::load_metadata;

use crate::output::{OutputFormat, Status, field, human_size, json, short_digest, status};

#[derive(Debug, Args)]
pub struct AssembleArgs {
  /// Stage the package and compute its manifest without writing an archive
  #[arg(long)]
  pub dry_run: bool,

  /// Directory the source distribution is written to (default: dist)
  #[arg(long, value_name = "DIR")]
  pub dist: Option<PathBuf>,

  #[arg(short, long, value_enum, default_value_t)]
  pub output: OutputFormat,
}

/// Execute the assemble command.
///
/// The staging directory `<project>/<package>` never outlives the command,
/// whether or not it succeeds.
pub fn cmd_assemble(layout: &ProjectLayout, args: AssembleArgs) -> Result<()> {
  let metadata = load_metadata(&layout.metadata_file).context("Failed to load package metadata")?;
  let dist = args.dist.map_or_else(|| layout.dist_dir.clone(), |p| layout.resolve(&p));

  let assembler = PackageAssembler::new(metadata, layout);
  let options = AssembleOptions { dry_run: args.dry_run };
  let report = assembler
    .assemble(&SdistPackager::new(dist), &options)
    .context("Assembly failed")?;

  if args.output.is_json() {
    json(&report)?;
  } else {
    print_summary(&report);
  }

  Ok(())
}

fn print_summary(report: &AssembleReport) {
  println!();
  match &report.outcome {
    Some(outcome) => {
      status(Status::Done, "Source distribution built!");
      field("Archive", outcome.archive.display());
      field("SHA-256", short_digest(&outcome.sha256.0));
      field("Size", human_size(outcome.size));
      field("Files", outcome.files);
    }
    None => status(Status::Note, "Dry run - no archive written"),
  }
  field("Files staged", report.files_copied);
  field("Markers added", report.markers_created);

  println!();
  status(Status::Note, "Packages:");
  for package in &report.manifest.packages {
    let name = if package.is_root() {
      "<root>".to_string()
    } else {
      package.dotted()
    };
    let patterns: Vec<&str> = report.manifest.patterns(package).collect();
    field(&name, patterns.join(", "));
  }
}
