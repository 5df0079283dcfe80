//! Implementation of the `protopack info` command.

use anyhow::Result;
use serde::Serialize;

use protopack_lib::layout::{ProjectLayout, python_interpreter};
use protopack_lib::metadata::{PackageMetadata, load_metadata};

use crate::output::{OutputFormat, Status, field, json, status};

#[derive(Debug, Serialize)]
struct InfoReport<'a> {
  version: &'static str,
  python: String,
  layout: &'a ProjectLayout,
  #[serde(skip_serializing_if = "Option::is_none")]
  metadata: Option<PackageMetadata>,
  #[serde(skip_serializing_if = "Option::is_none")]
  metadata_error: Option<String>,
}

/// Print where protopack reads and writes for this project.
///
/// An unreadable metadata record is reported, not treated as an error.
pub fn cmd_info(layout: &ProjectLayout, output: OutputFormat) -> Result<()> {
  let (metadata, metadata_error) = match load_metadata(&layout.metadata_file) {
    Ok(metadata) => (Some(metadata), None),
    Err(e) => (None, Some(e.to_string())),
  };

  let report = InfoReport {
    version: env!("CARGO_PKG_VERSION"),
    python: python_interpreter(None),
    layout,
    metadata,
    metadata_error,
  };

  if output.is_json() {
    return json(&report);
  }

  println!("protopack {}", report.version);
  println!();
  println!("Project:");
  field("Root", layout.root.display());
  field("Definitions", layout.definitions_dir.display());
  field("Bindings", layout.bindings_dir.display());
  field("Service stubs", layout.services_dir.display());
  field("Dist", layout.dist_dir.display());
  field("Python", &report.python);

  println!();
  println!("Package:");
  match (&report.metadata, &report.metadata_error) {
    (Some(metadata), _) => {
      field("Name", &metadata.name);
      field("Distribution", &metadata.distribution_name);
      field("Version", &metadata.version);
    }
    (None, Some(error)) => status(Status::Partial, error),
    (None, None) => {}
  }

  Ok(())
}
