//! Types for package assembly.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::layout::ProjectLayout;

use super::manifest::PackageManifest;
use super::package::{PackageOutcome, PackagingError};

/// Errors that abort an assembly run.
///
/// Every variant raised after the staging tree exists is returned only after
/// the tree has been removed.
#[derive(Debug, Error)]
pub enum AssembleError {
  #[error("{label} not found: {}", path.display())]
  MissingInput { label: &'static str, path: PathBuf },

  #[error("staging directory already exists: {} (remove it or move it out of the project root)", path.display())]
  StagingExists { path: PathBuf },

  #[error("failed to create staging directory {}: {source}", path.display())]
  CreateStaging { path: PathBuf, source: std::io::Error },

  #[error("failed to walk {}: {source}", path.display())]
  Walk { path: PathBuf, source: walkdir::Error },

  #[error("failed to copy {} to {}: {source}", from.display(), to.display())]
  Copy {
    from: PathBuf,
    to: PathBuf,
    source: std::io::Error,
  },

  #[error("failed to create marker {}: {source}", path.display())]
  Marker { path: PathBuf, source: std::io::Error },

  #[error("failed to read directory {}: {source}", path.display())]
  ReadDir { path: PathBuf, source: std::io::Error },

  #[error("packaging failed: {0}")]
  Packaging(#[from] PackagingError),
}

/// The three trees merged into the staging package, in overlay order.
///
/// Each tree holds a sub-directory named after the package; that
/// sub-directory is what gets copied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceTrees {
  pub package_sources: PathBuf,
  pub bindings: PathBuf,
  pub services: PathBuf,
}

impl SourceTrees {
  pub fn from_layout(layout: &ProjectLayout) -> Self {
    Self {
      package_sources: layout.package_sources_dir.clone(),
      bindings: layout.bindings_dir.clone(),
      services: layout.services_dir.clone(),
    }
  }

  /// `(label, <tree>/<package>)` pairs; later entries overwrite earlier ones.
  pub fn package_inputs(&self, package: &str) -> [(&'static str, PathBuf); 3] {
    [
      ("package sources", self.package_sources.join(package)),
      ("generated bindings", self.bindings.join(package)),
      ("generated service stubs", self.services.join(package)),
    ]
  }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AssembleOptions {
  /// Build the staging tree and manifest but skip the archival step.
  pub dry_run: bool,
}

/// Outcome of an assembly run.
#[derive(Debug, Serialize)]
pub struct AssembleReport {
  /// Where the staging tree lived; it no longer exists.
  pub staging_dir: PathBuf,
  pub files_copied: usize,
  pub markers_created: usize,
  pub manifest: PackageManifest,
  /// `None` on a dry run.
  pub outcome: Option<PackageOutcome>,
}
