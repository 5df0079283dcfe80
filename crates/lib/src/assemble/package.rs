//! The archival step.
//!
//! Assembly ends by handing the staged tree and its manifest to a `Packager`.
//! `SdistPackager` is the built-in implementation; anything else (a different
//! archive format, a test double) plugs in through the same trait.

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::metadata::PackageMetadata;
use crate::util::hash::{ContentHash, HashError};

use super::manifest::PackageManifest;

#[derive(Debug, Error)]
pub enum PackagingError {
  #[error("failed to create directory {}: {source}", path.display())]
  CreateDir { path: PathBuf, source: std::io::Error },

  #[error("failed to read {}: {source}", path.display())]
  Read { path: PathBuf, source: std::io::Error },

  #[error("failed to write archive {}: {source}", path.display())]
  Write { path: PathBuf, source: std::io::Error },

  #[error("failed to hash archive: {0}")]
  Hash(#[from] HashError),

  #[error("{0}")]
  Rejected(String),
}

/// Everything the archival step needs to know about a run.
#[derive(Debug, Clone, Copy)]
pub struct PackageRequest<'a> {
  /// Distribution root; package paths in the manifest are relative to it.
  pub project_root: &'a Path,
  /// The staged package directory (`<project_root>/<package>`).
  pub staging_dir: &'a Path,
  pub metadata: &'a PackageMetadata,
  pub manifest: &'a PackageManifest,
  /// Long description, when the project has one.
  pub readme: Option<&'a Path>,
}

/// A produced archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageOutcome {
  pub archive: PathBuf,
  pub sha256: ContentHash,
  pub size: u64,
  pub files: usize,
}

pub trait Packager {
  fn package(&self, request: &PackageRequest<'_>) -> Result<PackageOutcome, PackagingError>;
}
