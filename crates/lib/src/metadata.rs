//! Package metadata record.
//!
//! The record is a JSON document at the project root (`package_info.json`)
//! holding at least `package_name` and `package_version`. It is loaded once
//! per process and passed by value into both pipeline stages.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum MetadataError {
  #[error("failed to read metadata record {}: {source}", path.display())]
  Read { path: PathBuf, source: std::io::Error },

  #[error("failed to parse metadata record {}: {source}", path.display())]
  Parse { path: PathBuf, source: serde_json::Error },

  #[error("metadata record {} is missing required key `{key}`", path.display())]
  MissingKey { path: PathBuf, key: &'static str },

  #[error("metadata record {} has an empty `{key}`", path.display())]
  EmptyValue { path: PathBuf, key: &'static str },
}

/// On-disk shape of the record. Required keys are optional here so that a
/// missing key is reported by name instead of as a serde error.
#[derive(Debug, Deserialize)]
struct RawRecord {
  package_name: Option<String>,
  package_version: Option<String>,
  #[serde(flatten)]
  distribution: DistributionInfo,
}

/// Optional fields copied into the distribution's `PKG-INFO`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionInfo {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub author: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub author_email: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub url: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub license: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub python_requires: Option<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub install_requires: Vec<String>,
}

/// Identity of the package being built. Immutable for the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageMetadata {
  /// Importable identifier: `package_name` with hyphens replaced by underscores.
  pub name: String,
  /// `package_name` exactly as written in the record.
  pub distribution_name: String,
  pub version: String,
  #[serde(flatten)]
  pub distribution: DistributionInfo,
}

impl PackageMetadata {
  /// Build metadata from a raw distribution name and version.
  pub fn new(distribution_name: impl Into<String>, version: impl Into<String>) -> Self {
    let distribution_name = distribution_name.into();
    Self {
      name: package_identifier(&distribution_name),
      distribution_name,
      version: version.into(),
      distribution: DistributionInfo::default(),
    }
  }

  /// `<name>-<version>`, the stem of archive names and archive entry prefixes.
  pub fn release_stem(&self) -> String {
    format!("{}-{}", self.name, self.version)
  }
}

/// Normalize a distribution name into a Python package identifier.
pub fn package_identifier(distribution_name: &str) -> String {
  distribution_name.replace('-', "_")
}

/// Load and validate the metadata record at `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not valid JSON, or lacks a
/// non-empty `package_name` / `package_version`.
pub fn load_metadata(path: &Path) -> Result<PackageMetadata, MetadataError> {
  let content = fs::read_to_string(path).map_err(|e| MetadataError::Read {
    path: path.to_path_buf(),
    source: e,
  })?;

  let raw: RawRecord = serde_json::from_str(&content).map_err(|e| MetadataError::Parse {
    path: path.to_path_buf(),
    source: e,
  })?;

  let name = required(path, "package_name", raw.package_name)?;
  let version = required(path, "package_version", raw.package_version)?;

  let mut metadata = PackageMetadata::new(name, version);
  metadata.distribution = raw.distribution;

  debug!(
    path = %path.display(),
    name = %metadata.name,
    version = %metadata.version,
    "loaded package metadata"
  );

  Ok(metadata)
}

fn required(path: &Path, key: &'static str, value: Option<String>) -> Result<String, MetadataError> {
  let value = value.ok_or_else(|| MetadataError::MissingKey {
    path: path.to_path_buf(),
    key,
  })?;

  if value.trim().is_empty() {
    return Err(MetadataError::EmptyValue {
      path: path.to_path_buf(),
      key,
    });
  }

  Ok(value)
}
