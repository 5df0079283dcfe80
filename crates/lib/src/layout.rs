//! Project layout: where the pipeline reads and writes.
//!
//! Every path defaults to a fixed location relative to the project root.
//! The CLI overrides individual entries from flags; the Python interpreter can
//! additionally be selected through `PROTOPACK_PYTHON`.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::consts::{DEFAULT_PYTHON, METADATA_FILENAME, PYTHON_ENV};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectLayout {
  /// Project root; the staging tree is created directly under it.
  pub root: PathBuf,
  /// Root of the `.proto` tree fed to the compiler.
  pub definitions_dir: PathBuf,
  /// Hand-written package sources overlaid first during assembly.
  pub package_sources_dir: PathBuf,
  /// Output directory of the compiler; overlaid second.
  pub bindings_dir: PathBuf,
  /// Generated service stubs; overlaid last.
  pub services_dir: PathBuf,
  pub metadata_file: PathBuf,
  pub readme_file: PathBuf,
  pub dist_dir: PathBuf,
}

impl ProjectLayout {
  /// Default layout under `root`.
  ///
  /// The root is canonicalized when it exists so that every derived path
  /// (and every `--proto_path` handed to the compiler) is absolute.
  pub fn new(root: &Path) -> Self {
    let root = dunce::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
    let definitions_dir = root.join("src").join("main").join("proto");

    Self {
      package_sources_dir: definitions_dir.clone(),
      definitions_dir,
      bindings_dir: root.join("src").join("gen").join("main").join("python"),
      services_dir: root.join("src").join("gen").join("main").join("services").join("python"),
      metadata_file: root.join(METADATA_FILENAME),
      readme_file: root.join("README.md"),
      dist_dir: root.join("dist"),
      root,
    }
  }

  /// Resolve a user-supplied path against the project root.
  pub fn resolve(&self, path: &Path) -> PathBuf {
    if path.is_absolute() {
      path.to_path_buf()
    } else {
      self.root.join(path)
    }
  }

  /// Directory the package is staged in during assembly.
  pub fn staging_dir(&self, package_name: &str) -> PathBuf {
    self.root.join(package_name)
  }
}

/// Python interpreter used to run the compiler and probe include paths.
///
/// An explicit choice wins, then `PROTOPACK_PYTHON`, then `python3`.
pub fn python_interpreter(explicit: Option<&str>) -> String {
  if let Some(python) = explicit {
    return python.to_string();
  }
  std::env::var(PYTHON_ENV)
    .ok()
    .filter(|v| !v.trim().is_empty())
    .unwrap_or_else(|| DEFAULT_PYTHON.to_string())
}
