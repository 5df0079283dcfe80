//! Hashing utilities for artifact verification.
//!
//! - `ContentHash`: a full 64-character SHA-256 digest
//! - `hash_file()`: single file hashing
//! - `hash_directory()`: deterministic directory hashing, used to compare
//!   staging trees across runs

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

/// A full 64-character SHA-256 hash, lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub String);

impl std::fmt::Display for ContentHash {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

#[derive(Debug, thiserror::Error)]
pub enum HashError {
  #[error("failed to walk directory {}: {source}", path.display())]
  WalkDir { path: PathBuf, source: walkdir::Error },

  #[error("failed to read file {}: {source}", path.display())]
  ReadFile { path: PathBuf, source: io::Error },
}

/// Compute a deterministic hash of a directory's contents.
///
/// Covers relative paths, directory structure and file contents. Timestamps
/// and permissions are ignored. Entries are visited sorted by name.
pub fn hash_directory(path: &Path) -> Result<ContentHash, HashError> {
  let mut hasher = Sha256::new();

  for entry in WalkDir::new(path).sort_by_file_name() {
    let entry = entry.map_err(|e| HashError::WalkDir {
      path: path.to_path_buf(),
      source: e,
    })?;
    let entry_path = entry.path();

    let rel_path = entry_path
      .strip_prefix(path)
      .unwrap_or(entry_path)
      .to_string_lossy()
      .replace('\\', "/");

    if rel_path.is_empty() {
      continue;
    }

    let line = if entry.file_type().is_file() {
      format!("F:{}:{}", rel_path, hash_file(entry_path)?.0)
    } else if entry.file_type().is_dir() {
      format!("D:{}", rel_path)
    } else {
      continue;
    };

    hasher.update(line.as_bytes());
    hasher.update(b"\n");
  }

  Ok(ContentHash(hex::encode(hasher.finalize())))
}

/// Hash a file's contents.
pub fn hash_file(path: &Path) -> Result<ContentHash, HashError> {
  let read_err = |e: io::Error| HashError::ReadFile {
    path: path.to_path_buf(),
    source: e,
  };

  let mut file = fs::File::open(path).map_err(read_err)?;
  let mut hasher = Sha256::new();
  let mut buffer = [0u8; 8192];

  loop {
    let bytes_read = file.read(&mut buffer).map_err(read_err)?;
    if bytes_read == 0 {
      break;
    }
    hasher.update(&buffer[..bytes_read]);
  }

  Ok(ContentHash(hex::encode(hasher.finalize())))
}
