//! Staging tree: the merged package directory that exists only while an
//! assembly run is in progress.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::consts::{INIT_MARKER, TYPED_MARKER};

use super::types::AssembleError;

/// Owns the staging directory; dropping it deletes the directory.
///
/// Removal happens on every exit path, including early returns through `?`
/// and unwinding panics. A failed removal is logged and otherwise ignored so
/// it never hides the error that ended the run.
#[derive(Debug)]
pub struct StagingTree {
  path: PathBuf,
}

impl StagingTree {
  /// Create the staging directory.
  ///
  /// Refuses to adopt an existing directory: it would be deleted at the end of
  /// the run even though this run did not create it.
  pub fn create(path: &Path) -> Result<Self, AssembleError> {
    if path.exists() {
      return Err(AssembleError::StagingExists {
        path: path.to_path_buf(),
      });
    }

    fs::create_dir_all(path).map_err(|e| AssembleError::CreateStaging {
      path: path.to_path_buf(),
      source: e,
    })?;

    debug!(path = %path.display(), "created staging tree");
    Ok(Self {
      path: path.to_path_buf(),
    })
  }

  pub fn path(&self) -> &Path {
    &self.path
  }
}

impl Drop for StagingTree {
  fn drop(&mut self) {
    match fs::remove_dir_all(&self.path) {
      Ok(()) => debug!(path = %self.path.display(), "removed staging tree"),
      Err(e) if e.kind() == io::ErrorKind::NotFound => {}
      Err(e) => warn!(path = %self.path.display(), error = %e, "failed to remove staging tree"),
    }
  }
}

/// Recursively copy `src` into `dest`, overwriting files that already exist.
///
/// Returns the number of files copied.
pub fn overlay_tree(src: &Path, dest: &Path) -> Result<usize, AssembleError> {
  let mut copied = 0;

  for entry in WalkDir::new(src).follow_links(true).sort_by_file_name() {
    let entry = entry.map_err(|e| AssembleError::Walk {
      path: src.to_path_buf(),
      source: e,
    })?;

    let rel = entry.path().strip_prefix(src).unwrap_or(entry.path());
    let target = dest.join(rel);

    if entry.file_type().is_dir() {
      fs::create_dir_all(&target).map_err(|e| AssembleError::Copy {
        from: entry.path().to_path_buf(),
        to: target.clone(),
        source: e,
      })?;
    } else if entry.file_type().is_file() {
      fs::copy(entry.path(), &target).map_err(|e| AssembleError::Copy {
        from: entry.path().to_path_buf(),
        to: target.clone(),
        source: e,
      })?;
      copied += 1;
    }
  }

  Ok(copied)
}

/// Mark `package_dir` and every directory below it as a package.
///
/// The root gets an initializer and a typed marker; every sub-directory, at
/// any depth, gets an initializer. Existing files are left untouched.
/// Returns the number of markers created.
pub fn inject_markers(package_dir: &Path) -> Result<usize, AssembleError> {
  let mut created = 0;

  created += touch(&package_dir.join(INIT_MARKER))? as usize;
  created += touch(&package_dir.join(TYPED_MARKER))? as usize;

  // Collect first so the walk never observes the markers it creates.
  let mut subdirs = Vec::new();
  for entry in WalkDir::new(package_dir).min_depth(1).sort_by_file_name() {
    let entry = entry.map_err(|e| AssembleError::Walk {
      path: package_dir.to_path_buf(),
      source: e,
    })?;
    if entry.file_type().is_dir() {
      subdirs.push(entry.into_path());
    }
  }

  for dir in subdirs {
    created += touch(&dir.join(INIT_MARKER))? as usize;
  }

  Ok(created)
}

/// Create an empty file if absent. Returns whether a file was created.
fn touch(path: &Path) -> Result<bool, AssembleError> {
  if path.exists() {
    return Ok(false);
  }

  OpenOptions::new()
    .create(true)
    .append(true)
    .open(path)
    .map_err(|e| AssembleError::Marker {
      path: path.to_path_buf(),
      source: e,
    })?;

  Ok(true)
}
