//! Source distribution writer.
//!
//! Produces `<dist>/<name>-<version>.tar.gz`. Archives are reproducible:
//! entries are sorted and carry fixed ownership, permissions and timestamps,
//! and the gzip header has no timestamp, so unchanged inputs give
//! byte-identical output.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::write::GzEncoder;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::consts::SOURCE_DATE_EPOCH;
use crate::metadata::PackageMetadata;
use crate::util::hash::hash_file;

use super::manifest::{PackagePath, matches_pattern};
use super::package::{PackageOutcome, PackageRequest, Packager, PackagingError};

/// Writes gzipped tar source distributions into `dist_dir`.
///
/// The archive holds `PKG-INFO`, the readme and the manifest's files under a
/// `<name>-<version>/` prefix. No build script (`setup.py` or
/// `pyproject.toml`) is generated, so installers that build from source need
/// one supplied alongside; the archive is meant for distribution and
/// inspection as is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdistPackager {
  dist_dir: PathBuf,
}

impl SdistPackager {
  pub fn new(dist_dir: impl Into<PathBuf>) -> Self {
    Self {
      dist_dir: dist_dir.into(),
    }
  }

  pub fn dist_dir(&self) -> &Path {
    &self.dist_dir
  }

  pub fn archive_path(&self, metadata: &PackageMetadata) -> PathBuf {
    self.dist_dir.join(format!("{}.tar.gz", metadata.release_stem()))
  }

  /// Archive path -> contents, keyed relative to the release directory.
  fn collect_entries(&self, request: &PackageRequest<'_>) -> Result<BTreeMap<String, Vec<u8>>, PackagingError> {
    let mut entries = BTreeMap::new();

    let readme = match request.readme {
      Some(path) if path.is_file() => {
        let content = read(path)?;
        entries.insert(entry_name(path), content.clone());
        Some(String::from_utf8_lossy(&content).to_string())
      }
      _ => None,
    };
    entries.insert("PKG-INFO".to_string(), pkg_info(request.metadata, readme.as_deref()).into_bytes());

    for package in &request.manifest.packages {
      let dir = request.project_root.join(package.to_relative_path());
      let patterns: Vec<&str> = request.manifest.patterns(package).collect();

      for file in package_files(&dir, package, &patterns)? {
        let name = archive_name(package, &entry_name(&file));
        entries.insert(name, read(&file)?);
      }
    }

    Ok(entries)
  }
}

impl Packager for SdistPackager {
  fn package(&self, request: &PackageRequest<'_>) -> Result<PackageOutcome, PackagingError> {
    fs::create_dir_all(&self.dist_dir).map_err(|e| PackagingError::CreateDir {
      path: self.dist_dir.clone(),
      source: e,
    })?;

    let archive = self.archive_path(request.metadata);
    let stem = request.metadata.release_stem();
    let entries = self.collect_entries(request)?;

    let write_err = |e: std::io::Error| PackagingError::Write {
      path: archive.clone(),
      source: e,
    };

    // Written next to the destination and renamed into place, so a failed run
    // never leaves a truncated archive behind.
    let temp = NamedTempFile::new_in(&self.dist_dir).map_err(write_err)?;
    let mut builder = tar::Builder::new(GzEncoder::new(temp, Compression::default()));

    for (name, content) in &entries {
      let path = format!("{}/{}", stem, name);
      debug!(entry = %path, size = content.len(), "adding archive entry");

      let mut header = tar::Header::new_gnu();
      header.set_size(content.len() as u64);
      header.set_mode(0o644);
      header.set_uid(0);
      header.set_gid(0);
      header.set_mtime(SOURCE_DATE_EPOCH);
      header.set_entry_type(tar::EntryType::Regular);
      builder
        .append_data(&mut header, &path, content.as_slice())
        .map_err(write_err)?;
    }

    let temp = builder.into_inner().and_then(|gz| gz.finish()).map_err(write_err)?;
    temp.persist(&archive).map_err(|e| write_err(e.error))?;

    let size = fs::metadata(&archive).map_err(write_err)?.len();
    let sha256 = hash_file(&archive)?;

    info!(
      archive = %archive.display(),
      files = entries.len(),
      size,
      "wrote source distribution"
    );

    Ok(PackageOutcome {
      archive,
      sha256,
      size,
      files: entries.len(),
    })
  }
}

/// Render the core metadata file.
pub fn pkg_info(metadata: &PackageMetadata, readme: Option<&str>) -> String {
  let dist = &metadata.distribution;
  let mut lines = vec![
    "Metadata-Version: 2.1".to_string(),
    format!("Name: {}", metadata.name),
    format!("Version: {}", metadata.version),
    format!("Summary: {}", dist.description.as_deref().unwrap_or(&metadata.name)),
  ];

  let optional = [
    ("Home-page", &dist.url),
    ("Author", &dist.author),
    ("Author-email", &dist.author_email),
    ("License", &dist.license),
    ("Requires-Python", &dist.python_requires),
  ];
  for (key, value) in optional {
    if let Some(value) = value {
      lines.push(format!("{}: {}", key, value));
    }
  }

  for requirement in &dist.install_requires {
    lines.push(format!("Requires-Dist: {}", requirement));
  }
  lines.push("Description-Content-Type: text/markdown".to_string());

  let mut out = lines.join("\n");
  out.push('\n');
  if let Some(body) = readme {
    out.push('\n');
    out.push_str(body);
    if !body.ends_with('\n') {
      out.push('\n');
    }
  }
  out
}

/// Files shipped for `package` from `dir`, sorted by name.
///
/// The distribution root ships only pattern matches; real packages also ship
/// their modules.
fn package_files(dir: &Path, package: &PackagePath, patterns: &[&str]) -> Result<Vec<PathBuf>, PackagingError> {
  let read_err = |e: std::io::Error| PackagingError::Read {
    path: dir.to_path_buf(),
    source: e,
  };

  let mut files = Vec::new();
  for entry in fs::read_dir(dir).map_err(read_err)? {
    let entry = entry.map_err(read_err)?;
    let path = entry.path();
    if !path.is_file() {
      continue;
    }

    let name = entry.file_name().to_string_lossy().to_string();
    let is_module = !package.is_root() && name.ends_with(".py");
    if is_module || patterns.iter().any(|p| matches_pattern(p, &name)) {
      files.push(path);
    }
  }

  files.sort();
  Ok(files)
}

fn archive_name(package: &PackagePath, file_name: &str) -> String {
  if package.is_root() {
    file_name.to_string()
  } else {
    format!("{}/{}", package, file_name)
  }
}

fn entry_name(path: &Path) -> String {
  path
    .file_name()
    .map(|n| n.to_string_lossy().to_string())
    .unwrap_or_default()
}

fn read(path: &Path) -> Result<Vec<u8>, PackagingError> {
  fs::read(path).map_err(|e| PackagingError::Read {
    path: path.to_path_buf(),
    source: e,
  })
}
