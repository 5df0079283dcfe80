//! Package manifest: which packages ship and which data files go with them.
//!
//! The manifest is derived from the staging tree after marker injection and
//! is never persisted; the archival step consumes it directly.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Serialize, Serializer};

use crate::consts::{INIT_MARKER, PACKAGE_DATA_PATTERNS};

use super::types::AssembleError;

/// A package location relative to the distribution root.
///
/// The distribution root itself is the empty path.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PackagePath(Vec<String>);

impl PackagePath {
  pub fn root() -> Self {
    Self(Vec::new())
  }

  pub fn from_components<I, S>(components: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self(components.into_iter().map(Into::into).collect())
  }

  pub fn is_root(&self) -> bool {
    self.0.is_empty()
  }

  pub fn components(&self) -> &[String] {
    &self.0
  }

  pub fn child(&self, name: &str) -> Self {
    let mut components = self.0.clone();
    components.push(name.to_string());
    Self(components)
  }

  /// Import name, e.g. `th2_sense.sub`.
  pub fn dotted(&self) -> String {
    self.0.join(".")
  }

  /// Location relative to the distribution root.
  pub fn to_relative_path(&self) -> PathBuf {
    self.0.iter().collect()
  }
}

impl fmt::Display for PackagePath {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0.join("/"))
  }
}

impl Serialize for PackagePath {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(self)
  }
}

/// Package list plus the data-file patterns shipped with each package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PackageManifest {
  pub packages: BTreeSet<PackagePath>,
  pub package_data: BTreeMap<PackagePath, BTreeSet<String>>,
}

impl PackageManifest {
  /// The root ships only the metadata record; every other package ships its
  /// definitions, type stubs and the typed marker.
  pub fn from_packages(packages: BTreeSet<PackagePath>, metadata_file_name: &str) -> Self {
    let package_data = packages
      .iter()
      .map(|package| {
        let patterns: BTreeSet<String> = if package.is_root() {
          BTreeSet::from([metadata_file_name.to_string()])
        } else {
          PACKAGE_DATA_PATTERNS.iter().map(|p| p.to_string()).collect()
        };
        (package.clone(), patterns)
      })
      .collect();

    Self { packages, package_data }
  }

  pub fn patterns(&self, package: &PackagePath) -> impl Iterator<Item = &str> {
    self.package_data.get(package).into_iter().flatten().map(String::as_str)
  }
}

/// Discover the packages of a staged tree.
///
/// Returns the distribution root plus every directory, starting at
/// `package_dir` itself, that carries an initializer marker. Directories
/// without a marker are not packages and are not descended into.
pub fn discover_packages(package_dir: &Path) -> Result<BTreeSet<PackagePath>, AssembleError> {
  let mut packages = BTreeSet::from([PackagePath::root()]);

  let name = package_dir
    .file_name()
    .map(|n| n.to_string_lossy().to_string())
    .unwrap_or_default();

  visit(package_dir, PackagePath::root().child(&name), &mut packages)?;
  Ok(packages)
}

fn visit(dir: &Path, package: PackagePath, packages: &mut BTreeSet<PackagePath>) -> Result<(), AssembleError> {
  if !dir.join(INIT_MARKER).is_file() {
    return Ok(());
  }
  packages.insert(package.clone());

  let read_err = |e: std::io::Error| AssembleError::ReadDir {
    path: dir.to_path_buf(),
    source: e,
  };

  let mut subdirs = Vec::new();
  for entry in fs::read_dir(dir).map_err(read_err)? {
    let entry = entry.map_err(read_err)?;
    if entry.path().is_dir() {
      subdirs.push(entry.file_name().to_string_lossy().to_string());
    }
  }
  subdirs.sort();

  for name in subdirs {
    visit(&dir.join(&name), package.child(&name), packages)?;
  }

  Ok(())
}

/// Shell-style match of a file name against a pattern with `*` and `?`.
pub fn matches_pattern(pattern: &str, file_name: &str) -> bool {
  fn matches(pattern: &[char], name: &[char]) -> bool {
    match pattern.split_first() {
      None => name.is_empty(),
      Some(('*', rest)) => (0..=name.len()).any(|skip| matches(rest, &name[skip..])),
      Some(('?', rest)) => !name.is_empty() && matches(rest, &name[1..]),
      Some((c, rest)) => name.first() == Some(c) && matches(rest, &name[1..]),
    }
  }

  let pattern: Vec<char> = pattern.chars().collect();
  let name: Vec<char> = file_name.chars().collect();
  matches(&pattern, &name)
}
