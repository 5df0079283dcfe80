//! Package assembly.
//!
//! Merges the hand-written package sources with the generated bindings and
//! service stubs into a staging tree named after the package, marks every
//! directory as a package, derives the manifest and hands both to a
//! [`Packager`]. The staging tree is removed before `assemble` returns,
//! whatever the outcome.

pub mod manifest;
pub mod package;
pub mod sdist;
pub mod staging;
pub mod types;

pub use manifest::{PackageManifest, PackagePath, discover_packages};
pub use package::{PackageOutcome, PackageRequest, Packager, PackagingError};
pub use sdist::SdistPackager;
pub use staging::{StagingTree, inject_markers, overlay_tree};
pub use types::{AssembleError, AssembleOptions, AssembleReport, SourceTrees};

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::layout::ProjectLayout;
use crate::metadata::PackageMetadata;

/// Builds the importable package for one project.
#[derive(Debug, Clone)]
pub struct PackageAssembler {
  metadata: PackageMetadata,
  root: PathBuf,
  staging_dir: PathBuf,
  sources: SourceTrees,
  readme: PathBuf,
  metadata_file_name: String,
}

impl PackageAssembler {
  pub fn new(metadata: PackageMetadata, layout: &ProjectLayout) -> Self {
    let metadata_file_name = layout
      .metadata_file
      .file_name()
      .map(|n| n.to_string_lossy().to_string())
      .unwrap_or_else(|| crate::consts::METADATA_FILENAME.to_string());

    Self {
      staging_dir: layout.staging_dir(&metadata.name),
      metadata,
      root: layout.root.clone(),
      sources: SourceTrees::from_layout(layout),
      readme: layout.readme_file.clone(),
      metadata_file_name,
    }
  }

  pub fn with_sources(mut self, sources: SourceTrees) -> Self {
    self.sources = sources;
    self
  }

  pub fn staging_dir(&self) -> &Path {
    &self.staging_dir
  }

  /// Run assembly, then packaging unless `options.dry_run` is set.
  ///
  /// # Errors
  ///
  /// Missing inputs and an existing staging directory are reported before
  /// anything is written. Copy, marker and packaging failures are reported
  /// after the staging tree has been removed.
  pub fn assemble<P: Packager + ?Sized>(
    &self,
    packager: &P,
    options: &AssembleOptions,
  ) -> Result<AssembleReport, AssembleError> {
    let inputs = self.sources.package_inputs(&self.metadata.name);
    for (label, path) in &inputs {
      if !path.is_dir() {
        return Err(AssembleError::MissingInput {
          label: *label,
          path: path.clone(),
        });
      }
    }

    let staging = StagingTree::create(&self.staging_dir)?;

    let mut files_copied = 0;
    for (label, path) in &inputs {
      let copied = overlay_tree(path, staging.path())?;
      debug!(source = *label, path = %path.display(), files = copied, "overlaid tree");
      files_copied += copied;
    }

    let markers_created = inject_markers(staging.path())?;
    let packages = discover_packages(staging.path())?;
    let manifest = PackageManifest::from_packages(packages, &self.metadata_file_name);

    info!(
      package = %self.metadata.name,
      files = files_copied,
      markers = markers_created,
      packages = manifest.packages.len(),
      "staged package"
    );

    let outcome = if options.dry_run {
      info!("dry run, skipping packaging");
      None
    } else {
      let request = PackageRequest {
        project_root: &self.root,
        staging_dir: staging.path(),
        metadata: &self.metadata,
        manifest: &manifest,
        readme: Some(self.readme.as_path()).filter(|p| p.is_file()),
      };
      Some(packager.package(&request)?)
    };

    drop(staging);

    Ok(AssembleReport {
      staging_dir: self.staging_dir.clone(),
      files_copied,
      markers_created,
      manifest,
      outcome,
    })
  }
}
