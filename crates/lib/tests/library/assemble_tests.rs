//! Tests for package assembly through the public API.

use std::fs;

use protopack_lib::assemble::{
  AssembleError, AssembleOptions, PackageAssembler, PackageOutcome, PackagePath, PackageRequest, Packager,
  PackagingError, SdistPackager,
};
use protopack_lib::metadata::load_metadata;

use super::common::TestProject;

struct Failing;

impl Packager for Failing {
  fn package(&self, _request: &PackageRequest<'_>) -> Result<PackageOutcome, PackagingError> {
    Err(PackagingError::Rejected("disk full".to_string()))
  }
}

fn scenario(project: &TestProject) {
  project.metadata("pkg", "0.1.0");
  project.write("src/main/proto/pkg/a.py", "A = 1\n");
  project.write("src/gen/main/python/pkg/sub/b_pb2.py", "# b\n");
  project.write("src/gen/main/services/python/pkg/sub/b_pb2_grpc.py", "# grpc\n");
}

#[test]
fn scenario_manifest_and_archive() {
  let project = TestProject::new();
  scenario(&project);
  let metadata = load_metadata(&project.layout.metadata_file).unwrap();
  let assembler = PackageAssembler::new(metadata, &project.layout);

  let report = assembler
    .assemble(&SdistPackager::new(&project.layout.dist_dir), &AssembleOptions::default())
    .unwrap();

  let packages: Vec<String> = report.manifest.packages.iter().map(|p| p.to_string()).collect();
  assert_eq!(packages, vec!["", "pkg", "pkg/sub"]);
  let sub: Vec<&str> = report
    .manifest
    .patterns(&PackagePath::from_components(["pkg", "sub"]))
    .collect();
  assert_eq!(sub, vec!["*.proto", "*.pyi", "py.typed"]);

  let outcome = report.outcome.unwrap();
  assert_eq!(outcome.archive, project.layout.dist_dir.join("pkg-0.1.0.tar.gz"));
  // PKG-INFO, package_info.json, a.py, two markers, b_pb2.py, b_pb2_grpc.py, sub marker
  assert_eq!(outcome.files, 8);
  assert!(!project.root().join("pkg").exists());
}

#[test]
fn packaging_failure_still_cleans_up() {
  let project = TestProject::new();
  scenario(&project);
  let metadata = load_metadata(&project.layout.metadata_file).unwrap();
  let assembler = PackageAssembler::new(metadata, &project.layout);

  let err = assembler.assemble(&Failing, &AssembleOptions::default()).unwrap_err();

  assert!(matches!(err, AssembleError::Packaging(_)));
  assert!(err.to_string().contains("disk full"));
  assert!(!project.root().join("pkg").exists());
}

#[test]
fn sources_are_not_modified() {
  let project = TestProject::new();
  scenario(&project);
  let metadata = load_metadata(&project.layout.metadata_file).unwrap();
  let assembler = PackageAssembler::new(metadata, &project.layout);

  assembler.assemble(&Failing, &AssembleOptions::default()).unwrap_err();

  assert!(!project.root().join("src/main/proto/pkg/__init__.py").exists());
  assert!(!project.root().join("src/gen/main/python/pkg/sub/__init__.py").exists());
  assert_eq!(
    fs::read_to_string(project.root().join("src/main/proto/pkg/a.py")).unwrap(),
    "A = 1\n"
  );
}

#[test]
fn missing_bindings_tree_is_reported() {
  let project = TestProject::new();
  project.metadata("pkg", "0.1.0");
  project.write("src/main/proto/pkg/a.py", "");
  let metadata = load_metadata(&project.layout.metadata_file).unwrap();
  let assembler = PackageAssembler::new(metadata, &project.layout);

  let err = assembler
    .assemble(&SdistPackager::new(&project.layout.dist_dir), &AssembleOptions::default())
    .unwrap_err();

  assert!(err.to_string().starts_with("generated bindings not found"));
  assert!(!project.layout.dist_dir.exists());
}
