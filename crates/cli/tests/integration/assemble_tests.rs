//! Assemble command integration tests.

use std::collections::BTreeSet;
use std::fs::File;

use flate2::read::GzDecoder;
use predicates::prelude::*;
use serial_test::serial;

use super::common::TestEnv;

fn generated(env: &TestEnv) {
  env.protopack_cmd().arg("generate").assert().success();
}

fn archive_entries(path: &std::path::Path) -> BTreeSet<String> {
  let mut archive = tar::Archive::new(GzDecoder::new(File::open(path).unwrap()));
  archive
    .entries()
    .unwrap()
    .map(|e| e.unwrap().path().unwrap().to_string_lossy().to_string())
    .collect()
}

#[test]
#[serial]
fn assemble_writes_source_distribution() {
  let env = TestEnv::sense_project();
  generated(&env);

  env
    .protopack_cmd()
    .arg("assemble")
    .assert()
    .success()
    .stdout(predicate::str::contains("Source distribution built"));

  let archive = env.path("dist/th2_sense-1.2.3.tar.gz");
  let entries = archive_entries(&archive);
  for expected in [
    "th2_sense-1.2.3/PKG-INFO",
    "th2_sense-1.2.3/README.md",
    "th2_sense-1.2.3/package_info.json",
    "th2_sense-1.2.3/th2_sense/__init__.py",
    "th2_sense-1.2.3/th2_sense/py.typed",
    "th2_sense-1.2.3/th2_sense/sense.proto",
    "th2_sense-1.2.3/th2_sense/sense_pb2.py",
    "th2_sense-1.2.3/th2_sense/sense_pb2_grpc.py",
    "th2_sense-1.2.3/th2_sense/sense_pb2.pyi",
    "th2_sense-1.2.3/th2_sense/rules/__init__.py",
    "th2_sense-1.2.3/th2_sense/rules/rule_pb2.py",
  ] {
    assert!(entries.contains(expected), "missing {expected} in {entries:?}");
  }
  assert!(!env.path("th2_sense").exists());
}

#[test]
#[serial]
fn assemble_twice_gives_identical_archive() {
  let env = TestEnv::sense_project();
  generated(&env);

  env.protopack_cmd().args(["assemble", "--dist", "a"]).assert().success();
  env.protopack_cmd().args(["assemble", "--dist", "b"]).assert().success();

  let first = std::fs::read(env.path("a/th2_sense-1.2.3.tar.gz")).unwrap();
  let second = std::fs::read(env.path("b/th2_sense-1.2.3.tar.gz")).unwrap();
  assert_eq!(first, second);
}

#[test]
#[serial]
fn dry_run_writes_nothing() {
  let env = TestEnv::sense_project();
  generated(&env);

  let output = env
    .protopack_cmd()
    .args(["assemble", "--dry-run", "-o", "json"])
    .output()
    .unwrap();

  assert!(output.status.success());
  let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(
    report["manifest"]["packages"],
    serde_json::json!(["", "th2_sense", "th2_sense/rules"])
  );
  assert_eq!(
    report["manifest"]["package_data"][""],
    serde_json::json!(["package_info.json"])
  );
  assert!(report["outcome"].is_null());
  assert!(!env.path("dist").exists());
  assert!(!env.path("th2_sense").exists());
}

#[test]
#[serial]
fn missing_service_stubs_fail_before_staging() {
  let env = TestEnv::sense_project();
  generated(&env);
  std::fs::remove_dir_all(env.path("src/gen/main/services")).unwrap();

  env
    .protopack_cmd()
    .arg("assemble")
    .assert()
    .failure()
    .stderr(predicate::str::contains("generated service stubs not found"));

  assert!(!env.path("th2_sense").exists());
}

#[test]
#[serial]
fn existing_staging_directory_is_refused() {
  let env = TestEnv::sense_project();
  generated(&env);
  env.write("th2_sense/local.py", "keep");

  env
    .protopack_cmd()
    .arg("assemble")
    .assert()
    .failure()
    .stderr(predicate::str::contains("staging directory already exists"));

  assert!(env.path("th2_sense/local.py").is_file());
}
