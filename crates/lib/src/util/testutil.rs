//! Test utilities for protopack-lib.
//!
//! Scratch-tree helpers, an in-process compiler double and a shell-script
//! factory for tests that need a real external process.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::compile::{CompileInvocation, CompileInvocationError, DefinitionCompiler};

/// Write `content` to `path`, creating parent directories.
pub fn write_file(path: &Path, content: &str) {
  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent).unwrap();
  }
  std::fs::write(path, content).unwrap();
}

/// Create an executable `/bin/sh` script named `name` in `dir`.
#[cfg(unix)]
pub fn shell_script(dir: &Path, name: &str, body: &str) -> PathBuf {
  use std::os::unix::fs::PermissionsExt;

  let path = dir.join(name);
  std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
  std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
  path
}

/// Records every invocation and fails those whose input file name is listed.
#[derive(Debug, Default)]
pub struct RecordingCompiler {
  failing: Vec<String>,
  seen: Mutex<Vec<CompileInvocation>>,
}

impl RecordingCompiler {
  pub fn failing(file_names: &[&str]) -> Self {
    Self {
      failing: file_names.iter().map(|s| s.to_string()).collect(),
      seen: Mutex::new(Vec::new()),
    }
  }

  pub fn invocations(&self) -> Vec<CompileInvocation> {
    self.seen.lock().unwrap().clone()
  }
}

impl DefinitionCompiler for RecordingCompiler {
  fn compile(
    &self,
    invocation: &CompileInvocation,
  ) -> impl Future<Output = Result<(), CompileInvocationError>> + Send {
    self.seen.lock().unwrap().push(invocation.clone());

    let name = invocation
      .input
      .file_name()
      .map(|n| n.to_string_lossy().to_string())
      .unwrap_or_default();

    let result = if self.failing.contains(&name) {
      Err(CompileInvocationError::Failed {
        command: std::iter::once("protoc".to_string()).chain(invocation.args()).collect(),
        code: Some(1),
        stderr: format!("{}: syntax error", name),
      })
    } else {
      Ok(())
    };

    std::future::ready(result)
  }
}
