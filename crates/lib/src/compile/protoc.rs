//! External compiler invocation.
//!
//! The definition compiler is treated as an opaque process: it receives a
//! command line and answers with an exit status. `DefinitionCompiler` is the
//! seam; `ProtocCompiler` runs `grpc_tools.protoc` through a Python
//! interpreter.

use std::future::Future;
use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

use super::types::{CompileInvocation, CompileInvocationError};

/// Something that can compile one definition file.
pub trait DefinitionCompiler: Send + Sync {
  fn compile(
    &self,
    invocation: &CompileInvocation,
  ) -> impl Future<Output = Result<(), CompileInvocationError>> + Send;
}

/// Runs `<program> <prefix args...> <invocation args...>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocCompiler {
  program: String,
  prefix_args: Vec<String>,
}

impl ProtocCompiler {
  pub fn new(program: impl Into<String>, prefix_args: Vec<String>) -> Self {
    Self {
      program: program.into(),
      prefix_args,
    }
  }

  /// `python -m grpc_tools.protoc`, the compiler bundled with grpcio-tools.
  pub fn grpc_tools(python: &str) -> Self {
    Self::new(python, vec!["-m".to_string(), "grpc_tools.protoc".to_string()])
  }

  /// Full command line for `invocation`, program first.
  pub fn command_line(&self, invocation: &CompileInvocation) -> Vec<String> {
    std::iter::once(self.program.clone())
      .chain(self.prefix_args.iter().cloned())
      .chain(invocation.args())
      .collect()
  }
}

impl DefinitionCompiler for ProtocCompiler {
  fn compile(
    &self,
    invocation: &CompileInvocation,
  ) -> impl Future<Output = Result<(), CompileInvocationError>> + Send {
    let command = self.command_line(invocation);

    async move {
      debug!(command = %command.join(" "), "running definition compiler");

      let output = Command::new(&command[0])
        .args(&command[1..])
        .output()
        .await
        .map_err(|e| CompileInvocationError::Launch {
          command: command.clone(),
          source: e,
        })?;

      if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if !stderr.is_empty() {
          debug!(stderr = %stderr, "compiler stderr");
        }
        return Err(CompileInvocationError::Failed {
          command,
          code: output.status.code(),
          stderr,
        });
      }

      Ok(())
    }
  }
}

#[derive(Debug, Error)]
pub enum ToolchainError {
  #[error("failed to run `{python}` to locate include paths: {source}")]
  Launch { python: String, source: std::io::Error },

  #[error("`{python}` could not locate include paths (is grpcio-tools installed?): {stderr}")]
  Failed { python: String, stderr: String },

  #[error("unexpected include path probe output `{output}`: {source}")]
  Parse { output: String, source: serde_json::Error },
}

/// Prints the bundled `.proto` directory of grpcio-tools and the pure-library
/// install path of the running interpreter.
const PROBE_SCRIPT: &str = r#"import json, os, sysconfig
import grpc_tools
print(json.dumps({
    "bundled": [os.path.join(os.path.dirname(grpc_tools.__file__), "_proto")],
    "library": sysconfig.get_paths()["purelib"],
}))"#;

/// Include directories contributed by the installed toolchain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct IncludeProbe {
  /// Locations of definition files bundled with the compiler's dependencies.
  pub bundled: Vec<PathBuf>,
  /// The interpreter's library install path, searched last.
  pub library: Option<PathBuf>,
}

impl IncludeProbe {
  /// Bundled directories first, then the library path.
  pub fn into_paths(self) -> Vec<PathBuf> {
    self.bundled.into_iter().chain(self.library).collect()
  }
}

/// Ask `python` where grpcio-tools keeps its bundled definitions and where
/// its library install path is.
pub async fn probe_include_paths(python: &str) -> Result<IncludeProbe, ToolchainError> {
  let output = Command::new(python)
    .arg("-c")
    .arg(PROBE_SCRIPT)
    .output()
    .await
    .map_err(|e| ToolchainError::Launch {
      python: python.to_string(),
      source: e,
    })?;

  if !output.status.success() {
    return Err(ToolchainError::Failed {
      python: python.to_string(),
      stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    });
  }

  let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
  let probe: IncludeProbe = serde_json::from_str(&stdout).map_err(|e| ToolchainError::Parse {
    output: stdout.clone(),
    source: e,
  })?;

  info!(
    bundled = ?probe.bundled,
    library = ?probe.library,
    "located toolchain include paths"
  );

  Ok(probe)
}
