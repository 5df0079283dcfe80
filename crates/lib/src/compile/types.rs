//! Types for definition compilation.

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

/// A generated-artifact kind requested from the compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputTarget {
  /// Message bindings (`*_pb2.py`).
  Python,
  /// Service stubs (`*_pb2_grpc.py`).
  GrpcPython,
  /// Type stubs (`*_pb2.pyi`).
  Mypy,
}

impl OutputTarget {
  /// Every target, in the order they appear on the command line.
  pub const ALL: [OutputTarget; 3] = [OutputTarget::Python, OutputTarget::GrpcPython, OutputTarget::Mypy];

  /// Name of the compiler flag selecting this target's output directory.
  pub fn flag(self) -> &'static str {
    match self {
      OutputTarget::Python => "python_out",
      OutputTarget::GrpcPython => "grpc_python_out",
      OutputTarget::Mypy => "mypy_out",
    }
  }
}

/// Arguments for compiling a single definition file.
///
/// Built once per discovered file and dropped after the invocation returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileInvocation {
  pub input: PathBuf,
  /// Searched in order; never contains duplicates.
  pub include_paths: Vec<PathBuf>,
  pub outputs: Vec<(OutputTarget, PathBuf)>,
}

impl CompileInvocation {
  /// Request every `OutputTarget` into `output_dir`.
  pub fn new<I>(input: &Path, include_paths: I, output_dir: &Path) -> Self
  where
    I: IntoIterator<Item = PathBuf>,
  {
    let mut unique: Vec<PathBuf> = Vec::new();
    for path in include_paths {
      if !unique.contains(&path) {
        unique.push(path);
      }
    }

    Self {
      input: input.to_path_buf(),
      include_paths: unique,
      outputs: OutputTarget::ALL
        .iter()
        .map(|target| (*target, output_dir.to_path_buf()))
        .collect(),
    }
  }

  /// Compiler arguments: include paths, output flags, then the input file.
  pub fn args(&self) -> Vec<String> {
    let includes = self
      .include_paths
      .iter()
      .map(|path| format!("--proto_path={}", path.display()));
    let outputs = self
      .outputs
      .iter()
      .map(|(target, dir)| format!("--{}={}", target.flag(), dir.display()));

    includes
      .chain(outputs)
      .chain(std::iter::once(self.input.display().to_string()))
      .collect()
  }
}

/// A single compiler invocation did not succeed.
#[derive(Debug, Error)]
pub enum CompileInvocationError {
  /// The compiler ran and returned a non-zero status.
  #[error("compiler exited with status {}: {}", describe_code(*code), command.join(" "))]
  Failed {
    /// Full resolved command line, program first.
    command: Vec<String>,
    code: Option<i32>,
    stderr: String,
  },

  /// The compiler process could not be started.
  #[error("failed to launch compiler `{}`: {source}", command.join(" "))]
  Launch {
    command: Vec<String>,
    source: std::io::Error,
  },
}

impl CompileInvocationError {
  pub fn command(&self) -> &[String] {
    match self {
      CompileInvocationError::Failed { command, .. } | CompileInvocationError::Launch { command, .. } => command,
    }
  }
}

fn describe_code(code: Option<i32>) -> String {
  match code {
    Some(code) => code.to_string(),
    None => "<terminated by signal>".to_string(),
  }
}

/// Errors that abort a `generate` run.
#[derive(Debug, Error)]
pub enum CompileError {
  /// Only raised in strict mode.
  #[error("definitions root not found: {}", path.display())]
  MissingDefinitions { path: PathBuf },

  #[error("failed to walk definitions root {}: {source}", path.display())]
  Walk { path: PathBuf, source: walkdir::Error },

  #[error("failed to create output directory {}: {source}", path.display())]
  CreateOutputDir { path: PathBuf, source: std::io::Error },

  /// First failing invocation in strict mode, or a compiler that could not be launched.
  #[error(transparent)]
  Invocation(#[from] CompileInvocationError),

  #[error("compiler task failed: {0}")]
  Task(#[from] tokio::task::JoinError),
}

/// Options for a `generate` run.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
  pub definitions_dir: PathBuf,
  pub output_dir: PathBuf,
  /// Searched after the definitions root: bundled dependencies, then the
  /// interpreter's library path, then anything user supplied.
  pub include_paths: Vec<PathBuf>,
  /// Abort on the first failing invocation.
  pub strict: bool,
  /// Maximum concurrent invocations; `1` runs them one after another.
  pub jobs: usize,
  /// Identifier of the package being built, for logs and the report.
  pub package: Option<String>,
}

impl GenerateOptions {
  pub fn new(definitions_dir: PathBuf, output_dir: PathBuf) -> Self {
    Self {
      definitions_dir,
      output_dir,
      include_paths: Vec::new(),
      strict: false,
      jobs: 1,
      package: None,
    }
  }
}

/// A failed invocation tolerated by non-strict mode.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedDefinition {
  pub input: PathBuf,
  pub command: Vec<String>,
  pub reason: String,
}

/// Outcome of a `generate` run.
#[derive(Debug, Default, Serialize)]
pub struct GenerateReport {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub package: Option<String>,
  pub discovered: usize,
  pub compiled: Vec<PathBuf>,
  pub skipped: Vec<SkippedDefinition>,
}

impl GenerateReport {
  pub fn is_clean(&self) -> bool {
    self.skipped.is_empty()
  }
}
