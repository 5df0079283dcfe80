//! Definition compilation.
//!
//! Walks the definitions root, builds one `CompileInvocation` per `.proto`
//! file and hands each to a `DefinitionCompiler`. Whether a failing
//! invocation aborts the run is decided here, from `GenerateOptions::strict`,
//! never by the compiler.

pub mod protoc;
pub mod types;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::consts::DEFINITION_SUFFIX;

pub use protoc::{DefinitionCompiler, IncludeProbe, ProtocCompiler, ToolchainError, probe_include_paths};
pub use types::{
  CompileError, CompileInvocation, CompileInvocationError, GenerateOptions, GenerateReport, OutputTarget,
  SkippedDefinition,
};

/// Find every definition file under `root`, sorted by path.
pub fn discover_definitions(root: &Path) -> Result<Vec<PathBuf>, CompileError> {
  let mut files = Vec::new();

  for entry in WalkDir::new(root).follow_links(true) {
    let entry = entry.map_err(|e| CompileError::Walk {
      path: root.to_path_buf(),
      source: e,
    })?;

    let is_definition =
      entry.file_type().is_file() && entry.file_name().to_string_lossy().ends_with(DEFINITION_SUFFIX);

    if is_definition {
      files.push(entry.into_path());
    }
  }

  files.sort();
  Ok(files)
}

/// Compile every definition file under `options.definitions_dir`.
///
/// The output directory is created first. Each file is compiled with the
/// definitions root as the primary include path followed by
/// `options.include_paths`.
///
/// In strict mode the first failing invocation (by discovery order) aborts the
/// run, and so does a missing definitions root. Otherwise failures are logged,
/// recorded in the report and the run continues; a missing root compiles
/// nothing. A compiler that cannot be launched at all always aborts.
pub async fn generate<C>(compiler: Arc<C>, options: &GenerateOptions) -> Result<GenerateReport, CompileError>
where
  C: DefinitionCompiler + 'static,
{
  let root_exists = options.definitions_dir.is_dir();
  if !root_exists && options.strict {
    return Err(CompileError::MissingDefinitions {
      path: options.definitions_dir.clone(),
    });
  }

  fs::create_dir_all(&options.output_dir).map_err(|e| CompileError::CreateOutputDir {
    path: options.output_dir.clone(),
    source: e,
  })?;

  if !root_exists {
    warn!(root = %options.definitions_dir.display(), "definitions root not found, nothing to compile");
    return Ok(GenerateReport {
      package: options.package.clone(),
      ..Default::default()
    });
  }

  let files = discover_definitions(&options.definitions_dir)?;
  info!(
    package = options.package.as_deref().unwrap_or("-"),
    root = %options.definitions_dir.display(),
    files = files.len(),
    strict = options.strict,
    "discovered definition files"
  );

  let includes: Vec<PathBuf> = std::iter::once(options.definitions_dir.clone())
    .chain(options.include_paths.iter().cloned())
    .collect();

  let invocations: Vec<CompileInvocation> = files
    .iter()
    .map(|file| CompileInvocation::new(file, includes.iter().cloned(), &options.output_dir))
    .collect();

  let mut report = GenerateReport {
    package: options.package.clone(),
    discovered: invocations.len(),
    ..Default::default()
  };

  if options.jobs <= 1 {
    for invocation in invocations {
      let result = compiler.compile(&invocation).await;
      settle(&mut report, invocation, result, options.strict)?;
    }
  } else {
    for (invocation, result) in compile_concurrently(compiler, invocations, options.jobs).await? {
      settle(&mut report, invocation, result, options.strict)?;
    }
  }

  info!(
    compiled = report.compiled.len(),
    skipped = report.skipped.len(),
    "definition compilation complete"
  );

  Ok(report)
}

/// Run all invocations with at most `jobs` in flight; results come back in
/// discovery order so strict-mode reporting does not depend on timing.
///
/// More permits than invocations are never needed, so `jobs` is capped there.
async fn compile_concurrently<C>(
  compiler: Arc<C>,
  invocations: Vec<CompileInvocation>,
  jobs: usize,
) -> Result<Vec<(CompileInvocation, Result<(), CompileInvocationError>)>, CompileError>
where
  C: DefinitionCompiler + 'static,
{
  let permits = jobs.min(invocations.len()).max(1);
  let semaphore = Arc::new(Semaphore::new(permits));
  let mut join_set = JoinSet::new();

  for (index, invocation) in invocations.into_iter().enumerate() {
    let compiler = Arc::clone(&compiler);
    let semaphore = Arc::clone(&semaphore);

    join_set.spawn(async move {
      let _permit = semaphore.acquire_owned().await.ok();
      let result = compiler.compile(&invocation).await;
      (index, invocation, result)
    });
  }

  let mut results = Vec::with_capacity(join_set.len());
  while let Some(joined) = join_set.join_next().await {
    results.push(joined?);
  }

  results.sort_by_key(|(index, _, _)| *index);
  Ok(
    results
      .into_iter()
      .map(|(_, invocation, result)| (invocation, result))
      .collect(),
  )
}

/// Apply the strictness policy to one invocation result.
fn settle(
  report: &mut GenerateReport,
  invocation: CompileInvocation,
  result: Result<(), CompileInvocationError>,
  strict: bool,
) -> Result<(), CompileError> {
  match result {
    Ok(()) => {
      debug!(path = %invocation.input.display(), "compiled definition");
      report.compiled.push(invocation.input);
      Ok(())
    }
    Err(e @ CompileInvocationError::Launch { .. }) => Err(e.into()),
    Err(e) if strict => {
      error!(path = %invocation.input.display(), error = %e, "definition failed to compile");
      Err(e.into())
    }
    Err(e) => {
      warn!(path = %invocation.input.display(), error = %e, "definition failed to compile, skipping");
      report.skipped.push(SkippedDefinition {
        input: invocation.input,
        command: e.command().to_vec(),
        reason: e.to_string(),
      });
      Ok(())
    }
  }
}
