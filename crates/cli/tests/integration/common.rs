//! Shared test helpers for CLI integration tests.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Stands in for `python`: answers the include-path probe, and for
/// `-m grpc_tools.protoc` writes one file per output flag, mirroring the
/// definition's path under the first `--proto_path`. Definitions whose file
/// name starts with `bad` fail. Every compiler command line is appended to
/// the log file.
const FAKE_PYTHON: &str = r##"
if [ "$1" = "-c" ]; then
  echo '{"bundled": ["@BUNDLED@"], "library": null}'
  exit 0
fi
shift 2
echo "$@" >> "@LOG@"
root=""
for arg in "$@"; do
  case "$arg" in
    --proto_path=*) if [ -z "$root" ]; then root="${arg#--proto_path=}"; fi ;;
    --python_out=*) py="${arg#--python_out=}" ;;
    --grpc_python_out=*) grpc="${arg#--grpc_python_out=}" ;;
    --mypy_out=*) mypy="${arg#--mypy_out=}" ;;
    *) input="$arg" ;;
  esac
done
case "$(basename "$input")" in
  bad*) echo "$input:1:1: Expected top-level statement" >&2; exit 1 ;;
esac
rel="${input#$root/}"
dir="$(dirname "$rel")"
stem="$(basename "$rel" .proto)"
mkdir -p "$py/$dir" "$grpc/$dir" "$mypy/$dir"
echo "# generated from $rel" > "$py/$dir/${stem}_pb2.py"
echo "# generated from $rel" > "$grpc/$dir/${stem}_pb2_grpc.py"
echo "# generated from $rel" > "$mypy/$dir/${stem}_pb2.pyi"
"##;

/// Isolated project with a fake interpreter.
///
/// The project root lives in its own sub-directory so that the interpreter,
/// its log and the bundled include directory stay outside of it.
pub struct TestEnv {
  pub temp: TempDir,
  pub root: PathBuf,
  pub python: PathBuf,
  pub bundled: PathBuf,
  log: PathBuf,
}

impl TestEnv {
  pub fn new() -> Self {
    let temp = TempDir::new().unwrap();
    let base = dunce::canonicalize(temp.path()).unwrap();
    let root = base.join("project");
    let bundled = base.join("site/grpc_tools/_proto");
    let log = base.join("protoc.log");
    std::fs::create_dir_all(&root).unwrap();
    std::fs::create_dir_all(&bundled).unwrap();

    let script = FAKE_PYTHON
      .replace("@BUNDLED@", &bundled.to_string_lossy())
      .replace("@LOG@", &log.to_string_lossy());
    let python = write_script(&base.join("python"), &script);

    Self {
      temp,
      root,
      python,
      bundled,
      log,
    }
  }

  /// The th2-sense layout: metadata, readme and two definitions.
  pub fn sense_project() -> Self {
    let env = Self::new();
    env.write(
      "package_info.json",
      r#"{"package_name": "th2-sense", "package_version": "1.2.3", "python_requires": ">=3.7"}"#,
    );
    env.write("README.md", "# th2-sense\n");
    env.write("src/main/proto/th2_sense/sense.proto", "syntax = \"proto3\";\n");
    env.write("src/main/proto/th2_sense/rules/rule.proto", "syntax = \"proto3\";\n");
    std::fs::create_dir_all(env.root.join("src/gen/main/services/python/th2_sense")).unwrap();
    env
  }

  /// Write a file relative to the project root.
  pub fn write(&self, relative_path: &str, content: &str) {
    let path = self.root.join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
  }

  pub fn path(&self, relative_path: &str) -> PathBuf {
    self.root.join(relative_path)
  }

  /// Command for the protopack binary, rooted at the project, using the fake
  /// interpreter.
  pub fn protopack_cmd(&self) -> Command {
    let mut cmd = cargo_bin_cmd!("protopack");
    cmd
      .arg("-C")
      .arg(&self.root)
      .env("PROTOPACK_PYTHON", &self.python)
      .env_remove("RUST_LOG");
    cmd
  }

  /// Compiler command lines seen so far, one per invocation.
  pub fn invocations(&self) -> Vec<String> {
    std::fs::read_to_string(&self.log)
      .unwrap_or_default()
      .lines()
      .map(str::to_string)
      .collect()
  }
}

fn write_script(path: &Path, body: &str) -> PathBuf {
  use std::io::Write;
  use std::os::unix::fs::PermissionsExt;

  // Closed before anything executes it.
  {
    let mut file = std::fs::File::create(path).unwrap();
    writeln!(file, "#!/bin/sh{}", body).unwrap();
    file.sync_all().unwrap();
  }
  std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
  path.to_path_buf()
}
