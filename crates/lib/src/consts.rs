/// File-name suffix of interface-definition files.
pub const DEFINITION_SUFFIX: &str = ".proto";

/// Marker that turns a directory into an importable package.
pub const INIT_MARKER: &str = "__init__.py";

/// PEP 561 marker for packages shipping inline types or stubs.
pub const TYPED_MARKER: &str = "py.typed";

/// Default name of the metadata record at the project root.
pub const METADATA_FILENAME: &str = "package_info.json";

/// Data-file patterns attached to every non-root package.
pub const PACKAGE_DATA_PATTERNS: [&str; 3] = ["*.proto", TYPED_MARKER, "*.pyi"];

/// Archive entry mtime: 1980-01-01T00:00:00Z (ZIP epoch).
pub const SOURCE_DATE_EPOCH: u64 = 315532800;

/// Environment variable selecting the Python interpreter.
pub const PYTHON_ENV: &str = "PROTOPACK_PYTHON";

pub const DEFAULT_PYTHON: &str = "python3";
