//! protopack-lib: build pipeline for protobuf-based Python packages.
//!
//! The pipeline has two independent stages:
//! - `compile`: runs the external definition compiler once per `.proto` file
//!   and reports failures according to a strictness policy
//! - `assemble`: overlays hand-written and generated trees into a staging
//!   package, injects marker files, computes the package manifest and hands it
//!   to a `Packager`, always removing the staging tree afterwards
//!
//! Both stages take an explicit `PackageMetadata` and `ProjectLayout`; nothing
//! is read from process-wide state after startup.

pub mod assemble;
pub mod compile;
pub mod consts;
pub mod layout;
pub mod metadata;
pub mod util;
