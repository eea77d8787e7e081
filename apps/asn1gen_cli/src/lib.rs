//! # asn1gen-cli
//!
//! Command-line driver for the asn1gen pipeline: read an ASN.1 definition
//! file, stop after the requested stage (`parse`, `sema` or `gen`), and
//! write generated code to stdout, a single file, or one file per module.
//!
//! The binary in `main.rs` is a thin wrapper; all command logic lives here
//! so the integration tests can drive it directly.

pub mod cli;
pub mod style;

pub use cli::{run, run_cli, BackendKind, Cli, Stage};
