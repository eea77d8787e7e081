//! # asn1gen-base
//!
//! Structural atoms for the asn1gen pipeline.
//!
//! This crate provides the foundational source-location types used
//! throughout asn1gen:
//!
//! - [`Span`] — byte-offset source ranges
//! - [`Position`] — line/column translation for diagnostics
//!
//! It has no knowledge of ASN.1 or of I/O; higher-level crates build their
//! stage-specific error types on top of these.

pub mod span;

pub use span::{Position, Span};
