//! # asn1gen-compile
//!
//! Code-generation back ends for asn1gen. A back end is a visitor over a
//! semantic module and its dependency-sorted assignment components; each
//! component is emitted in two passes, declarations before definitions, so
//! mutually recursive types resolve without forward-declaration hacks in
//! the target language.
//!
//! Two reference back ends are provided:
//!
//! - [`codegen::pyasn1::Pyasn1Backend`] — Python classes for the pyasn1
//!   object runtime,
//! - [`codegen::quickder::QuickDerBackend`] — C headers with overlay
//!   structs and packed DER bytecode for Quick-DER.
//!
//! Both drive the indentation-aware [`writer::CodeWriter`] sink; any other
//! back end implementing [`codegen::Backend`] against the same traversal is
//! equally valid.

pub mod codegen;
pub mod keywords;
pub mod writer;

pub use codegen::pyasn1::Pyasn1Backend;
pub use codegen::quickder::QuickDerBackend;
pub use codegen::{banner, Backend, GenError};
pub use writer::{CodeWriter, Fragment};
