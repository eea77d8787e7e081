//! # asn1gen-language
//!
//! The ASN.1 front end and middle end: a recursive-descent parser for the
//! supported X.680 subset, the semantic model it is lifted into, and the
//! dependency analysis that orders assignments for emission.
//!
//! The pipeline is a straight line of pure transformations:
//!
//! ```text
//! source text
//!     │  parser::parse_asn1
//!     ▼
//! tagged parse tree (parse_tree::ParseNode)
//!     │  sema::build_semantic_model
//!     ▼
//! semantic modules (sema::Module)
//!     │  analysis::dependency_sort
//!     ▼
//! reference-ordered components, consumed by a back end
//! ```
//!
//! No stage mutates the output of an earlier stage; each structure is built
//! once per invocation and read-only afterwards.
//!
//! # Example
//!
//! ```
//! use asn1gen_language::{analysis, parser, sema};
//!
//! let source = "M DEFINITIONS ::= BEGIN A ::= SEQUENCE { b B } B ::= INTEGER END";
//! let tree = parser::parse_asn1(source)?;
//! let modules = sema::build_semantic_model(&tree)?;
//! let components = analysis::dependency_sort(&modules[0]);
//!
//! // B is a leaf, so it is ordered ahead of A.
//! assert_eq!(components[0][0].name(), "B");
//! assert_eq!(components[1][0].name(), "A");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod analysis;
pub mod parse_tree;
pub mod parser;
pub mod sema;

pub use parse_tree::{ParseNode, TaggedToken, TokenKind};
pub use parser::{parse_asn1, ParseError};
pub use sema::{build_semantic_model, Module, SemaError};
