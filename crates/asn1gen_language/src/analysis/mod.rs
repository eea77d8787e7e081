//! Analyses over the semantic model.
//!
//! [`dependencies`] orders a module's assignments for emission: strongly
//! connected components of the local reference graph, leaves first.

pub mod dependencies;

pub use dependencies::{dependency_sort, is_recursion_cluster};
