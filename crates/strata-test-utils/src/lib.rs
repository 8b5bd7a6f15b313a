//! Test utilities and memory fixtures for Strata development.
//!
//! [`Fixture`] lays out source memory for traversal and cloning tests:
//! scalar runs, vector and matrix headers, pointer tables, and C strings,
//! all kept alive for as long as the fixture is.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

pub use fixtures::Fixture;

use strata_core::TypeDescriptor;
use strata_layout::Variable;

/// Parse a variable, panicking on bad test input.
pub fn variable(modifiers: &str, td: TypeDescriptor) -> Variable {
    Variable::new(modifiers, td)
        .unwrap_or_else(|e| panic!("bad test modifiers {modifiers:?}: {e}"))
}
