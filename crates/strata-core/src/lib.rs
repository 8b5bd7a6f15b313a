//! Core types for the Strata layout engine.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the vocabulary shared by the arena and layout crates: the saturating
//! [`DimensionSize`], the leaf [`TypeDescriptor`], and the
//! [`LayoutError`] taxonomy.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod size;
pub mod types;

pub use error::{ErrorKind, LayoutError};
pub use size::DimensionSize;
pub use types::{TypeDescriptor, TypeKind};
