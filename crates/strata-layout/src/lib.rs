//! Dimension chains, traversal, and arena cloning of nested data shapes.
//!
//! A shape is described by a modifier string such as `"A2VO"` (an array
//! of two vectors of leaf elements) and a leaf [`TypeDescriptor`]. Parsing
//! yields a [`Variable`]: a chain of [`Dimension`] layers, outermost
//! first, ending in the leaf.
//!
//! # Architecture
//!
//! ```text
//!   modifier string ──parse──▶ Variable ──root()──▶ Layer cursor
//!                                 │                    │
//!                                 │        update_pointer_and_size
//!                                 │        init_stack / resize
//!                                 ▼                    ▼
//!                          VariableCloner ──▶ PageArena (flattened copy)
//!                          footprint::measure, copy::copy_to
//! ```
//!
//! Traversal works on raw memory laid out by some other party, so the
//! entry points that read it are `unsafe fn`s with documented contracts.
//! Header encoding, parsing, sizing, and type naming are safe.
//!
//! [`TypeDescriptor`]: strata_core::TypeDescriptor

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod cloner;
pub mod copy;
pub mod dimension;
pub mod footprint;
pub mod header;
pub mod modifier;
pub mod raw;
pub mod redirect;
pub mod type_name;
pub mod variable;

pub use cloner::VariableCloner;
pub use copy::{ByteCopy, ConversionOp, ResizePolicy};
pub use dimension::{Dimension, DimensionKind, Extent, Layer, LayerFlags};
pub use footprint::Footprint;
pub use header::{MatrixHeader, VectorHeader, MATRIX_HEADER_SIZE, VECTOR_HEADER_SIZE};
pub use raw::POINTER_SIZE;
pub use redirect::redirect_p;
pub use variable::Variable;
