//! Strata: a layout engine for nested, pointer-linked data shapes.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all Strata sub-crates.
//!
//! # Quick start
//!
//! ```rust
//! use strata::prelude::*;
//!
//! // An inline array of three int32.
//! let shape = Variable::new("A3O", TypeDescriptor::int32()).unwrap();
//! let source: [i32; 3] = [1, 2, 3];
//!
//! let mut arena = PageArena::with_defaults().unwrap();
//! let mut cloner = VariableCloner::new(&shape, &mut arena);
//! // SAFETY: `source` is one instance of the shape.
//! let copy = unsafe { cloner.clone_from(source.as_ptr().cast()) }.unwrap();
//! assert_eq!(cloner.output_modifiers(), "A3");
//!
//! // SAFETY: the clone holds three int32.
//! let values = unsafe { std::slice::from_raw_parts(copy.as_ptr().cast::<i32>(), 3) };
//! assert_eq!(values, &[1, 2, 3]);
//! assert_eq!(shape.type_name().unwrap(), "int32[3]");
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `strata-core` | `DimensionSize`, `TypeDescriptor`, `LayoutError` |
//! | [`arena`] | `strata-arena` | `PageArena`, `Heap`, `ArenaConfig` |
//! | [`layout`] | `strata-layout` | `Variable`, `Layer`, `VariableCloner`, headers |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Saturating sizes, leaf types, and errors (`strata-core`).
pub use strata_core as types;

/// Page arena and heap allocators (`strata-arena`).
///
/// [`arena::PageArena`] receives clones; [`arena::Heap`] backs resizes.
pub use strata_arena as arena;

/// Dimension chains, traversal, and cloning (`strata-layout`).
pub use strata_layout as layout;

/// Common imports for typical Strata usage.
pub mod prelude {
    // Core types
    pub use strata_core::{DimensionSize, ErrorKind, LayoutError, TypeDescriptor, TypeKind};

    // Allocators
    pub use strata_arena::{ArenaConfig, Heap, PageArena, SystemHeap};

    // Layout
    pub use strata_layout::{
        ByteCopy, Dimension, DimensionKind, Footprint, Layer, MatrixHeader, ResizePolicy,
        Variable, VariableCloner, VectorHeader,
    };
}
