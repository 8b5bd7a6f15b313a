//! Page-arena and heap allocators for the Strata layout engine.
//!
//! Provides the two allocation collaborators the layout engine consumes:
//! a bump-allocated [`PageArena`] that flattened clones are written into,
//! and a [`Heap`] for individually owned blocks created by resizing.
//!
//! # Architecture
//!
//! ```text
//! PageArena (reservation front end)
//! └── PageList → Page[] (64KB bump-allocated, zeroed, never moved)
//!     └── RawBlock (aligned global-allocator block)
//! SystemHeap: Heap (size-prefixed global-allocator blocks)
//! ```
//!
//! All `unsafe` code lives in `raw.rs`, plus the unsafe `Heap::free`
//! contract in `heap.rs`.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod heap;
pub mod page;
pub mod page_arena;
mod raw;

// Public re-exports for the primary API surface.
pub use config::ArenaConfig;
pub use error::ArenaError;
pub use heap::{Heap, SystemHeap};
pub use page_arena::PageArena;
