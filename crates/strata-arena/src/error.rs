//! Arena-specific error types.

use std::error::Error;
use std::fmt;

use strata_core::LayoutError;

/// Errors that can occur during arena and heap operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArenaError {
    /// The page list is full and no more pages can be allocated.
    CapacityExceeded {
        /// Number of bytes requested.
        requested: usize,
        /// Total bytes held by the existing pages.
        capacity: usize,
    },
    /// The system allocator refused a page or heap block.
    AllocationFailed {
        /// Number of bytes requested.
        requested: usize,
    },
    /// An [`ArenaConfig`](crate::ArenaConfig) failed validation.
    InvalidConfig {
        /// Which invariant was violated.
        reason: String,
    },
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapacityExceeded {
                requested,
                capacity,
            } => {
                write!(
                    f,
                    "arena capacity exceeded: requested {requested} bytes, capacity {capacity} bytes"
                )
            }
            Self::AllocationFailed { requested } => {
                write!(f, "allocation of {requested} bytes failed")
            }
            Self::InvalidConfig { reason } => write!(f, "invalid arena config: {reason}"),
        }
    }
}

impl Error for ArenaError {}

impl From<ArenaError> for LayoutError {
    fn from(err: ArenaError) -> Self {
        match err {
            ArenaError::CapacityExceeded { requested, .. }
            | ArenaError::AllocationFailed { requested } => LayoutError::OutOfMemory { requested },
            ArenaError::InvalidConfig { reason } => LayoutError::Parameters { reason },
        }
    }
}
