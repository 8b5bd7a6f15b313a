//! Error types for the Strata layout engine.
//!
//! Every fallible operation in the workspace returns a [`LayoutError`].
//! Callers propagate the first failure immediately, optionally wrapping it
//! with [`LayoutError::context`]; nothing in the engine retries.

use std::error::Error;
use std::fmt;

/// Coarse classification of a [`LayoutError`], with context stripped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A caller supplied an invalid argument.
    Parameters,
    /// A saturating size could not be converted to a concrete number.
    Overflow,
    /// An arena or heap reservation failed.
    OutOfMemory,
    /// The shape is valid but the requested behaviour is not implemented.
    UnsupportedFeature,
    /// A dimension chain or header violates a structural invariant.
    InternalSetup,
    /// An unrecognised or unmapped layer code.
    Fatal,
    /// Pointer redirection found an illegal pointer.
    BadPointer,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Parameters => "parameters error",
            Self::Overflow => "overflow",
            Self::OutOfMemory => "out of memory",
            Self::UnsupportedFeature => "unsupported feature",
            Self::InternalSetup => "internal setup error",
            Self::Fatal => "fatal error",
            Self::BadPointer => "bad pointer",
        };
        f.write_str(name)
    }
}

/// Errors produced while parsing, measuring, traversing, or cloning
/// nested data shapes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LayoutError {
    /// An argument was rejected before any memory was touched.
    Parameters {
        /// Human-readable description of the rejected argument.
        reason: String,
    },
    /// A [`DimensionSize`](crate::DimensionSize) was indefinite or did not
    /// fit the requested integer type.
    Overflow {
        /// The quantity that overflowed (e.g. `"leaf storage"`).
        what: &'static str,
    },
    /// The arena or heap could not provide the requested bytes.
    OutOfMemory {
        /// Number of bytes requested.
        requested: usize,
    },
    /// The operation is not available for this layer or leaf type.
    UnsupportedFeature {
        /// Description of the missing capability.
        reason: String,
    },
    /// The dimension chain or a runtime header is inconsistent.
    InternalSetup {
        /// Description of the violated invariant.
        reason: String,
    },
    /// A layer code that the engine cannot map.
    Fatal {
        /// Description of the offending code.
        reason: String,
    },
    /// Redirection read a NULL pointer where NULL is not permitted.
    BadPointer {
        /// Value of the pointer that was read.
        pointer: usize,
        /// Address the pointer was read from.
        location: usize,
    },
    /// A lower-level error annotated by the layer that propagated it.
    Context {
        /// What the propagating layer was doing.
        context: String,
        /// The underlying failure.
        source: Box<LayoutError>,
    },
}

impl LayoutError {
    /// Shorthand for [`LayoutError::Parameters`].
    pub fn parameters(reason: impl Into<String>) -> Self {
        Self::Parameters {
            reason: reason.into(),
        }
    }

    /// Shorthand for [`LayoutError::UnsupportedFeature`].
    pub fn unsupported(reason: impl Into<String>) -> Self {
        Self::UnsupportedFeature {
            reason: reason.into(),
        }
    }

    /// Shorthand for [`LayoutError::InternalSetup`].
    pub fn internal_setup(reason: impl Into<String>) -> Self {
        Self::InternalSetup {
            reason: reason.into(),
        }
    }

    /// Shorthand for [`LayoutError::Fatal`].
    pub fn fatal(reason: impl Into<String>) -> Self {
        Self::Fatal {
            reason: reason.into(),
        }
    }

    /// Wrap this error with a description of the operation that failed.
    pub fn context(self, context: impl Into<String>) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The classification of the innermost error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Parameters { .. } => ErrorKind::Parameters,
            Self::Overflow { .. } => ErrorKind::Overflow,
            Self::OutOfMemory { .. } => ErrorKind::OutOfMemory,
            Self::UnsupportedFeature { .. } => ErrorKind::UnsupportedFeature,
            Self::InternalSetup { .. } => ErrorKind::InternalSetup,
            Self::Fatal { .. } => ErrorKind::Fatal,
            Self::BadPointer { .. } => ErrorKind::BadPointer,
            Self::Context { source, .. } => source.kind(),
        }
    }

    /// The innermost error, with every context layer removed.
    pub fn root_cause(&self) -> &LayoutError {
        match self {
            Self::Context { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parameters { reason } => write!(f, "parameters error: {reason}"),
            Self::Overflow { what } => write!(f, "overflow computing {what}"),
            Self::OutOfMemory { requested } => {
                write!(f, "out of memory: requested {requested} bytes")
            }
            Self::UnsupportedFeature { reason } => write!(f, "unsupported feature: {reason}"),
            Self::InternalSetup { reason } => write!(f, "internal setup error: {reason}"),
            Self::Fatal { reason } => write!(f, "fatal error: {reason}"),
            Self::BadPointer { pointer, location } => {
                write!(f, "bad pointer ({pointer:#x}) at ({location:#x})")
            }
            Self::Context { context, source } => write!(f, "{context}: {source}"),
        }
    }
}

impl Error for LayoutError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Context { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}
