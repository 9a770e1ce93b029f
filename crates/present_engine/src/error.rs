//! Error taxonomy for the presentation engine
//!
//! Only [`PresentError::OutOfDateFrame`] is transient; the frame driver absorbs it
//! with a single chain recreation. Everything else is fatal and unwinds through
//! the RAII teardown of the engine's resources.

use thiserror::Error;

/// Presentation engine errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PresentError {
    /// Surface capabilities or formats could not be enumerated
    #[error("Presentation unavailable: {0}")]
    PresentationUnavailable(String),

    /// The surface was invalidated at runtime
    #[error("Surface lost")]
    SurfaceLost,

    /// The swap buffer chain no longer matches the surface
    #[error("Swap buffer chain out of date")]
    OutOfDateFrame,

    /// A GPU object could not be created
    #[error("Allocation failed: {what}")]
    AllocationFailure {
        /// The kind of object that failed to allocate
        what: String,
    },

    /// The logical device was lost
    #[error("Device lost")]
    DeviceLost,

    /// Invalid operation attempted
    #[error("Invalid operation: {reason}")]
    InvalidOperation {
        /// Description of why the operation is invalid
        reason: String,
    },

    /// Any other backend failure
    #[error("{operation} failed: {code}")]
    Backend {
        /// The backend call that failed
        operation: &'static str,
        /// Backend specific result code
        code: String,
    },
}

impl PresentError {
    /// Shorthand for [`PresentError::InvalidOperation`]
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidOperation { reason: reason.into() }
    }

    /// Shorthand for [`PresentError::AllocationFailure`]
    pub fn allocation(what: impl Into<String>) -> Self {
        Self::AllocationFailure { what: what.into() }
    }

    /// Whether the frame driver may recover from this error by recreating the chain
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::OutOfDateFrame)
    }
}

/// Result type for presentation operations
pub type PresentResult<T> = Result<T, PresentError>;
