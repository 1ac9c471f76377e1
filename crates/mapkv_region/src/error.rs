//! Error types for region operations.

use crate::region::RegionState;
use std::io;
use thiserror::Error;

/// Result type for region operations.
pub type RegionResult<T> = Result<T, RegionError>;

/// Errors that can occur while managing a mapped region.
#[derive(Debug, Error)]
pub enum RegionError {
    /// An I/O error occurred while opening, resizing, mapping or flushing.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The platform refused to reserve an anonymous shared-memory region.
    ///
    /// Unlike [`RegionError::Io`] no filesystem path is involved; callers
    /// usually fall back to a file-backed region.
    #[error("anonymous region '{name}' of {size} bytes refused: {source}")]
    ResourceExhausted {
        /// Name requested for the region.
        name: String,
        /// Size requested for the region.
        size: usize,
        /// The OS error that caused the refusal.
        #[source]
        source: io::Error,
    },

    /// The operation is not permitted in the region's current state.
    #[error("cannot {operation} a region that is {state}")]
    InvalidState {
        /// The attempted operation.
        operation: &'static str,
        /// The state the region was in.
        state: RegionState,
    },

    /// The mapping could not be re-established for an access.
    #[error("region memory unavailable: {reason}")]
    Unavailable {
        /// Why the memory is unavailable.
        reason: String,
    },

    /// The requested size cannot be addressed on this platform.
    #[error("size {requested} exceeds the addressable range")]
    InvalidSize {
        /// The size that was requested.
        requested: u64,
    },
}

impl RegionError {
    /// Creates an invalid state error.
    pub fn invalid_state(operation: &'static str, state: RegionState) -> Self {
        Self::InvalidState { operation, state }
    }

    /// Creates an unavailable error.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_state_message() {
        let err = RegionError::invalid_state("grow", RegionState::Closed);
        assert_eq!(err.to_string(), "cannot grow a region that is closed");
    }

    #[test]
    fn io_conversion() {
        let err: RegionError = io::Error::new(io::ErrorKind::PermissionDenied, "denied").into();
        assert!(matches!(err, RegionError::Io(_)));
    }
}
