//! Unified error handling for the sentier-map library.
//!
//! Every public operation returns [`Result`]; collaborator failures are caught
//! at the call site and converted to a logged diagnostic plus a defined
//! fallback state, never a panic.

use thiserror::Error;

/// Unified error type for sentier-map operations.
#[derive(Debug, Clone, Error)]
pub enum SentierMapError {
    /// Mutation attempted without edit rights. Rejected locally, never sent
    /// to the network.
    #[error("operation '{operation}' not permitted for the current viewer")]
    NotPermitted { operation: &'static str },

    /// Index outside the current coordinate list.
    #[error("waypoint index {index} out of range (path has {len} points)")]
    IndexOutOfRange { index: usize, len: usize },

    /// The session has no trail loaded.
    #[error("no trail loaded in the edit session")]
    NoTrail,

    /// The trail has no occurrence with the given id.
    #[error("occurrence {occurrence_id} not found on trail {trail_id}")]
    OccurrenceNotFound { trail_id: i64, occurrence_id: i64 },

    /// Trail/occurrence service call failed. The message carries the
    /// backend's structured `error` field when one was present.
    #[error("service error{}: {message}", .status.map(|s| format!(" ({s})")).unwrap_or_default())]
    Service {
        message: String,
        status: Option<u16>,
    },

    /// Platform geolocation failed (denied, timed out or unavailable).
    #[error("geolocation failed: {message}")]
    Geolocation { message: String },
}

/// Result type alias for sentier-map operations.
pub type Result<T> = std::result::Result<T, SentierMapError>;

impl SentierMapError {
    /// Generic service failure with no HTTP status (network down, bad DNS).
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::Service {
            message: message.into(),
            status: None,
        }
    }
}
