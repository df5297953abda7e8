//! Error types for WireGuard configuration handling.

use thiserror::Error;

/// Errors produced by the configuration codec and the peer mutators.
#[derive(Debug, Error)]
pub enum WireGuardError {
    /// The configuration text is malformed.
    #[error("{why}: {offender:?}")]
    Parse {
        /// What went wrong.
        why: String,
        /// The fragment of input that triggered the error.
        offender: String,
    },

    /// A peer must carry a name before it can be registered.
    #[error("peer must have a name")]
    PeerNameRequired,

    /// A peer with this name is already registered.
    #[error("peer {0:?} is already registered")]
    DuplicatePeer(String),

    /// No peer with this name exists.
    #[error("peer not found: {0}")]
    PeerNotFound(String),
}

impl WireGuardError {
    /// Builds a parse error from a reason and the offending input.
    pub fn parse(why: impl Into<String>, offender: impl Into<String>) -> Self {
        Self::Parse {
            why: why.into(),
            offender: offender.into(),
        }
    }
}

/// Result type alias for WireGuard operations.
pub type Result<T> = std::result::Result<T, WireGuardError>;
