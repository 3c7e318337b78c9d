//! Error types for graph-recon.
//!
//! All errors are strongly typed using thiserror so the orchestrator can
//! pattern match on specific failure conditions. Nodes that simply lack the
//! attributes a resolver needs are never errors: resolvers report them as
//! `false` / `None`.

use thiserror::Error;

/// Validation errors raised while checking configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Chunk size must be positive")]
    ZeroChunkSize,

    #[error("Reconciliation endpoint cannot be empty")]
    EmptyEndpoint,

    #[error("Request timeout must be positive")]
    ZeroTimeout,

    #[error("At least one external id property is required")]
    NoIdProperties,

    #[error("Invalid value for '{field}': {reason}")]
    InvalidField {
        field: String,
        reason: String,
    },
}

/// Transport errors for calls to the reconciliation service.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Connection failed: {message}")]
    ConnectionFailed {
        message: String,
    },

    #[error("Request timed out after {duration_ms}ms")]
    Timeout {
        duration_ms: u64,
    },

    #[error("Failed to serialize request: {message}")]
    SerializationFailed {
        message: String,
    },

    #[error("Failed to deserialize response: {message}")]
    DeserializationFailed {
        message: String,
    },

    #[error("Server error (code {code}): {message}")]
    ServerError {
        code: u16,
        message: String,
    },
}

/// Top-level error type for graph-recon.
#[derive(Debug, Error)]
pub enum ReconError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Internal error: {message}")]
    Internal {
        message: String,
    },
}

impl ReconError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is a transport error.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Returns true if this is an internal error.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal { .. })
    }

    /// Returns true if the failed pass may succeed when the orchestrator retries it.
    ///
    /// Nothing in this crate retries; this is a hint for the caller.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Validation(_) | Self::Internal { .. } => false,
            Self::Transport(e) => match e {
                TransportError::ConnectionFailed { .. } | TransportError::Timeout { .. } => true,
                TransportError::ServerError { code, .. } => *code >= 500,
                TransportError::SerializationFailed { .. }
                | TransportError::DeserializationFailed { .. } => false,
            },
        }
    }
}

/// Result type alias for graph-recon operations.
pub type ReconResult<T> = Result<T, ReconError>;
