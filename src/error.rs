//! Error types for the wizard engine.
//!
//! All errors are strongly typed using thiserror. Field validation
//! failures are *not* errors: they are `ErrorCode` values stored in the
//! form state. The types here cover structural misuse (bad paths),
//! persistence failures, configuration mistakes and the submission
//! boundary.

use thiserror::Error;

/// Structural errors raised by the path accessor.
///
/// The store treats these as no-ops; they are only surfaced to callers
/// that use the path layer directly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("Malformed field path '{path}'")]
    Malformed {
        path: String,
    },

    #[error("Unknown segment '{segment}' in field path '{path}'")]
    UnknownSegment {
        path: String,
        segment: String,
    },

    #[error("Segment '{segment}' in field path '{path}' is not an object")]
    NotAnObject {
        path: String,
        segment: String,
    },

    #[error("Field path '{path}' does not name a field")]
    NotAField {
        path: String,
    },

    #[error("Field '{path}' expects a {expected} value")]
    TypeMismatch {
        path: String,
        expected: &'static str,
    },
}

/// Errors from snapshot persistence.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("Snapshot storage error: {message}")]
    Storage {
        message: String,
    },

    #[error("Snapshot serialization error: {message}")]
    Serialization {
        message: String,
    },

    #[error("Snapshot schema version '{found}' is not compatible with '{expected}'")]
    IncompatibleVersion {
        found: String,
        expected: &'static str,
    },

    #[error("Snapshot is corrupt: {message}")]
    Corrupt {
        message: String,
    },
}

impl PersistError {
    /// Creates a storage error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Returns true if restoring should fall back to the initial state.
    #[must_use]
    pub const fn is_recoverable_by_reset(&self) -> bool {
        matches!(
            self,
            Self::IncompatibleVersion { .. } | Self::Corrupt { .. } | Self::Serialization { .. }
        )
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{field} must be at least {min} (got {actual})")]
    BelowMinimum {
        field: &'static str,
        min: u64,
        actual: u64,
    },

    #[error("{field} cannot be empty")]
    Empty {
        field: &'static str,
    },
}

/// Errors raised while building the submission payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    #[error("File field '{field}' has not been uploaded yet")]
    UnresolvedFile {
        field: String,
    },

    #[error("Required field '{field}' is missing")]
    MissingField {
        field: String,
    },
}

/// Top-level error type for the wizard engine.
#[derive(Debug, Error)]
pub enum WizardError {
    #[error("Path error: {0}")]
    Path(#[from] PathError),

    #[error("Persistence error: {0}")]
    Persist(#[from] PersistError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Payload error: {0}")]
    Payload(#[from] PayloadError),
}

impl WizardError {
    /// Returns true if this is a path error.
    #[must_use]
    pub const fn is_path(&self) -> bool {
        matches!(self, Self::Path(_))
    }

    /// Returns true if this is a persistence error.
    #[must_use]
    pub const fn is_persist(&self) -> bool {
        matches!(self, Self::Persist(_))
    }

    /// Returns true if this is a configuration error.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Returns true if this is a payload error.
    #[must_use]
    pub const fn is_payload(&self) -> bool {
        matches!(self, Self::Payload(_))
    }
}

/// Result type alias for wizard operations.
pub type WizardResult<T> = Result<T, WizardError>;
