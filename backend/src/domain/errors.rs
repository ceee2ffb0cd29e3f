//! Domain error taxonomy.
//!
//! Validation failures surface to the caller as a message; storage and parse
//! problems are recovered transparently where a safe default exists, so only
//! the unrecoverable cases ever reach this enum.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    /// No group matches the supplied join code.
    #[error("Group not found: {0}")]
    GroupNotFound(String),

    /// A work log must cover at least one minute.
    #[error("Time must be greater than 0 minutes (got {0})")]
    InvalidMinutes(u32),

    /// Logging work requires either an existing task id or a new task name.
    #[error("Select a task or provide a new task name")]
    MissingTask,

    /// A persisted document exceeded the storage budget even after large
    /// binary fields were stripped.
    #[error("Storage quota exceeded while writing {document}")]
    StorageQuotaExceeded { document: String },

    /// A persisted document could not be parsed and no safe default applied.
    #[error("Failed to parse persisted {document}: {message}")]
    Parse { document: String, message: String },
}

impl DomainError {
    /// Whether this error is a user-input validation failure (mapped to a
    /// 4xx response) rather than an internal one.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            DomainError::GroupNotFound(_)
                | DomainError::InvalidMinutes(_)
                | DomainError::MissingTask
        )
    }
}
