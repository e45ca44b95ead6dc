//! Error handling module for server-bootstrap
//!
//! Provides centralized error handling with proper error types using thiserror.
//! All errors in the application should use these types for consistency.

use thiserror::Error;

/// Main error type for server-bootstrap
#[derive(Error, Debug)]
pub enum BootstrapError {
    /// Insufficient privilege for a system-mutating operation
    #[error("Permission error: {0}")]
    Permission(String),

    /// Validation errors (user input, account names)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Target account already exists and must not be silently reused
    #[error("Account already exists: {0}")]
    AccountExists(String),

    /// Public-key fetch failures (network error, non-success response, empty key set)
    #[error("Key fetch failed: {0}")]
    KeyFetch(String),

    /// Configuration backup could not be created or verified
    #[error("Backup error: {0}")]
    Backup(String),

    /// IO errors (file operations, permissions)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// System errors (external commands, processes)
    #[error("System error: {0}")]
    System(String),
}

/// Result type alias for provisioning operations
pub type Result<T> = std::result::Result<T, BootstrapError>;

// Convenient error constructors
impl BootstrapError {
    /// Create a permission error
    pub fn permission(msg: impl Into<String>) -> Self {
        Self::Permission(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a key-fetch error
    pub fn key_fetch(msg: impl Into<String>) -> Self {
        Self::KeyFetch(msg.into())
    }

    /// Create a backup error
    pub fn backup(msg: impl Into<String>) -> Self {
        Self::Backup(msg.into())
    }

    /// Create a system error
    pub fn system(msg: impl Into<String>) -> Self {
        Self::System(msg.into())
    }

    /// True for failures that indicate the process should not keep running.
    ///
    /// Privilege, pre-existing-account, and backup failures mean the host is
    /// in a state the operator did not intend; the menu loop terminates
    /// rather than offering further mutations.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Permission(_) | Self::AccountExists(_) | Self::Backup(_)
        )
    }
}
