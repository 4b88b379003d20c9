//! Exit codes for CLI operations following Unix conventions.
//!
//! # Exit Code Semantics
//!
//! - `0`: Success (an empty query result is still a success)
//! - `1`: General error - unspecified failure
//! - `2`: Blocking error - the store is unusable until an operator acts
//! - `3-125`: Specific errors, grouped by whether retrying can help
//! - `126-255`: Reserved by shell

use crate::error::{ErrorCategory, StoreError};

/// Standard exit codes for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// Operation succeeded (code 0)
    Success = 0,

    /// Unspecified error occurred (code 1)
    GeneralError = 1,

    /// Critical error that should halt automation (code 2)
    BlockingError = 2,

    /// Malformed input; retrying the same call cannot succeed (code 4)
    InvalidInput = 4,

    /// Backend unavailable or timed out; safe to retry (code 5)
    Transient = 5,

    /// Configuration error (code 6)
    ConfigError = 6,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

impl ExitCode {
    /// Exit code for an error category.
    pub fn from_category(category: ErrorCategory) -> Self {
        match category {
            ErrorCategory::Input => ExitCode::InvalidInput,
            ErrorCategory::Transient => ExitCode::Transient,
            ErrorCategory::Configuration => ExitCode::ConfigError,
        }
    }

    /// Exit code for a store error. Corruption blocks automation.
    pub fn from_store_error(error: &StoreError) -> Self {
        match error {
            StoreError::Corrupted { .. } => ExitCode::BlockingError,
            other => Self::from_category(other.category()),
        }
    }

    /// Check if this exit code indicates a blocking error.
    #[must_use]
    pub fn is_blocking(&self) -> bool {
        matches!(self, ExitCode::BlockingError)
    }

    /// Check if this exit code indicates success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, ExitCode::Success)
    }

    /// Check if the failed command may succeed when run again.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, ExitCode::Transient)
    }

    /// Get a human-readable description of the exit code.
    pub fn description(&self) -> &str {
        match self {
            ExitCode::Success => "Success",
            ExitCode::GeneralError => "General error",
            ExitCode::BlockingError => "Blocking error - automation should halt",
            ExitCode::InvalidInput => "Invalid input",
            ExitCode::Transient => "Transient failure - retry later",
            ExitCode::ConfigError => "Configuration error",
        }
    }
}
