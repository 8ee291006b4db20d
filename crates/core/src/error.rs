// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Warden Project Contributors

//! The error taxonomy shared by every crate in the vault: a single enum
//! recognized by the scheduler's retry loop, with a [`VaultError::classify`]
//! method that tells the loop whether to back off and retry or to move the
//! task straight to a terminal folder.

use thiserror::Error;

/// How the persistence/retry loop should treat an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Worth another attempt after backoff.
    Retryable,
    /// No amount of retrying will help; surface as a terminal transition.
    Permanent,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VaultError {
    #[error("invalid transition: {from} -> {to} is not in the transition matrix")]
    InvalidTransition { from: String, to: String },

    #[error("filesystem operation failed: {message}")]
    FileSystemError { message: String },

    #[error("validation failed: {reason}")]
    ValidationError { reason: String },

    #[error("reasoning subprocess timed out after {elapsed_secs}s")]
    ReasoningTimeout { elapsed_secs: u64 },

    #[error("reasoning subprocess crashed: {detail}")]
    ReasoningCrashed { detail: String },

    #[error("approval invalid: {reason}")]
    ApprovalInvalid { reason: String },

    #[error("approval expired without a decision")]
    ApprovalTimeout,

    #[error("driver verification failed for '{driver}': {reason}")]
    VerificationError { driver: String, reason: String },

    #[error("rate limited: {driver}/{action_type}")]
    Throttled { driver: String, action_type: String },

    #[error("circuit open for driver '{driver}'")]
    CircuitOpen { driver: String },

    #[error("nonce already consumed for approval {approval_id}")]
    NonceReused { approval_id: String },

    #[error("driver '{driver}' reported failure: {message}")]
    DriverFailure {
        driver: String,
        message: String,
        retryable: bool,
    },

    #[error("credential backend unavailable: {reason}")]
    BackendUnavailable { reason: String },
}

impl VaultError {
    /// Classify this error for the persistence/retry loop.
    ///
    /// Mirrors the taxonomy: most errors are either always retryable or
    /// always permanent; `DriverFailure` carries its own classification
    /// because it depends on a configured exit-code signal.
    pub fn classify(&self) -> ErrorClass {
        match self {
            Self::InvalidTransition { .. } => ErrorClass::Permanent,
            Self::FileSystemError { .. } => ErrorClass::Permanent,
            Self::ValidationError { .. } => ErrorClass::Permanent,
            Self::ReasoningTimeout { .. } => ErrorClass::Retryable,
            Self::ReasoningCrashed { .. } => ErrorClass::Retryable,
            Self::ApprovalInvalid { .. } => ErrorClass::Permanent,
            Self::ApprovalTimeout => ErrorClass::Permanent,
            Self::VerificationError { .. } => ErrorClass::Permanent,
            Self::Throttled { .. } => ErrorClass::Retryable,
            Self::CircuitOpen { .. } => ErrorClass::Retryable,
            Self::NonceReused { .. } => ErrorClass::Permanent,
            Self::DriverFailure { retryable, .. } => {
                if *retryable {
                    ErrorClass::Retryable
                } else {
                    ErrorClass::Permanent
                }
            }
            Self::BackendUnavailable { .. } => ErrorClass::Permanent,
        }
    }

    /// Short machine-readable label used in `last_error` frontmatter and
    /// audit events, distinct from the human-readable `Display` message.
    pub fn label(&self) -> &'static str {
        match self {
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::FileSystemError { .. } => "filesystem_error",
            Self::ValidationError { .. } => "validation_error",
            Self::ReasoningTimeout { .. } => "reasoning_timeout",
            Self::ReasoningCrashed { .. } => "reasoning_crashed",
            Self::ApprovalInvalid { .. } => "approval_invalid",
            Self::ApprovalTimeout => "approval_timeout",
            Self::VerificationError { .. } => "verification_error",
            Self::Throttled { .. } => "throttled",
            Self::CircuitOpen { .. } => "circuit_open",
            Self::NonceReused { .. } => "nonce_reused",
            Self::DriverFailure { .. } => "driver_failure",
            Self::BackendUnavailable { .. } => "backend_unavailable",
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
