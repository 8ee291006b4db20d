// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Warden Project Contributors

//! Guard-layer error type, composed into [`warden_core::VaultError`] at the
//! boundary where `ActionGuard` reports an outcome to the scheduler.

use thiserror::Error;
use warden_core::VaultError;

#[derive(Debug, Error)]
pub enum GuardError {
    #[error("keyring backend unavailable: {0}")]
    KeyringUnavailable(String),

    #[error("encrypted credential file is corrupt: {0}")]
    CredentialFileCorrupt(String),

    #[error("credential not found for {service}/{user}")]
    CredentialNotFound { service: String, user: String },

    #[error("no credential backend is usable")]
    BackendUnavailable,

    #[error("driver '{0}' is not registered in the trust registry")]
    UnknownDriver(String),

    #[error("driver '{driver}' failed verification: {reason}")]
    VerificationFailed { driver: String, reason: String },

    #[error("io error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<GuardError> for VaultError {
    fn from(err: GuardError) -> Self {
        match err {
            GuardError::KeyringUnavailable(reason) | GuardError::CredentialFileCorrupt(reason) => {
                VaultError::BackendUnavailable { reason }
            }
            GuardError::CredentialNotFound { service, user } => VaultError::BackendUnavailable {
                reason: format!("no credential for {service}/{user}"),
            },
            GuardError::BackendUnavailable => {
                VaultError::BackendUnavailable { reason: "no credential backend is usable".into() }
            }
            GuardError::UnknownDriver(driver) => {
                VaultError::VerificationError { driver, reason: "unregistered driver".into() }
            }
            GuardError::VerificationFailed { driver, reason } => {
                VaultError::VerificationError { driver, reason }
            }
            GuardError::Io { path, source } => {
                VaultError::FileSystemError { message: format!("{path}: {source}") }
            }
            GuardError::Serialization(reason) => VaultError::ValidationError { reason },
        }
    }
}
