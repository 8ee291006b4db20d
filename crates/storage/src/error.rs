// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Warden Project Contributors

//! Storage-layer error type, composed into [`warden_core::VaultError`] at
//! the boundary where callers need the shared taxonomy.

use thiserror::Error;
use warden_core::VaultError;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("approval {approval_id} not found")]
    ApprovalNotFound { approval_id: String },
}

impl From<StorageError> for VaultError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Io { path, source } => VaultError::FileSystemError {
                message: format!("{path}: {source}"),
            },
            StorageError::Serialization(reason) => VaultError::ValidationError { reason },
            StorageError::ApprovalNotFound { approval_id } => VaultError::ApprovalInvalid {
                reason: format!("approval {approval_id} not found"),
            },
        }
    }
}
