// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Warden Project Contributors

//! Credential resolution and storage for driver subprocesses.
//!
//! Storage priority follows a fallback chain: the OS keyring if the
//! platform backend is reachable, otherwise a file encrypted with
//! AES-256-GCM whose wrapping key lives in a sibling file with `0600`
//! permissions. Every call emits an audit event recording the operation
//! and key identity; the secret value itself is never logged.

use crate::error::GuardError;
use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce as AesNonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use warden_core::{AuditEvent, AuditLevel, AuditOutcome};
use warden_storage::AuditLog;

const WRAP_KEY_FILE: &str = "credentials.key";
const STORE_FILE: &str = "credentials.enc";

/// Identity of one stored credential.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CredentialKey {
    pub service: String,
    pub user: String,
}

impl std::fmt::Display for CredentialKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.service, self.user)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct EncryptedEntry {
    nonce: String,
    ciphertext: String,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct FileBackend {
    entries: BTreeMap<String, EncryptedEntry>,
}

/// `put`/`get`/`delete`/`list`/`rotate` over an OS-keyring-first, then
/// encrypted-file, backend.
pub struct CredentialStore {
    root: PathBuf,
    service_prefix: String,
    use_keyring: bool,
}

impl CredentialStore {
    /// `use_keyring` is a constructor-time switch rather than a runtime
    /// probe: CI and containerized drivers rarely have a working keyring
    /// daemon, and callers know their environment up front.
    pub fn new(root: impl Into<PathBuf>, service_prefix: impl Into<String>, use_keyring: bool) -> Self {
        Self { root: root.into(), service_prefix: service_prefix.into(), use_keyring }
    }

    fn entry_id(&self, key: &CredentialKey) -> String {
        format!("{}:{}:{}", self.service_prefix, key.service, key.user)
    }

    pub fn put(&self, key: &CredentialKey, secret: &str, audit: &AuditLog) -> Result<(), GuardError> {
        let result = if self.use_keyring {
            self.put_keyring(key, secret)
        } else {
            self.put_file(key, secret)
        };
        self.emit(audit, "credential.put", key, result.is_ok());
        result
    }

    pub fn get(&self, key: &CredentialKey, audit: &AuditLog) -> Result<String, GuardError> {
        let result = if self.use_keyring { self.get_keyring(key) } else { self.get_file(key) };
        self.emit(audit, "credential.get", key, result.is_ok());
        result
    }

    pub fn delete(&self, key: &CredentialKey, audit: &AuditLog) -> Result<(), GuardError> {
        let result = if self.use_keyring { self.delete_keyring(key) } else { self.delete_file(key) };
        self.emit(audit, "credential.delete", key, result.is_ok());
        result
    }

    pub fn rotate(&self, key: &CredentialKey, new_secret: &str, audit: &AuditLog) -> Result<(), GuardError> {
        let result = self.put(key, new_secret, audit);
        // `put` already emitted `credential.put`; rotate carries its own
        // distinct event so operators can tell a rotation from a first write.
        self.emit(audit, "credential.rotate", key, result.is_ok());
        result
    }

    pub fn list(&self) -> Result<Vec<CredentialKey>, GuardError> {
        if self.use_keyring {
            // The keyring API exposes no enumeration primitive; list() is
            // only meaningful against the file backend.
            return Ok(Vec::new());
        }
        let backend = self.load_file_backend()?;
        Ok(backend
            .entries
            .keys()
            .filter_map(|id| self.split_entry_id(id))
            .collect())
    }

    fn split_entry_id(&self, id: &str) -> Option<CredentialKey> {
        let rest = id.strip_prefix(&format!("{}:", self.service_prefix))?;
        let (service, user) = rest.split_once(':')?;
        Some(CredentialKey { service: service.to_string(), user: user.to_string() })
    }

    fn emit(&self, audit: &AuditLog, event_type: &str, key: &CredentialKey, ok: bool) {
        let mut context = BTreeMap::new();
        context.insert("key".to_string(), key.to_string());
        let event = AuditEvent {
            ts: Utc::now(),
            trace_id: warden_core::TraceId::new(),
            level: if ok { AuditLevel::Info } else { AuditLevel::Warn },
            event_type: event_type.to_string(),
            actor: "credential_store".to_string(),
            task_id: None,
            approval_id: None,
            driver: None,
            action_type: None,
            outcome: if ok { AuditOutcome::Ok } else { AuditOutcome::Err },
            duration_ms: None,
            redacted_context: context,
        };
        if let Err(e) = audit.append(&event) {
            tracing::error!(error = %e, "failed to audit credential operation");
        }
    }

    // --- keyring backend ---

    fn put_keyring(&self, key: &CredentialKey, secret: &str) -> Result<(), GuardError> {
        let entry = keyring::Entry::new(&self.entry_id(key), &key.user)
            .map_err(|e| GuardError::KeyringUnavailable(e.to_string()))?;
        entry.set_password(secret).map_err(|e| GuardError::KeyringUnavailable(e.to_string()))
    }

    fn get_keyring(&self, key: &CredentialKey) -> Result<String, GuardError> {
        let entry = keyring::Entry::new(&self.entry_id(key), &key.user)
            .map_err(|e| GuardError::KeyringUnavailable(e.to_string()))?;
        entry.get_password().map_err(|_| GuardError::CredentialNotFound {
            service: key.service.clone(),
            user: key.user.clone(),
        })
    }

    fn delete_keyring(&self, key: &CredentialKey) -> Result<(), GuardError> {
        let entry = keyring::Entry::new(&self.entry_id(key), &key.user)
            .map_err(|e| GuardError::KeyringUnavailable(e.to_string()))?;
        entry.delete_password().map_err(|e| GuardError::KeyringUnavailable(e.to_string()))
    }

    // --- encrypted-file backend ---

    fn wrap_key_path(&self) -> PathBuf {
        self.root.join(WRAP_KEY_FILE)
    }

    fn store_path(&self) -> PathBuf {
        self.root.join(STORE_FILE)
    }

    fn load_or_create_wrap_key(&self) -> Result<[u8; 32], GuardError> {
        let path = self.wrap_key_path();
        if let Ok(bytes) = fs::read(&path) {
            if bytes.len() == 32 {
                let mut key = [0u8; 32];
                key.copy_from_slice(&bytes);
                return Ok(key);
            }
        }
        fs::create_dir_all(&self.root).map_err(|e| io_err(&self.root, e))?;
        let mut key = [0u8; 32];
        rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut key);
        fs::write(&path, key).map_err(|e| io_err(&path, e))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(&path).map_err(|e| io_err(&path, e))?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&path, perms).map_err(|e| io_err(&path, e))?;
        }
        Ok(key)
    }

    fn load_file_backend(&self) -> Result<FileBackend, GuardError> {
        let path = self.store_path();
        match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).map_err(|e| GuardError::Serialization(e.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(FileBackend::default()),
            Err(e) => Err(io_err(&path, e)),
        }
    }

    fn save_file_backend(&self, backend: &FileBackend) -> Result<(), GuardError> {
        let path = self.store_path();
        fs::create_dir_all(&self.root).map_err(|e| io_err(&self.root, e))?;
        let contents = serde_json::to_vec_pretty(backend).map_err(|e| GuardError::Serialization(e.to_string()))?;
        let tmp_path = path.with_extension("enc.tmp");
        fs::write(&tmp_path, &contents).map_err(|e| io_err(&tmp_path, e))?;
        fs::rename(&tmp_path, &path).map_err(|e| io_err(&path, e))
    }

    fn put_file(&self, key: &CredentialKey, secret: &str) -> Result<(), GuardError> {
        let wrap_key = self.load_or_create_wrap_key()?;
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&wrap_key));
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = cipher
            .encrypt(&nonce, secret.as_bytes())
            .map_err(|e| GuardError::CredentialFileCorrupt(e.to_string()))?;
        let mut backend = self.load_file_backend()?;
        backend.entries.insert(
            self.entry_id(key),
            EncryptedEntry {
                nonce: BASE64.encode(nonce),
                ciphertext: BASE64.encode(ciphertext),
                updated_at: Utc::now(),
            },
        );
        self.save_file_backend(&backend)
    }

    fn get_file(&self, key: &CredentialKey) -> Result<String, GuardError> {
        let wrap_key = self.load_or_create_wrap_key()?;
        let backend = self.load_file_backend()?;
        let entry = backend.entries.get(&self.entry_id(key)).ok_or_else(|| GuardError::CredentialNotFound {
            service: key.service.clone(),
            user: key.user.clone(),
        })?;
        let nonce_bytes =
            BASE64.decode(&entry.nonce).map_err(|e| GuardError::CredentialFileCorrupt(e.to_string()))?;
        let ciphertext =
            BASE64.decode(&entry.ciphertext).map_err(|e| GuardError::CredentialFileCorrupt(e.to_string()))?;
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&wrap_key));
        let plaintext = cipher
            .decrypt(AesNonce::from_slice(&nonce_bytes), ciphertext.as_ref())
            .map_err(|e| GuardError::CredentialFileCorrupt(e.to_string()))?;
        String::from_utf8(plaintext).map_err(|e| GuardError::CredentialFileCorrupt(e.to_string()))
    }

    fn delete_file(&self, key: &CredentialKey) -> Result<(), GuardError> {
        let mut backend = self.load_file_backend()?;
        backend.entries.remove(&self.entry_id(key));
        self.save_file_backend(&backend)
    }
}

fn io_err(path: impl AsRef<Path>, source: std::io::Error) -> GuardError {
    GuardError::Io { path: path.as_ref().display().to_string(), source }
}

#[cfg(test)]
#[path = "credential_tests.rs"]
mod tests;
