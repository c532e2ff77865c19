// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JSON file credential store.
//!
//! Layout: `{access_token, expires_at, refresh_token_encrypted}`. Only the
//! refresh token is encrypted; the access token expires within hours.

use super::cipher::LocalCipher;
use super::{CredentialStore, StoreError};
use crate::models::Credential;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

/// On-disk representation of a [`Credential`].
#[derive(Debug, Serialize, Deserialize)]
struct PersistedCredential {
    #[serde(default)]
    access_token: String,
    expires_at: DateTime<Utc>,
    #[serde(default)]
    refresh_token_encrypted: String,
}

/// Credential store backed by a single local file.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
    cipher: LocalCipher,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>, cipher: LocalCipher) -> Self {
        Self {
            path: path.into(),
            cipher,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn decode(&self, contents: &str) -> Option<Credential> {
        let persisted: PersistedCredential = match serde_json::from_str(contents) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(error = %e, path = %self.path.display(), "Unparsable credential file");
                return None;
            }
        };

        if persisted.refresh_token_encrypted.is_empty() {
            tracing::debug!("Stored credential has no refresh token");
            return None;
        }

        let refresh_token = match self.cipher.decrypt(&persisted.refresh_token_encrypted) {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to decrypt stored refresh token");
                return None;
            }
        };

        if refresh_token.is_empty() || persisted.access_token.is_empty() {
            tracing::warn!("Stored credential is incomplete");
            return None;
        }

        Some(Credential {
            access_token: persisted.access_token,
            expires_at: persisted.expires_at,
            refresh_token,
        })
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn read(&self) -> Option<Credential> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "No stored credential");
                return None;
            }
            Err(e) => {
                tracing::warn!(error = %e, path = %self.path.display(), "Failed to read credential file");
                return None;
            }
        };

        self.decode(&contents)
    }

    async fn write(&self, credential: &Credential) -> Result<(), StoreError> {
        if credential.access_token.is_empty() || credential.refresh_token.is_empty() {
            return Err(StoreError::Incomplete);
        }

        let persisted = PersistedCredential {
            access_token: credential.access_token.clone(),
            expires_at: credential.expires_at,
            refresh_token_encrypted: self.cipher.encrypt(&credential.refresh_token)?,
        };
        let json = serde_json::to_vec_pretty(&persisted)?;

        let path = self.path.clone();
        tokio::task::spawn_blocking(move || replace_file(&path, &json))
            .await
            .map_err(std::io::Error::other)??;

        tracing::debug!(
            path = %self.path.display(),
            expires_at = %credential.expires_at,
            "Credential stored"
        );
        Ok(())
    }
}

/// Replace `path` with `contents` through a uniquely named sibling, so
/// concurrent writers never share a staging file and readers see either the
/// old or the new credential.
fn replace_file(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;

    // NamedTempFile is created 0600 on Unix.
    let mut staged = tempfile::Builder::new()
        .prefix(".strava_tokens")
        .suffix(".tmp")
        .tempfile_in(parent)?;
    staged.write_all(contents)?;
    staged.as_file().sync_all()?;
    staged.persist(path).map_err(|e| e.error)?;
    Ok(())
}
