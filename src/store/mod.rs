// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Credential persistence.

pub mod cipher;
pub mod file;

pub use cipher::{CipherError, LocalCipher};
pub use file::FileCredentialStore;

use crate::models::Credential;
use async_trait::async_trait;

/// Errors writing a credential. Read failures never surface; see
/// [`CredentialStore::read`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Refusing to store incomplete credential")]
    Incomplete,

    #[error("Failed to encrypt refresh token: {0}")]
    Encrypt(#[from] CipherError),

    #[error("Failed to serialize credential: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to write credential file: {0}")]
    Io(#[from] std::io::Error),
}

/// Durable storage for the single dashboard credential.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Load the stored credential.
    ///
    /// Returns `None` when nothing has been stored, when the stored refresh
    /// token is empty, or when the stored data cannot be read or decrypted.
    async fn read(&self) -> Option<Credential>;

    /// Replace the stored credential.
    async fn write(&self, credential: &Credential) -> Result<(), StoreError>;
}
