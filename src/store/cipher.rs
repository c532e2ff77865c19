// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Local encryption for the stored refresh token.
//!
//! The AES-256-GCM key is derived with HKDF-SHA256 from a random secret in a
//! per-user key file, salted with the machine identifier and bound to the OS
//! user name. A token file copied to another machine or account therefore
//! cannot be decrypted, even together with the key file.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use hkdf::Hkdf;
use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM, NONCE_LEN};
use ring::rand::{SecureRandom, SystemRandom};
use sha2::Sha256;
use std::fmt;
use std::io::Write;
use std::path::Path;

/// Length of the random secret held in the key file.
pub const SECRET_LEN: usize = 32;

/// Associated data binding ciphertexts to their purpose.
const AAD: &[u8] = b"run-dashboard:strava-refresh-token";

const HKDF_INFO_PREFIX: &str = "run-dashboard/refresh-token/v1:";

const MACHINE_ID_PATHS: &[&str] = &["/etc/machine-id", "/var/lib/dbus/machine-id"];

/// Errors from the local cipher.
#[derive(Debug, thiserror::Error)]
pub enum CipherError {
    #[error("Key file error: {0}")]
    KeyFile(#[from] std::io::Error),

    #[error("Random number generation failed")]
    Random,

    #[error("Key derivation failed")]
    KeyDerivation,

    #[error("Encryption failed")]
    Encrypt,

    #[error("Ciphertext is not valid base64: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error("Ciphertext too short")]
    Truncated,

    #[error("Decryption failed (wrong key or tampered data)")]
    Decrypt,

    #[error("Decrypted token is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Symmetric cipher scoped to the current user on the current machine.
#[derive(Clone)]
pub struct LocalCipher {
    key: [u8; 32],
}

impl fmt::Debug for LocalCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalCipher").finish_non_exhaustive()
    }
}

impl LocalCipher {
    /// Load the key file (creating it on first use) and derive the key for
    /// the current user and machine.
    pub fn for_current_user(key_path: &Path) -> Result<Self, CipherError> {
        let secret = load_or_create_secret(key_path)?;
        Self::derive(&secret, &machine_id(), &user_name())
    }

    /// Derive a cipher from explicit key material.
    pub fn derive(secret: &[u8], machine_id: &str, user: &str) -> Result<Self, CipherError> {
        let hk = Hkdf::<Sha256>::new(Some(machine_id.as_bytes()), secret);
        let info = format!("{}{}", HKDF_INFO_PREFIX, user);

        let mut key = [0u8; 32];
        hk.expand(info.as_bytes(), &mut key)
            .map_err(|_| CipherError::KeyDerivation)?;

        Ok(Self { key })
    }

    fn sealing_key(&self) -> Result<LessSafeKey, CipherError> {
        let unbound =
            UnboundKey::new(&AES_256_GCM, &self.key).map_err(|_| CipherError::KeyDerivation)?;
        Ok(LessSafeKey::new(unbound))
    }

    /// Encrypt a token. Returns base64 of `nonce || ciphertext || tag`.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CipherError> {
        let key = self.sealing_key()?;

        let mut nonce_bytes = [0u8; NONCE_LEN];
        SystemRandom::new()
            .fill(&mut nonce_bytes)
            .map_err(|_| CipherError::Random)?;

        let mut in_out = plaintext.as_bytes().to_vec();
        key.seal_in_place_append_tag(
            Nonce::assume_unique_for_key(nonce_bytes),
            Aad::from(AAD),
            &mut in_out,
        )
        .map_err(|_| CipherError::Encrypt)?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + in_out.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&in_out);
        Ok(BASE64.encode(sealed))
    }

    /// Decrypt a value produced by [`LocalCipher::encrypt`].
    pub fn decrypt(&self, encoded: &str) -> Result<String, CipherError> {
        let sealed = BASE64.decode(encoded)?;
        if sealed.len() < NONCE_LEN + AES_256_GCM.tag_len() {
            return Err(CipherError::Truncated);
        }

        let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LEN);
        let nonce =
            Nonce::try_assume_unique_for_key(nonce_bytes).map_err(|_| CipherError::Truncated)?;

        let key = self.sealing_key()?;
        let mut in_out = ciphertext.to_vec();
        let plaintext = key
            .open_in_place(nonce, Aad::from(AAD), &mut in_out)
            .map_err(|_| CipherError::Decrypt)?;

        Ok(String::from_utf8(plaintext.to_vec())?)
    }
}

/// Read the secret from `path`, generating a new one if the file is missing
/// or malformed.
fn load_or_create_secret(path: &Path) -> Result<[u8; SECRET_LEN], CipherError> {
    match std::fs::read(path) {
        Ok(bytes) if bytes.len() == SECRET_LEN => {
            let mut secret = [0u8; SECRET_LEN];
            secret.copy_from_slice(&bytes);
            return Ok(secret);
        }
        Ok(bytes) => {
            // Anything encrypted under the old key becomes unreadable, which
            // the store reports as "not authorized".
            tracing::warn!(
                path = %path.display(),
                len = bytes.len(),
                "Malformed token key file, generating a new key"
            );
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!(path = %path.display(), "Creating token key file");
        }
        Err(e) => return Err(e.into()),
    }

    let mut secret = [0u8; SECRET_LEN];
    SystemRandom::new()
        .fill(&mut secret)
        .map_err(|_| CipherError::Random)?;
    write_private_file(path, &secret)?;
    Ok(secret)
}

/// Write `contents` to `path`, readable only by the current user on Unix.
fn write_private_file(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    file.write_all(contents)?;
    file.sync_all()?;

    // `mode` only applies on creation; tighten pre-existing files too.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    }

    Ok(())
}

fn machine_id() -> String {
    MACHINE_ID_PATHS
        .iter()
        .filter_map(|p| std::fs::read_to_string(p).ok())
        .map(|id| id.trim().to_string())
        .find(|id| !id.is_empty())
        .or_else(|| non_empty_env("HOSTNAME"))
        .or_else(|| non_empty_env("COMPUTERNAME"))
        .unwrap_or_else(|| "unknown-host".to_string())
}

fn user_name() -> String {
    non_empty_env("USER")
        .or_else(|| non_empty_env("USERNAME"))
        .unwrap_or_else(|| "unknown-user".to_string())
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
