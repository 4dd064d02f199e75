//! Symmetric encryption of journal entry text.
//!
//! Entries are sealed with AES-256-GCM. The stored token is
//! `base64(nonce) ":" base64(ciphertext || tag)`; standard base64 never
//! emits `:`, so the first delimiter always separates the two parts
//! regardless of what the plaintext contains.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::Rng;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Required key length in bytes (AES-256).
pub const KEY_LENGTH: usize = 32;

/// Nonce length in bytes (96-bit GCM nonce).
pub const NONCE_LENGTH: usize = 12;

/// Separator between the encoded nonce and the encoded ciphertext.
pub const TOKEN_DELIMITER: char = ':';

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised at the cipher boundary. Messages never contain plaintext.
#[derive(Debug, thiserror::Error)]
pub enum CipherError {
    #[error("Encryption key must be {KEY_LENGTH} bytes, got {0}")]
    InvalidKey(usize),

    #[error("Malformed cipher token: {0}")]
    MalformedToken(String),

    #[error("Encryption failed")]
    EncryptionFailed,

    #[error("Decryption failed: wrong key or corrupted data")]
    DecryptionFailed,
}

// ---------------------------------------------------------------------------
// Cipher
// ---------------------------------------------------------------------------

/// Process-wide entry cipher. Built once at startup from the configured key.
#[derive(Clone)]
pub struct EntryCipher {
    cipher: Aes256Gcm,
}

impl std::fmt::Debug for EntryCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryCipher").finish_non_exhaustive()
    }
}

impl EntryCipher {
    /// Build a cipher from a raw 32-byte key.
    pub fn new(key: &[u8]) -> Result<Self, CipherError> {
        if key.len() != KEY_LENGTH {
            return Err(CipherError::InvalidKey(key.len()));
        }
        let cipher =
            Aes256Gcm::new_from_slice(key).map_err(|_| CipherError::InvalidKey(key.len()))?;
        Ok(Self { cipher })
    }

    /// Build a cipher from configured key material.
    ///
    /// Accepts either exactly 32 raw bytes or a standard-base64 string that
    /// decodes to 32 bytes.
    pub fn from_key_material(material: &str) -> Result<Self, CipherError> {
        if material.len() == KEY_LENGTH {
            return Self::new(material.as_bytes());
        }
        match STANDARD.decode(material.trim()) {
            Ok(decoded) => Self::new(&decoded),
            Err(_) => Err(CipherError::InvalidKey(material.len())),
        }
    }

    /// Encrypt `plaintext` under a freshly drawn random nonce.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CipherError> {
        let mut nonce_bytes = [0u8; NONCE_LENGTH];
        rand::rng().fill(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let sealed = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|_| CipherError::EncryptionFailed)?;

        Ok(format!(
            "{}{TOKEN_DELIMITER}{}",
            STANDARD.encode(nonce_bytes),
            STANDARD.encode(sealed)
        ))
    }

    /// Decrypt a token produced by [`EntryCipher::encrypt`].
    pub fn decrypt(&self, token: &str) -> Result<String, CipherError> {
        let (nonce_b64, sealed_b64) = token
            .split_once(TOKEN_DELIMITER)
            .ok_or_else(|| CipherError::MalformedToken("missing delimiter".into()))?;

        let nonce_bytes = STANDARD
            .decode(nonce_b64)
            .map_err(|_| CipherError::MalformedToken("nonce is not valid base64".into()))?;
        if nonce_bytes.len() != NONCE_LENGTH {
            return Err(CipherError::MalformedToken(format!(
                "nonce must be {NONCE_LENGTH} bytes, got {}",
                nonce_bytes.len()
            )));
        }
        let sealed = STANDARD
            .decode(sealed_b64)
            .map_err(|_| CipherError::MalformedToken("ciphertext is not valid base64".into()))?;

        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(&nonce_bytes), sealed.as_slice())
            .map_err(|_| CipherError::DecryptionFailed)?;

        String::from_utf8(plaintext).map_err(|_| CipherError::DecryptionFailed)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
