//! Decryption boundary for workspace connection strings.
//!
//! The cache hands ciphertext to a [`Decryptor`] only on a miss; hits never
//! touch this module. The trait is async so a remote KMS-style service fits
//! the same seam as the built-in local cipher.

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng, Payload};
use aes_gcm::{Aes256Gcm, Nonce};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;

const NONCE_SIZE: usize = 12;

#[derive(thiserror::Error, Debug)]
pub enum CryptoError {
    #[error("invalid credentials key: {0}")]
    InvalidKey(String),
    #[error("malformed ciphertext")]
    Malformed,
    #[error("encryption failed")]
    EncryptFailed,
    #[error("decryption failed for workspace {workspace_id}")]
    DecryptFailed { workspace_id: String },
}

#[async_trait]
pub trait Decryptor: Send + Sync {
    /// Decrypts an encrypted connection string. The workspace id is bound
    /// into the ciphertext as associated data, so ciphertext copied between
    /// workspace rows does not decrypt.
    async fn decrypt(&self, ciphertext: &str, workspace_id: &str) -> Result<String, CryptoError>;
}

/// AES-256-GCM over base64(`nonce || ciphertext`), keyed from configuration.
pub struct AesGcmDecryptor {
    cipher: Aes256Gcm,
}

impl AesGcmDecryptor {
    pub fn new(key_base64: &str) -> Result<Self, CryptoError> {
        let key = BASE64
            .decode(key_base64)
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
        let cipher = Aes256Gcm::new_from_slice(&key)
            .map_err(|_| CryptoError::InvalidKey(format!("expected 32 bytes, got {}", key.len())))?;

        Ok(Self { cipher })
    }

    /// Mirrors the provisioning side of the scheme; the portal itself only
    /// decrypts, but tooling and tests need to produce valid ciphertexts.
    pub fn encrypt(&self, plaintext: &str, workspace_id: &str) -> Result<String, CryptoError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let sealed = self
            .cipher
            .encrypt(
                &nonce,
                Payload {
                    msg: plaintext.as_bytes(),
                    aad: workspace_id.as_bytes(),
                },
            )
            .map_err(|_| CryptoError::EncryptFailed)?;

        let mut out = Vec::with_capacity(NONCE_SIZE + sealed.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&sealed);
        Ok(BASE64.encode(out))
    }
}

#[async_trait]
impl Decryptor for AesGcmDecryptor {
    async fn decrypt(&self, ciphertext: &str, workspace_id: &str) -> Result<String, CryptoError> {
        let raw = BASE64.decode(ciphertext).map_err(|_| CryptoError::Malformed)?;
        if raw.len() <= NONCE_SIZE {
            return Err(CryptoError::Malformed);
        }

        let (nonce, sealed) = raw.split_at(NONCE_SIZE);
        let plaintext = self
            .cipher
            .decrypt(
                Nonce::from_slice(nonce),
                Payload {
                    msg: sealed,
                    aad: workspace_id.as_bytes(),
                },
            )
            .map_err(|_| CryptoError::DecryptFailed {
                workspace_id: workspace_id.to_string(),
            })?;

        String::from_utf8(plaintext).map_err(|_| CryptoError::Malformed)
    }
}
