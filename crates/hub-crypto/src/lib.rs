//! AES-256-GCM encryption for handler storage blobs.
//!
//! The wire format is base64 of `nonce (12 bytes) || ciphertext || tag`.
//! The cipher key is derived from an arbitrary secret string with SHA-256,
//! so any configured `secret_key` works regardless of length.

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use sha2::{Digest, Sha256};
use thiserror::Error;

const NONCE_LEN: usize = 12;

#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

pub type CryptoResult<T> = Result<T, CryptoError>;

fn cipher_for(secret: &str) -> Aes256Gcm {
    let key = Sha256::digest(secret.as_bytes());
    Aes256Gcm::new(&key)
}

/// Encrypt a blob with the given secret, returning base64 text.
pub fn encrypt(plaintext: &[u8], secret: &str) -> CryptoResult<String> {
    let cipher = cipher_for(secret);
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

    let mut combined = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    combined.extend_from_slice(nonce.as_slice());
    combined.extend_from_slice(&ciphertext);

    Ok(BASE64.encode(combined))
}

/// Decrypt base64 text produced by `encrypt` with the same secret.
pub fn decrypt(ciphertext: &str, secret: &str) -> CryptoResult<Vec<u8>> {
    let combined = BASE64
        .decode(ciphertext.trim())
        .map_err(|e| CryptoError::InvalidData(e.to_string()))?;

    if combined.len() < NONCE_LEN {
        return Err(CryptoError::InvalidData("Ciphertext too short".to_string()));
    }

    let (nonce_bytes, ciphertext_bytes) = combined.split_at(NONCE_LEN);
    let nonce = Nonce::from_slice(nonce_bytes);

    cipher_for(secret)
        .decrypt(nonce, ciphertext_bytes)
        .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypt_decrypt_round_trip() {
        let blob = b"{\"token.json\":\"eyJhY2Nlc3MiOiJhYmMifQ==\"}";
        let encrypted = encrypt(blob, "dummy-key").unwrap();

        assert_ne!(encrypted.as_bytes(), blob.as_slice());

        let decrypted = decrypt(&encrypted, "dummy-key").unwrap();
        assert_eq!(decrypted, blob);
    }

    #[test]
    fn test_wrong_key_fails() {
        let encrypted = encrypt(b"secret state", "key-a").unwrap();
        assert!(decrypt(&encrypted, "key-b").is_err());
    }

    #[test]
    fn test_any_key_length_works() {
        let encrypted = encrypt(b"x", "").unwrap();
        assert_eq!(decrypt(&encrypted, "").unwrap(), b"x");

        let long = "k".repeat(200);
        let encrypted = encrypt(b"y", &long).unwrap();
        assert_eq!(decrypt(&encrypted, &long).unwrap(), b"y");
    }

    #[test]
    fn test_invalid_ciphertext() {
        assert!(decrypt("not base64!", "k").is_err());
        assert!(decrypt(&BASE64.encode([0u8; 5]), "k").is_err());
    }
}
