//! Encryption of secret provider settings (API keys) at rest.
//!
//! The key is derived from a fixed salt and the setting's name, so a value
//! copied to another key does not decrypt. Stored form is
//! `base64(nonce || ciphertext)`.

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Key, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use sha2::{Digest, Sha256};

use crate::error::ConfigError;

const SALT: &[u8] = b"3FF2EB019C627B9652257EAAD71812269851E84295370EB132882F88C0A59A76";
const NONCE_LEN: usize = 12;

fn cipher_for(field: &str) -> Aes256Gcm {
    let mut hasher = Sha256::new();
    hasher.update(SALT);
    hasher.update(field.as_bytes());
    let digest = hasher.finalize();
    let key = *Key::<Aes256Gcm>::from_slice(&digest);
    Aes256Gcm::new(&key)
}

fn crypto_error(field: &str, detail: impl ToString) -> ConfigError {
    ConfigError::Crypto {
        key: field.to_string(),
        detail: detail.to_string(),
    }
}

pub fn encrypt_field(field: &str, value: &str) -> Result<String, ConfigError> {
    let cipher = cipher_for(field);
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let ciphertext = cipher
        .encrypt(&nonce, value.as_bytes())
        .map_err(|e| crypto_error(field, e))?;

    let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&ciphertext);
    Ok(BASE64.encode(out))
}

pub fn decrypt_field(field: &str, stored: &str) -> Result<String, ConfigError> {
    let raw = BASE64
        .decode(stored.trim())
        .map_err(|e| crypto_error(field, e))?;
    if raw.len() <= NONCE_LEN {
        return Err(crypto_error(field, "value too short"));
    }
    let (nonce, ciphertext) = raw.split_at(NONCE_LEN);
    let plain = cipher_for(field)
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|e| crypto_error(field, e))?;
    String::from_utf8(plain).map_err(|e| crypto_error(field, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encrypt_then_decrypt() {
        let stored = encrypt_field("apiKey", "secret-123").unwrap();
        assert_ne!(stored, "secret-123");
        assert_eq!(decrypt_field("apiKey", &stored).unwrap(), "secret-123");
    }

    #[test]
    fn nonce_is_random() {
        let a = encrypt_field("apiKey", "x").unwrap();
        let b = encrypt_field("apiKey", "x").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn wrong_field_or_garbage_fails() {
        let stored = encrypt_field("apiKey", "secret").unwrap();
        assert!(matches!(
            decrypt_field("otherKey", &stored),
            Err(ConfigError::Crypto { .. })
        ));
        assert!(decrypt_field("apiKey", "not base64!").is_err());
        assert!(decrypt_field("apiKey", "AAAA").is_err());
    }

    #[test]
    fn empty_value_round_trips() {
        let stored = encrypt_field("apiKey", "").unwrap();
        assert_eq!(decrypt_field("apiKey", &stored).unwrap(), "");
    }
}
