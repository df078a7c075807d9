pub mod config;
pub mod credentials;
pub mod crypto;
mod error;

pub use crate::config::Config;
pub use crate::crypto::{Envelope, HashAlgorithm, KdfParams, MagicPolicy};
pub use crate::error::CryptError;

use std::fmt;

use zeroize::Zeroizing;

/// Encrypts `plaintext` into a base64 `Salted__` envelope under `passphrase`.
///
/// Every call draws a fresh salt, so identical inputs produce different output.
/// Errors only when the host cannot supply randomness.
pub fn encrypt(plaintext: &str, passphrase: &str) -> Result<String, CryptError> {
    let salt = crypto::generate_salt()?;
    let envelope = crypto::seal(plaintext.as_bytes(), passphrase.as_bytes(), salt)?;
    Ok(envelope.to_base64())
}

/// Decrypts a base64 envelope, returning an empty string on any failure.
pub fn decrypt(payload: &str, passphrase: &str) -> String {
    empty_on_failure(try_decrypt(payload, passphrase, MagicPolicy::default()))
}

/// Decrypts a base64 envelope, reporting why it could not be opened.
pub fn try_decrypt(
    payload: &str,
    passphrase: &str,
    policy: MagicPolicy,
) -> Result<String, CryptError> {
    let envelope = Envelope::from_base64(payload, policy)?;
    let plaintext = crypto::open(&envelope, passphrase.as_bytes())?;

    String::from_utf8(plaintext.to_vec()).map_err(|_| CryptError::Decrypt)
}

fn empty_on_failure(result: Result<String, CryptError>) -> String {
    result.unwrap_or_else(|e| {
        if e.is_fatal() {
            tracing::warn!(error = %e, "decryption aborted, returning empty plaintext");
        } else {
            tracing::debug!(error = %e, "decryption failed, returning empty plaintext");
        }
        String::new()
    })
}

/// Encrypts credentials under the application passphrase shared with the API.
#[derive(Clone)]
pub struct TransportCipher {
    passphrase: Zeroizing<String>,
    magic_policy: MagicPolicy,
}

impl fmt::Debug for TransportCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportCipher")
            .field("passphrase", &"<redacted>")
            .field("magic_policy", &self.magic_policy)
            .finish()
    }
}

impl TransportCipher {
    pub fn new(passphrase: Zeroizing<String>) -> Self {
        Self {
            passphrase,
            magic_policy: MagicPolicy::default(),
        }
    }

    pub fn with_magic_policy(mut self, policy: MagicPolicy) -> Self {
        self.magic_policy = policy;
        self
    }

    pub fn magic_policy(&self) -> MagicPolicy {
        self.magic_policy
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String, CryptError> {
        encrypt(plaintext, &self.passphrase)
    }

    pub fn decrypt(&self, payload: &str) -> String {
        empty_on_failure(self.try_decrypt(payload))
    }

    pub fn try_decrypt(&self, payload: &str) -> Result<String, CryptError> {
        try_decrypt(payload, &self.passphrase, self.magic_policy)
    }
}

#[cfg(test)]
mod tests {
    use base64::{Engine, engine::general_purpose::STANDARD};

    use super::*;

    const APP_KEY: &str = "p9wVp1vv1zMn1y86aDhiL0a3EYWDUrI6";
    const KNOWN_PAYLOAD: &str = "U2FsdGVkX18BAgMEBQYHCFzwG0NGy3kaMvDHOrnnTtA=";

    fn cipher() -> TransportCipher {
        TransportCipher::new(Zeroizing::new(APP_KEY.to_string()))
    }

    #[test]
    fn encrypt_decrypt_roundtrip() {
        let long = "x".repeat(1000);
        for plaintext in ["secret", "", "Žluťoučký kůň", long.as_str()] {
            let payload = encrypt(plaintext, "pw").unwrap();
            assert_eq!(decrypt(&payload, "pw"), plaintext);
        }
    }

    #[test]
    fn empty_plaintext_roundtrips() {
        let payload = encrypt("", APP_KEY).unwrap();
        assert_eq!(STANDARD.decode(&payload).unwrap().len(), 32);
        assert_eq!(decrypt(&payload, APP_KEY), "");
    }

    #[test]
    fn encrypt_uses_fresh_salt() {
        let a = encrypt("secret", APP_KEY).unwrap();
        let b = encrypt("secret", APP_KEY).unwrap();

        assert_ne!(a, b);
    }

    #[test]
    fn known_vector_decrypts() {
        assert_eq!(decrypt(KNOWN_PAYLOAD, APP_KEY), "secret");
    }

    #[test]
    fn malformed_input_yields_empty_string() {
        assert_eq!(decrypt("not-base64!!", "k"), "");
        assert_eq!(decrypt(&STANDARD.encode("short"), "k"), "");
    }

    #[test]
    fn wrong_passphrase_yields_empty_string() {
        let payload = encrypt("a secret long enough to span two blocks", "right").unwrap();
        assert_eq!(decrypt(&payload, "wrong"), "");
    }

    #[test]
    fn tampered_ciphertext_yields_empty_string() {
        let original = STANDARD.decode(KNOWN_PAYLOAD).unwrap();

        for i in Envelope::HEADER_LEN..original.len() {
            let mut data = original.clone();
            data[i] ^= 0xFF;
            let tampered = STANDARD.encode(&data);

            assert_eq!(decrypt(&tampered, APP_KEY), "");
            assert!(matches!(
                try_decrypt(&tampered, APP_KEY, MagicPolicy::Strict),
                Err(CryptError::Decrypt)
            ));
        }
    }

    #[test]
    fn transport_cipher_roundtrip() {
        let cipher = cipher();
        let payload = cipher.encrypt("hunter2").unwrap();

        assert_eq!(cipher.decrypt(&payload), "hunter2");
        assert_eq!(cipher.try_decrypt(&payload).unwrap(), "hunter2");
    }

    #[test]
    fn transport_cipher_policy_controls_tag_check() {
        let payload = cipher().encrypt("hunter2").unwrap();
        let mut data = STANDARD.decode(&payload).unwrap();
        data[..8].copy_from_slice(b"Garbage!");
        let retagged = STANDARD.encode(&data);

        assert!(matches!(
            cipher().try_decrypt(&retagged),
            Err(CryptError::UnknownTag)
        ));
        assert_eq!(
            cipher()
                .with_magic_policy(MagicPolicy::Lenient)
                .decrypt(&retagged),
            "hunter2"
        );
    }

    #[test]
    fn legacy_tag_is_accepted_by_default() {
        let payload = "T2ZTYUlBcEkBAgMEBQYHCFzwG0NGy3kaMvDHOrnnTtA=";
        assert_eq!(cipher().decrypt(payload), "secret");
    }

    #[test]
    fn debug_redacts_passphrase() {
        let debug = format!("{:?}", cipher());
        assert!(!debug.contains(APP_KEY));
        assert!(debug.contains("redacted"));
    }
}
