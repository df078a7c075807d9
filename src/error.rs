use thiserror::Error;

/// Errors produced by key derivation and the salted envelope codec.
#[derive(Debug, Error)]
pub enum CryptError {
    #[error("OS random generator unavailable")]
    Random,

    #[error("failed to initialize AES-256-CBC: invalid key or IV length")]
    CipherInit,

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("envelope too short: {len} bytes")]
    Truncated { len: usize },

    #[error("ciphertext length {len} is not a positive multiple of the block size")]
    MisalignedCiphertext { len: usize },

    #[error("unknown envelope tag")]
    UnknownTag,

    /// Padding and plaintext encoding failures deliberately share this variant.
    #[error("decryption failed: wrong passphrase or corrupted data")]
    Decrypt,
}

impl CryptError {
    /// Errors that point at a broken host environment rather than bad input.
    pub fn is_fatal(&self) -> bool {
        matches!(self, CryptError::Random | CryptError::CipherInit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_environment_failures_are_fatal() {
        assert!(CryptError::Random.is_fatal());
        assert!(CryptError::CipherInit.is_fatal());
        assert!(!CryptError::Decrypt.is_fatal());
        assert!(!CryptError::Truncated { len: 3 }.is_fatal());
    }
}
