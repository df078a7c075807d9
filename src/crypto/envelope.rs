//! Salted ciphertext container.
//!
//! Wire layout, base64-encoded for transport:
//! ```text
//! TAG "Salted__" (8) | SALT (8) | AES-256-CBC CIPHERTEXT (n * 16)
//! ```

use std::fmt;
use std::str::FromStr;

use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

use super::{BLOCK_LEN, LEGACY_MAGIC, MAGIC, MAGIC_LEN, SALT_LEN};
use crate::error::CryptError;

/// How the 8-byte tag in front of the salt is treated when decoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MagicPolicy {
    /// Only the known tags are accepted.
    #[default]
    Strict,
    /// The tag is skipped without inspection.
    Lenient,
}

impl MagicPolicy {
    fn accepts(self, tag: &[u8]) -> bool {
        match self {
            MagicPolicy::Strict => tag == MAGIC || tag == LEGACY_MAGIC,
            MagicPolicy::Lenient => true,
        }
    }
}

impl fmt::Display for MagicPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MagicPolicy::Strict => f.write_str("strict"),
            MagicPolicy::Lenient => f.write_str("lenient"),
        }
    }
}

impl FromStr for MagicPolicy {
    type Err = CryptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(MagicPolicy::Strict),
            "lenient" => Ok(MagicPolicy::Lenient),
            other => Err(CryptError::InvalidParameter(format!(
                "unknown magic policy '{other}' (expected 'strict' or 'lenient')"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    tag: [u8; MAGIC_LEN],
    salt: [u8; SALT_LEN],
    ciphertext: Vec<u8>,
}

impl Envelope {
    pub const HEADER_LEN: usize = MAGIC_LEN + SALT_LEN;

    pub fn new(salt: [u8; SALT_LEN], ciphertext: Vec<u8>) -> Self {
        Self {
            tag: *MAGIC,
            salt,
            ciphertext,
        }
    }

    pub fn tag(&self) -> &[u8; MAGIC_LEN] {
        &self.tag
    }

    pub fn salt(&self) -> &[u8; SALT_LEN] {
        &self.salt
    }

    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(Self::HEADER_LEN + self.ciphertext.len());

        buf.extend_from_slice(&self.tag);
        buf.extend_from_slice(&self.salt);
        buf.extend_from_slice(&self.ciphertext);

        buf
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.to_bytes())
    }

    /// Parses a decoded envelope.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The data is shorter than tag plus salt
    /// - The tag is rejected by `policy`
    /// - The ciphertext is empty or not block aligned
    pub fn from_bytes(data: &[u8], policy: MagicPolicy) -> Result<Self, CryptError> {
        if data.len() < Self::HEADER_LEN {
            return Err(CryptError::Truncated { len: data.len() });
        }

        let (tag, rest) = data.split_at(MAGIC_LEN);
        if !policy.accepts(tag) {
            return Err(CryptError::UnknownTag);
        }

        let (salt, ciphertext) = rest.split_at(SALT_LEN);
        if ciphertext.is_empty() || ciphertext.len() % BLOCK_LEN != 0 {
            return Err(CryptError::MisalignedCiphertext {
                len: ciphertext.len(),
            });
        }

        let tag: [u8; MAGIC_LEN] = tag
            .try_into()
            .map_err(|_| CryptError::Truncated { len: data.len() })?;
        let salt: [u8; SALT_LEN] = salt
            .try_into()
            .map_err(|_| CryptError::Truncated { len: data.len() })?;

        tracing::debug!(ciphertext_len = ciphertext.len(), "parsed envelope");

        Ok(Self {
            tag,
            salt,
            ciphertext: ciphertext.to_vec(),
        })
    }

    pub fn from_base64(payload: &str, policy: MagicPolicy) -> Result<Self, CryptError> {
        let data = STANDARD.decode(payload.trim())?;
        Self::from_bytes(&data, policy)
    }
}
