//! EVP_BytesToKey-style key derivation.
//!
//! Reproduces CryptoJS `EvpKDF`: each block is `H(previous || password || salt)`,
//! re-hashed `iterations - 1` times, and blocks are concatenated until the
//! key and IV are covered.

use std::fmt;
use std::str::FromStr;

use md5::Md5;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use sha2::digest::{Digest, Output};
use zeroize::Zeroizing;

use super::{SALT_LEN, WORD_LEN};
use crate::error::CryptError;

/// Hash function driving the derivation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    #[default]
    Md5,
    Sha256,
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashAlgorithm::Md5 => f.write_str("md5"),
            HashAlgorithm::Sha256 => f.write_str("sha256"),
        }
    }
}

impl FromStr for HashAlgorithm {
    type Err = CryptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "md5" => Ok(HashAlgorithm::Md5),
            "sha256" | "sha-256" => Ok(HashAlgorithm::Sha256),
            other => Err(CryptError::InvalidParameter(format!(
                "unsupported hash algorithm '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    key_size_words: usize,
    iv_size_words: usize,
    iterations: u32,
    hash: HashAlgorithm,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            // AES-256 key
            key_size_words: 8,
            // 128-bit CBC IV
            iv_size_words: 4,
            iterations: 1,
            hash: HashAlgorithm::Md5,
        }
    }
}

impl KdfParams {
    pub fn new(
        key_size_words: usize,
        iv_size_words: usize,
        iterations: u32,
        hash: HashAlgorithm,
    ) -> Result<Self, CryptError> {
        let params = Self {
            key_size_words,
            iv_size_words,
            iterations,
            hash,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn key_size_words(&self) -> usize {
        self.key_size_words
    }

    pub fn iv_size_words(&self) -> usize {
        self.iv_size_words
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn hash(&self) -> HashAlgorithm {
        self.hash
    }

    pub fn key_len(&self) -> usize {
        self.key_size_words * WORD_LEN
    }

    pub fn iv_len(&self) -> usize {
        self.iv_size_words * WORD_LEN
    }

    pub fn validate(&self) -> Result<(), CryptError> {
        if self.key_size_words < 1 {
            return Err(CryptError::InvalidParameter(
                "key size must be at least one word".into(),
            ));
        }
        if self.iterations < 1 {
            return Err(CryptError::InvalidParameter(
                "iteration count must be >= 1".into(),
            ));
        }
        Ok(())
    }
}

/// Key and IV split out of the derived byte stream.
pub struct DerivedKeyMaterial {
    key: Zeroizing<Vec<u8>>,
    iv: Zeroizing<Vec<u8>>,
}

impl DerivedKeyMaterial {
    pub fn key(&self) -> &[u8] {
        &self.key
    }

    pub fn iv(&self) -> &[u8] {
        &self.iv
    }
}

impl fmt::Debug for DerivedKeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedKeyMaterial")
            .field("key_len", &self.key.len())
            .field("iv_len", &self.iv.len())
            .finish()
    }
}

pub fn derive_key_and_iv(
    password: &[u8],
    salt: &[u8; SALT_LEN],
    params: KdfParams,
) -> Result<DerivedKeyMaterial, CryptError> {
    params.validate()?;

    tracing::debug!(
        hash = %params.hash,
        iterations = params.iterations,
        key_len = params.key_len(),
        iv_len = params.iv_len(),
        "deriving key material"
    );

    let derived = match params.hash {
        HashAlgorithm::Md5 => evp_bytes_to_key::<Md5>(password, salt, &params),
        HashAlgorithm::Sha256 => evp_bytes_to_key::<Sha256>(password, salt, &params),
    };

    let (key, iv) = derived.split_at(params.key_len());
    Ok(DerivedKeyMaterial {
        key: Zeroizing::new(key.to_vec()),
        iv: Zeroizing::new(iv.to_vec()),
    })
}

fn evp_bytes_to_key<D: Digest>(
    password: &[u8],
    salt: &[u8],
    params: &KdfParams,
) -> Zeroizing<Vec<u8>> {
    let target = params.key_len() + params.iv_len();
    let mut derived = Zeroizing::new(Vec::with_capacity(target));
    let mut previous: Option<Output<D>> = None;

    while derived.len() < target {
        let mut hasher = D::new();
        if let Some(block) = &previous {
            hasher.update(block.as_slice());
        }
        hasher.update(password);
        hasher.update(salt);
        let mut block = hasher.finalize();

        for _ in 1..params.iterations {
            block = D::digest(block.as_slice());
        }

        let take = block.len().min(target - derived.len());
        derived.extend_from_slice(&block[..take]);
        previous = Some(block);
    }

    derived
}
