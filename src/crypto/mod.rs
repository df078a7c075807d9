//! Cryptographic primitives for the transport envelope.
//!
//! Provides the EVP-style key derivation, AES-256-CBC and the salted
//! envelope container produced by CryptoJS `AES.encrypt` with a string key.

pub mod cipher;
pub mod envelope;
pub mod kdf;

pub use cipher::generate_salt;
pub use envelope::{Envelope, MagicPolicy};
pub use kdf::{DerivedKeyMaterial, HashAlgorithm, KdfParams, derive_key_and_iv};

use zeroize::Zeroizing;

use crate::error::CryptError;

/// Length of the salt (8 bytes).
pub const SALT_LEN: usize = 8;
/// Length of the envelope tag (8 bytes "Salted__").
pub const MAGIC_LEN: usize = 8;
/// AES block size (16 bytes).
pub const BLOCK_LEN: usize = 16;
/// Length of the AES-256 key (32 bytes / 256 bits).
pub const KEY_LEN: usize = 32;
/// Length of the CBC initialization vector (16 bytes).
pub const IV_LEN: usize = 16;
/// KDF sizes are expressed in 32-bit words.
pub const WORD_LEN: usize = 4;

/// Tag written in front of every envelope.
pub const MAGIC: &[u8; MAGIC_LEN] = b"Salted__";
/// Tag emitted by the first-generation PHP client; accepted on decode only.
pub const LEGACY_MAGIC: &[u8; MAGIC_LEN] = b"OfSaIApI";

/// Encrypts `plaintext` under a key and IV derived from `passphrase` and `salt`.
///
/// Deterministic for a given salt; [`crate::encrypt`] supplies a fresh one.
pub fn seal(
    plaintext: &[u8],
    passphrase: &[u8],
    salt: [u8; SALT_LEN],
) -> Result<Envelope, CryptError> {
    let material = derive_key_and_iv(passphrase, &salt, KdfParams::default())?;
    let ciphertext = cipher::encrypt(material.key(), material.iv(), plaintext)?;

    Ok(Envelope::new(salt, ciphertext))
}

/// Recovers the plaintext of a parsed envelope.
pub fn open(envelope: &Envelope, passphrase: &[u8]) -> Result<Zeroizing<Vec<u8>>, CryptError> {
    let material = derive_key_and_iv(passphrase, envelope.salt(), KdfParams::default())?;
    cipher::decrypt(material.key(), material.iv(), envelope.ciphertext())
}
