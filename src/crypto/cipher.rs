use aes::Aes256;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit, block_padding::Pkcs7};
use getrandom::fill;
use zeroize::Zeroizing;

use super::SALT_LEN;
use crate::error::CryptError;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// Fill buffer with cryptographically secure random bytes
fn secure_random(buf: &mut [u8]) -> Result<(), CryptError> {
    fill(buf).map_err(|_| CryptError::Random)
}

/// Generate salt
pub fn generate_salt() -> Result<[u8; SALT_LEN], CryptError> {
    let mut salt = [0u8; SALT_LEN];
    secure_random(&mut salt)?;
    Ok(salt)
}

/// Encrypt plaintext with AES-256-CBC and PKCS#7 padding
pub fn encrypt(key: &[u8], iv: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, CryptError> {
    let cipher = Aes256CbcEnc::new_from_slices(key, iv).map_err(|_| CryptError::CipherInit)?;

    Ok(cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
}

/// Decrypt ciphertext and strip PKCS#7 padding
pub fn decrypt(key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Zeroizing<Vec<u8>>, CryptError> {
    let cipher = Aes256CbcDec::new_from_slices(key, iv).map_err(|_| CryptError::CipherInit)?;

    let plaintext = cipher
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| CryptError::Decrypt)?;
    Ok(Zeroizing::new(plaintext))
}
