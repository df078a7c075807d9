//! Request bodies that carry encrypted secrets to the federation API.
//!
//! Only the JSON shape lives here; sending it is up to the caller's HTTP client.

use serde::Serialize;

use crate::{CryptError, TransportCipher};

/// Body of a username/password login.
#[derive(Debug, Clone, Serialize)]
pub struct UserLogin {
    username: String,
    password: String,
    software: String,
}

impl UserLogin {
    pub fn new(
        cipher: &TransportCipher,
        username: &str,
        password: &str,
        software: &str,
    ) -> Result<Self, CryptError> {
        Ok(Self {
            username: username.to_string(),
            password: cipher.encrypt(password)?,
            software: software.to_string(),
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// The encrypted password envelope.
    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn software(&self) -> &str {
        &self.software
    }
}

/// Body of a login with a system token and its secret.
#[derive(Debug, Clone, Serialize)]
pub struct SystemLogin {
    system: String,
    secret: String,
    software: String,
}

impl SystemLogin {
    pub fn new(
        cipher: &TransportCipher,
        system_token: &str,
        secret: &str,
        software: &str,
    ) -> Result<Self, CryptError> {
        Ok(Self {
            system: system_token.to_string(),
            secret: cipher.encrypt(secret)?,
            software: software.to_string(),
        })
    }

    pub fn system(&self) -> &str {
        &self.system
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn software(&self) -> &str {
        &self.software
    }
}

/// Body requesting a new system token protected by `secret`.
#[derive(Debug, Clone, Serialize)]
pub struct SystemTokenRequest {
    secret: String,
    title: String,
}

impl SystemTokenRequest {
    pub fn new(cipher: &TransportCipher, secret: &str, title: &str) -> Result<Self, CryptError> {
        Ok(Self {
            secret: cipher.encrypt(secret)?,
            title: title.to_string(),
        })
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn title(&self) -> &str {
        &self.title
    }
}
