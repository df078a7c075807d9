//! Runtime configuration.
//!
//! Values are layered: built-in defaults, then a JSON config file, then
//! `SAILCRYPT_*` environment variables.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::{MagicPolicy, TransportCipher};

pub const PASSPHRASE_ENV: &str = "SAILCRYPT_PASSPHRASE";
pub const MAGIC_POLICY_ENV: &str = "SAILCRYPT_MAGIC_POLICY";
pub const SOFTWARE_ENV: &str = "SAILCRYPT_SOFTWARE";

const DEFAULT_SOFTWARE: &str = concat!("sailcrypt ", env!("CARGO_PKG_VERSION"));

#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Application passphrase shared with the API for credential transport.
    passphrase: Option<String>,
    magic_policy: MagicPolicy,
    /// Software identification sent with login requests.
    software: Option<String>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("passphrase", &self.passphrase.as_ref().map(|_| "<redacted>"))
            .field("magic_policy", &self.magic_policy)
            .field("software", &self.software)
            .finish()
    }
}

impl Config {
    /// Loads the config file and applies environment overrides.
    ///
    /// An explicit `path` must exist; the platform default is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(p) => Self::from_file(p)?,
            None => match default_config_path() {
                Ok(p) if p.exists() => Self::from_file(&p)?,
                _ => Self::default(),
            },
        };

        config.with_overrides(|name| std::env::var(name).ok())
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config = serde_json::from_str(&data)
            .with_context(|| format!("invalid config file {}", path.display()))?;

        tracing::debug!(path = %path.display(), "loaded config file");
        Ok(config)
    }

    /// Applies `SAILCRYPT_*` values returned by `lookup`; empty values are ignored.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| lookup(name).filter(|v| !v.is_empty());

        if let Some(passphrase) = lookup(PASSPHRASE_ENV) {
            self.passphrase = Some(passphrase);
        }
        if let Some(policy) = lookup(MAGIC_POLICY_ENV) {
            self.magic_policy = policy
                .parse()
                .with_context(|| format!("invalid {MAGIC_POLICY_ENV}"))?;
        }
        if let Some(software) = lookup(SOFTWARE_ENV) {
            self.software = Some(software);
        }

        Ok(self)
    }

    pub fn with_magic_policy(mut self, policy: MagicPolicy) -> Self {
        self.magic_policy = policy;
        self
    }

    pub fn magic_policy(&self) -> MagicPolicy {
        self.magic_policy
    }

    pub fn has_passphrase(&self) -> bool {
        self.passphrase.is_some()
    }

    pub fn software(&self) -> &str {
        self.software.as_deref().unwrap_or(DEFAULT_SOFTWARE)
    }

    pub fn transport_cipher(&self) -> Result<TransportCipher> {
        let Some(passphrase) = &self.passphrase else {
            bail!(
                "no transport passphrase configured; set {PASSPHRASE_ENV} or add \"passphrase\" to the config file"
            );
        };

        let cipher = TransportCipher::new(Zeroizing::new(passphrase.clone()));
        Ok(cipher.with_magic_policy(self.magic_policy))
    }
}

pub fn default_config_path() -> Result<PathBuf> {
    let project_dirs =
        ProjectDirs::from("", "", "sailcrypt").context("could not determine platform directories")?;

    Ok(project_dirs.config_dir().join("config.json"))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use tempfile::tempdir;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn defaults_have_no_passphrase() {
        let config = Config::default();

        assert!(!config.has_passphrase());
        assert_eq!(config.magic_policy(), MagicPolicy::Strict);
        assert!(config.software().starts_with("sailcrypt "));
        assert!(config.transport_cipher().is_err());
    }

    #[test]
    fn file_values_are_loaded() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"passphrase": "from-file", "magic_policy": "lenient", "software": "club-sync"}"#,
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert!(config.has_passphrase());
        assert_eq!(config.magic_policy(), MagicPolicy::Lenient);
        assert_eq!(config.software(), "club-sync");
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"passphrase": "from-file"}"#).unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.magic_policy(), MagicPolicy::Strict);
    }

    #[test]
    fn unknown_field_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"pasphrase": "typo"}"#).unwrap();

        assert!(Config::from_file(&path).is_err());
    }

    #[test]
    fn explicit_missing_file_fails() {
        let dir = tempdir().unwrap();
        assert!(Config::load(Some(dir.path().join("missing.json").as_path())).is_err());
    }

    #[test]
    fn env_overrides_file() {
        let config = Config::default()
            .with_overrides(env(&[
                (PASSPHRASE_ENV, "from-env"),
                (MAGIC_POLICY_ENV, "lenient"),
                (SOFTWARE_ENV, "env-software"),
            ]))
            .unwrap();

        assert!(config.has_passphrase());
        assert_eq!(config.magic_policy(), MagicPolicy::Lenient);
        assert_eq!(config.software(), "env-software");
    }

    #[test]
    fn empty_env_values_are_ignored() {
        let config = Config::default()
            .with_overrides(env(&[(PASSPHRASE_ENV, "")]))
            .unwrap();

        assert!(!config.has_passphrase());
    }

    #[test]
    fn invalid_policy_env_fails() {
        let result = Config::default().with_overrides(env(&[(MAGIC_POLICY_ENV, "loose")]));
        assert!(result.is_err());
    }

    #[test]
    fn transport_cipher_uses_configured_passphrase() {
        let config = Config::default()
            .with_overrides(env(&[(PASSPHRASE_ENV, "app-key")]))
            .unwrap()
            .with_magic_policy(MagicPolicy::Lenient);

        let cipher = config.transport_cipher().unwrap();
        assert_eq!(cipher.magic_policy(), MagicPolicy::Lenient);

        let payload = cipher.encrypt("pw").unwrap();
        assert_eq!(crate::decrypt(&payload, "app-key"), "pw");
    }

    #[test]
    fn debug_redacts_passphrase() {
        let config = Config::default()
            .with_overrides(env(&[(PASSPHRASE_ENV, "top-secret")]))
            .unwrap();

        assert!(!format!("{config:?}").contains("top-secret"));
    }
}
