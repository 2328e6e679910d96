//! Token configuration.
//!
//! Keys are resolved from an environment variable first, then from a file.
//! Both hold the Base64 string form of the key.

use crate::builder::TokenBuilder;
use crate::error::{Result, TokenError};
use crate::keys::{PrivateKey, PublicKey};
use crate::token::DEFAULT_VALIDITY_SECS;
use crate::verifier::TokenVerifier;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for issuing and verifying tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Application id placed in issued tokens.
    #[serde(default)]
    pub app_id: Option<String>,

    /// Environment variable containing the private key.
    #[serde(default)]
    pub private_key_env: Option<String>,

    /// Path to the private key file.
    #[serde(default)]
    pub private_key_file: Option<PathBuf>,

    /// Environment variable containing the public key.
    #[serde(default)]
    pub public_key_env: Option<String>,

    /// Path to the public key file.
    #[serde(default)]
    pub public_key_file: Option<PathBuf>,

    /// Lifetime of issued tokens, in seconds.
    #[serde(default = "default_validity_secs")]
    pub validity_secs: u32,

    /// Clock skew tolerated when checking expiration, in seconds.
    #[serde(default)]
    pub leeway_secs: u32,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            app_id: None,
            private_key_env: None,
            private_key_file: None,
            public_key_env: None,
            public_key_file: None,
            validity_secs: default_validity_secs(),
            leeway_secs: 0,
        }
    }
}

impl TokenConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        toml::from_str(source).map_err(|e| TokenError::Config(e.to_string()))
    }

    /// Load a TOML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Resolve the private key from environment or file.
    pub fn resolve_private_key(&self) -> Result<Option<PrivateKey>> {
        resolve_key(self.private_key_env.as_deref(), self.private_key_file.as_deref())?
            .map(|encoded| PrivateKey::from_encoded(&encoded))
            .transpose()
    }

    /// Resolve the public key from environment or file.
    pub fn resolve_public_key(&self) -> Result<Option<PublicKey>> {
        resolve_key(self.public_key_env.as_deref(), self.public_key_file.as_deref())?
            .map(|encoded| PublicKey::from_encoded(&encoded))
            .transpose()
    }

    pub fn validity(&self) -> Duration {
        Duration::seconds(i64::from(self.validity_secs))
    }

    pub fn leeway(&self) -> Duration {
        Duration::seconds(i64::from(self.leeway_secs))
    }

    /// Builder for the configured application and private key.
    pub fn builder(&self) -> Result<TokenBuilder> {
        let app_id = self
            .app_id
            .clone()
            .ok_or_else(|| TokenError::Config("app_id is not set".to_string()))?;
        let key = self
            .resolve_private_key()?
            .ok_or_else(|| TokenError::Config("no private key configured".to_string()))?;

        Ok(TokenBuilder::new(app_id, key).with_validity(self.validity()))
    }

    /// Verifier for the configured public key.
    ///
    /// Falls back to deriving the public key from the private key. When an
    /// app id is configured, tokens for other applications are rejected.
    pub fn verifier(&self) -> Result<TokenVerifier> {
        let public_key = match self.resolve_public_key()? {
            Some(key) => key,
            None => self
                .resolve_private_key()?
                .map(|key| key.public_key())
                .ok_or_else(|| TokenError::Config("no public key configured".to_string()))?,
        };

        let mut verifier = TokenVerifier::new(public_key).with_leeway(self.leeway());
        if let Some(app_id) = &self.app_id {
            verifier = verifier.expect_application(app_id.clone());
        }
        Ok(verifier)
    }
}

fn resolve_key(env: Option<&str>, file: Option<&Path>) -> Result<Option<String>> {
    // Try environment variable first
    if let Some(env_var) = env {
        if let Ok(key) = std::env::var(env_var) {
            return Ok(Some(key.trim().to_string()));
        }
    }

    // Try file path
    if let Some(path) = file {
        if path.exists() {
            let key = std::fs::read_to_string(path)?;
            return Ok(Some(key.trim().to_string()));
        }
    }

    Ok(None)
}

fn default_validity_secs() -> u32 {
    DEFAULT_VALIDITY_SECS as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::KeyPair;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = TokenConfig::default();
        assert_eq!(config.validity_secs, 900);
        assert_eq!(config.validity(), Duration::minutes(15));
        assert_eq!(config.leeway(), Duration::zero());
        assert!(config.resolve_private_key().unwrap().is_none());
        assert!(config.resolve_public_key().unwrap().is_none());
    }

    #[test]
    fn test_from_toml() {
        let config = TokenConfig::from_toml_str(
            r#"
            app_id = "5c1c4a8e-0000-4000-8000-000000000000"
            private_key_file = "/etc/bntoken/private.key"
            validity_secs = 60
            "#,
        )
        .unwrap();
        assert_eq!(config.app_id.as_deref(), Some("5c1c4a8e-0000-4000-8000-000000000000"));
        assert_eq!(config.validity_secs, 60);
        assert_eq!(config.leeway_secs, 0);
        assert_eq!(
            config.private_key_file.as_deref(),
            Some(Path::new("/etc/bntoken/private.key"))
        );
    }

    #[test]
    fn test_from_toml_rejects_bad_types() {
        let err = TokenConfig::from_toml_str("validity_secs = \"soon\"").unwrap_err();
        assert!(matches!(err, TokenError::Config(_)));
    }

    #[test]
    fn test_resolve_keys_from_files() {
        let dir = tempdir().unwrap();
        let private_path = dir.path().join("private.key");
        let public_path = dir.path().join("public.key");
        let keypair = KeyPair::generate();
        keypair.save_to_files(&private_path, &public_path).unwrap();

        let config = TokenConfig {
            private_key_file: Some(private_path),
            public_key_file: Some(public_path),
            ..Default::default()
        };

        let private = config.resolve_private_key().unwrap().unwrap();
        let public = config.resolve_public_key().unwrap().unwrap();
        assert_eq!(private.public_key(), public);
    }

    #[test]
    fn test_env_takes_precedence_over_file() {
        let dir = tempdir().unwrap();
        let file_key = KeyPair::generate();
        let env_key = KeyPair::generate();
        let private_path = dir.path().join("private.key");
        std::fs::write(&private_path, file_key.private_key().encode()).unwrap();

        // SAFETY: the variable name is unique to this test
        unsafe {
            std::env::set_var("BNTOKEN_TEST_PRIVATE_KEY", env_key.private_key().encode());
        }

        let config = TokenConfig {
            private_key_env: Some("BNTOKEN_TEST_PRIVATE_KEY".to_string()),
            private_key_file: Some(private_path),
            ..Default::default()
        };
        let resolved = config.resolve_private_key().unwrap().unwrap();
        assert_eq!(resolved.public_key(), *env_key.public_key());
    }

    #[test]
    fn test_missing_file_resolves_to_none() {
        let config = TokenConfig {
            public_key_file: Some(PathBuf::from("/nonexistent/public.key")),
            ..Default::default()
        };
        assert!(config.resolve_public_key().unwrap().is_none());
    }

    #[test]
    fn test_builder_and_verifier() {
        let dir = tempdir().unwrap();
        let private_path = dir.path().join("private.key");
        std::fs::write(&private_path, PrivateKey::generate().encode()).unwrap();

        let config = TokenConfig {
            app_id: Some("app".to_string()),
            private_key_file: Some(private_path),
            validity_secs: 30,
            ..Default::default()
        };

        let builder = config.builder().unwrap();
        assert_eq!(builder.validity(), Duration::seconds(30));

        // Public key derived from the private key when none is configured
        let token = config
            .verifier()
            .unwrap()
            .verify(&builder.issue_user_token("bob").unwrap())
            .unwrap();
        assert_eq!(token.app_id(), "app");
    }

    #[test]
    fn test_builder_requires_app_id_and_key() {
        let config = TokenConfig::default();
        assert!(matches!(config.builder(), Err(TokenError::Config(_))));
        assert!(matches!(config.verifier(), Err(TokenError::Config(_))));
    }
}
