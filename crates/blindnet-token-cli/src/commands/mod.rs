//! CLI command implementations for bntoken.

pub mod keys;
pub mod token;

use anyhow::Context;
use blindnet_token::{PrivateKey, PublicKey, TokenConfig};
use std::fs;
use std::path::Path;

/// Resolve a private key from a path, a Base64 string, or the configuration.
pub fn resolve_private_key(key: Option<String>, config: &TokenConfig) -> anyhow::Result<PrivateKey> {
    let Some(key_str) = key else {
        return config.resolve_private_key()?.context(
            "Private key not provided. Either pass --key <path> or set BNTOKEN_PRIVATE_KEY env var",
        );
    };

    // If it looks like a file path and the file exists, load from file
    let path = Path::new(&key_str);
    if path.exists() {
        return PrivateKey::load_from_file(path)
            .with_context(|| format!("Failed to load private key from file: {}", path.display()));
    }

    PrivateKey::from_encoded(key_str.trim())
        .context("Failed to parse private key. Expected Base64-encoded Ed25519 private key")
}

/// Resolve a public key from a path, a Base64 string, or the configuration.
///
/// Without an explicit key, the configured public key is used, then the
/// public half of the configured private key.
pub fn resolve_public_key(key: Option<String>, config: &TokenConfig) -> anyhow::Result<PublicKey> {
    let Some(key_str) = key else {
        if let Some(public) = config.resolve_public_key()? {
            return Ok(public);
        }
        return config
            .resolve_private_key()?
            .map(|private| private.public_key())
            .context("Public key not provided. Either pass --key <path> or set BNTOKEN_PUBLIC_KEY env var");
    };

    let path = Path::new(&key_str);
    if path.exists() {
        return PublicKey::load_from_file(path)
            .with_context(|| format!("Failed to load public key from file: {}", path.display()));
    }

    PublicKey::from_encoded(key_str.trim())
        .context("Failed to parse public key. Expected Base64-encoded Ed25519 public key")
}

/// Read a token argument, which may be a path to a file holding the token.
pub fn read_token(token: String) -> anyhow::Result<String> {
    if Path::new(&token).exists() {
        Ok(fs::read_to_string(&token)?.trim().to_string())
    } else {
        Ok(token.trim().to_string())
    }
}
