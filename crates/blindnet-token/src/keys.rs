//! Ed25519 keys for signing and verifying tokens.

use crate::codec;
use crate::error::{Result, TokenError};
use crate::token::Token;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::RngCore;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Length of a raw Ed25519 key, private seed or public point.
pub const KEY_LENGTH: usize = 32;

/// Length of a raw Ed25519 signature.
pub const SIGNATURE_LENGTH: usize = 64;

/// An Ed25519 private key that signs tokens.
#[derive(Clone)]
pub struct PrivateKey {
    inner: SigningKey,
}

impl PrivateKey {
    /// Generate a new random key.
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let mut seed = [0u8; KEY_LENGTH];
        rng.fill_bytes(&mut seed);

        Self {
            inner: SigningKey::from_bytes(&seed),
        }
    }

    /// Load a key from its raw 32-byte seed.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let seed: [u8; KEY_LENGTH] = bytes.try_into().map_err(|_| {
            TokenError::InvalidPrivateKey(format!(
                "expected {KEY_LENGTH} bytes, found {}",
                bytes.len()
            ))
        })?;

        Ok(Self {
            inner: SigningKey::from_bytes(&seed),
        })
    }

    /// Load a key from its Base64 string form.
    pub fn from_encoded(encoded: &str) -> Result<Self> {
        let bytes = codec::decode_key(encoded)
            .map_err(|e| TokenError::InvalidPrivateKey(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    /// Load a key from a file containing its Base64 string form.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let encoded = std::fs::read_to_string(path)?;
        Self::from_encoded(encoded.trim())
    }

    /// Sign arbitrary bytes.
    pub fn sign_raw(&self, data: &[u8]) -> [u8; SIGNATURE_LENGTH] {
        self.inner.sign(data).to_bytes()
    }

    /// Sign a token over its canonical form, returning it with the signature attached.
    pub fn sign(&self, token: Token) -> Result<Token> {
        let signature = self.sign_raw(token.canonical_form()?.as_bytes());
        Ok(token.signed(signature.to_vec()))
    }

    /// The matching public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey::from_private(self)
    }

    /// Raw 32-byte seed.
    pub fn to_bytes(&self) -> [u8; KEY_LENGTH] {
        self.inner.to_bytes()
    }

    /// Base64 string form, for persistence.
    pub fn encode(&self) -> String {
        codec::encode_key(&self.inner.to_bytes())
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("public", &self.public_key().encode())
            .finish_non_exhaustive()
    }
}

impl FromStr for PrivateKey {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_encoded(s)
    }
}

/// An Ed25519 public key that verifies token signatures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    inner: VerifyingKey,
}

impl PublicKey {
    /// Derive the public key of a private key.
    pub fn from_private(private: &PrivateKey) -> Self {
        Self {
            inner: private.inner.verifying_key(),
        }
    }

    /// Load a key from its raw 32-byte encoding.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let point: [u8; KEY_LENGTH] = bytes.try_into().map_err(|_| {
            TokenError::InvalidPublicKey(format!(
                "expected {KEY_LENGTH} bytes, found {}",
                bytes.len()
            ))
        })?;

        let inner = VerifyingKey::from_bytes(&point)
            .map_err(|e| TokenError::InvalidPublicKey(e.to_string()))?;
        Ok(Self { inner })
    }

    /// Load a key from its Base64 string form.
    pub fn from_encoded(encoded: &str) -> Result<Self> {
        let bytes = codec::decode_key(encoded)
            .map_err(|e| TokenError::InvalidPublicKey(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    /// Load a key from a file containing its Base64 string form.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let encoded = std::fs::read_to_string(path)?;
        Self::from_encoded(encoded.trim())
    }

    /// Check a signature over arbitrary bytes.
    ///
    /// Signatures of the wrong length are reported as invalid.
    pub fn verify_raw(&self, data: &[u8], signature: &[u8]) -> bool {
        let Ok(signature) = Signature::from_slice(signature) else {
            return false;
        };
        self.inner.verify(data, &signature).is_ok()
    }

    /// Check a token's signature against its canonical form.
    ///
    /// Fails only if the token carries no signature at all.
    pub fn verify(&self, token: &Token) -> Result<bool> {
        let signature = token.signature().ok_or(TokenError::MissingSignature)?;
        Ok(self.verify_raw(token.canonical_form()?.as_bytes(), signature))
    }

    /// Raw 32-byte encoding.
    pub fn to_bytes(&self) -> [u8; KEY_LENGTH] {
        self.inner.to_bytes()
    }

    /// Base64 string form, for persistence.
    pub fn encode(&self) -> String {
        codec::encode_key(self.inner.as_bytes())
    }
}

impl From<&PrivateKey> for PublicKey {
    fn from(private: &PrivateKey) -> Self {
        Self::from_private(private)
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for PublicKey {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_encoded(s)
    }
}

/// A private key together with its public half.
#[derive(Debug, Clone)]
pub struct KeyPair {
    private: PrivateKey,
    public: PublicKey,
}

impl KeyPair {
    /// Generate a new random keypair.
    pub fn generate() -> Self {
        Self::from_private(PrivateKey::generate())
    }

    /// Create a keypair from an existing private key.
    pub fn from_private(private: PrivateKey) -> Self {
        let public = private.public_key();
        Self { private, public }
    }

    pub fn private_key(&self) -> &PrivateKey {
        &self.private
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    pub fn into_private_key(self) -> PrivateKey {
        self.private
    }

    /// Save the keypair to files.
    pub fn save_to_files(&self, private_key_path: &Path, public_key_path: &Path) -> Result<()> {
        std::fs::write(private_key_path, self.private.encode())?;
        std::fs::write(public_key_path, self.public.encode())?;
        Ok(())
    }

    /// Load a keypair from a private key file.
    pub fn load_from_file(private_key_path: &Path) -> Result<Self> {
        Ok(Self::from_private(PrivateKey::load_from_file(private_key_path)?))
    }
}
