//! Token verification.

use crate::codec::{self, Header, Payload};
use crate::error::{Result, TokenError};
use crate::keys::PublicKey;
use crate::token::Token;
use chrono::{Duration, Utc};

/// Verifier for wire tokens issued by one application key.
#[derive(Debug, Clone)]
pub struct TokenVerifier {
    public_key: PublicKey,
    leeway: Duration,
    expected_app_id: Option<String>,
}

impl TokenVerifier {
    /// Create a new token verifier with the given public key.
    pub fn new(public_key: PublicKey) -> Self {
        Self {
            public_key,
            leeway: Duration::zero(),
            expected_app_id: None,
        }
    }

    /// Accept tokens up to `leeway` past their expiration.
    pub fn with_leeway(mut self, leeway: Duration) -> Self {
        self.leeway = leeway;
        self
    }

    /// Reject tokens issued for any other application.
    pub fn expect_application(mut self, app_id: impl Into<String>) -> Self {
        self.expected_app_id = Some(app_id.into());
        self
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Parse a token and check its signature, expiration and application.
    pub fn verify(&self, raw: &str) -> Result<Token> {
        let token = Token::parse(raw)?;

        if !self.public_key.verify(&token)? {
            tracing::warn!(
                kind = %token.kind(),
                app_id = %token.app_id(),
                "Rejected token with invalid signature"
            );
            return Err(TokenError::InvalidSignature);
        }

        let expired = match Utc::now().checked_sub_signed(self.leeway) {
            Some(cutoff) => token.is_expired_at(cutoff),
            // Cutoff out of range: a huge leeway accepts everything, a huge negative one nothing
            None => self.leeway < Duration::zero(),
        };
        if expired {
            tracing::debug!(
                kind = %token.kind(),
                app_id = %token.app_id(),
                expired_at = %token.expiration(),
                "Rejected expired token"
            );
            return Err(TokenError::Expired {
                expired_at: token.expiration().to_rfc3339(),
            });
        }

        if let Some(expected) = &self.expected_app_id {
            if token.app_id() != expected {
                tracing::warn!(
                    expected = %expected,
                    actual = %token.app_id(),
                    "Rejected token for another application"
                );
                return Err(TokenError::ApplicationMismatch {
                    expected: expected.clone(),
                    actual: token.app_id().to_string(),
                });
            }
        }

        Ok(token)
    }
}

/// Decoded token contents, for inspection.
#[derive(Debug, Clone)]
pub struct TokenInfo {
    pub header: Header,
    pub payload: Payload,
    /// Length of the decoded signature in bytes.
    pub signature_len: usize,
}

/// Decode a token without checking anything beyond its shape (for debugging).
pub fn inspect_token_unverified(raw: &str) -> Result<TokenInfo> {
    let segments: Vec<&str> = raw.split('.').collect();
    let [header, payload, signature] = segments.as_slice() else {
        return Err(TokenError::MalformedToken {
            segments: segments.len(),
        });
    };

    Ok(TokenInfo {
        header: codec::from_segment(header)?,
        payload: codec::from_segment(payload)?,
        signature_len: codec::decode_segment(signature)?.len(),
    })
}
