//! Token issuance for a single application.

use crate::error::{Result, TokenError};
use crate::keys::{KeyPair, PrivateKey, PublicKey};
use crate::token::{Token, TokenKind, default_validity};
use chrono::{Duration, Utc};
use uuid::Uuid;

/// Issues signed tokens for one application.
///
/// Tokens created by this builder expire after 15 minutes unless a different
/// validity is set with [`TokenBuilder::with_validity`].
#[derive(Debug, Clone)]
pub struct TokenBuilder {
    app_id: String,
    key: PrivateKey,
    validity: Duration,
}

impl TokenBuilder {
    /// Create a new token builder for the given application and signing key.
    pub fn new(app_id: impl Into<String>, key: PrivateKey) -> Self {
        Self {
            app_id: app_id.into(),
            key,
            validity: default_validity(),
        }
    }

    /// Create a builder for an application identified by UUID.
    pub fn for_application(app_id: Uuid, key: PrivateKey) -> Self {
        Self::new(app_id.to_string(), key)
    }

    /// Create a builder that signs with the private half of a keypair.
    pub fn from_keypair(app_id: impl Into<String>, keypair: KeyPair) -> Self {
        Self::new(app_id, keypair.into_private_key())
    }

    /// Override how long issued tokens stay valid.
    pub fn with_validity(mut self, validity: Duration) -> Self {
        self.validity = validity;
        self
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn validity(&self) -> Duration {
        self.validity
    }

    /// Public key matching the signing key, for handing to verifiers.
    pub fn public_key(&self) -> PublicKey {
        self.key.public_key()
    }

    /// Issue an application token.
    pub fn issue_application_token(&self) -> Result<String> {
        self.issue(TokenKind::Application, None)
    }

    /// Issue a token on behalf of a user.
    pub fn issue_user_token(&self, user_id: impl Into<String>) -> Result<String> {
        self.issue(TokenKind::User, Some(user_id.into()))
    }

    /// Issue an anonymous token.
    pub fn issue_anonymous_token(&self) -> Result<String> {
        self.issue(TokenKind::Anonymous, None)
    }

    /// Build, sign and render a token of the given kind.
    pub fn issue(&self, kind: TokenKind, user_id: Option<String>) -> Result<String> {
        let expiration = Utc::now().checked_add_signed(self.validity).ok_or_else(|| {
            TokenError::ExpirationOutOfRange {
                validity: self.validity.to_string(),
            }
        })?;
        let token = Token::new(kind, self.app_id.clone(), expiration, user_id)?;
        let rendered = self.key.sign(token)?.render()?;

        tracing::debug!(
            kind = %kind,
            app_id = %self.app_id,
            expires_at = %expiration.timestamp(),
            "Issued token"
        );
        Ok(rendered)
    }
}
