//! Error types for token issuance and verification.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T, E = TokenError> = std::result::Result<T, E>;

/// Errors that can occur while building, parsing or verifying tokens.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Wire string does not have exactly three segments.
    #[error("malformed token: expected 3 segments, found {segments}")]
    MalformedToken { segments: usize },

    /// A segment or key is not valid Base64.
    #[error("invalid encoding: {0}")]
    InvalidEncoding(String),

    /// Header or payload JSON has the wrong shape.
    #[error("invalid token json: {0}")]
    InvalidJson(String),

    /// Header `typ` is not a known token kind.
    #[error("unknown token kind: {0}")]
    UnknownKind(String),

    /// Header `alg` is anything other than `EdDSA`.
    #[error("unsupported token algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// User id present on a non-user token, or missing on a user token.
    #[error("inconsistent token claims: {0}")]
    InconsistentClaims(String),

    /// Failed to parse private key.
    #[error("failed to parse private key: {0}")]
    InvalidPrivateKey(String),

    /// Failed to parse public key.
    #[error("failed to parse public key: {0}")]
    InvalidPublicKey(String),

    /// Token has no signature attached.
    #[error("token signature is missing")]
    MissingSignature,

    /// Signature does not match the token contents.
    #[error("token signature is invalid")]
    InvalidSignature,

    /// Token has expired.
    #[error("token has expired at {expired_at}")]
    Expired { expired_at: String },

    /// Token was issued for a different application.
    #[error("token issued for application {actual}, expected {expected}")]
    ApplicationMismatch { expected: String, actual: String },

    /// Expiration instant falls outside the representable time range.
    #[error("token expiration out of range: now + {validity}")]
    ExpirationOutOfRange { validity: String },

    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error (reading/writing keys or config).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TokenError {
    /// Malformed input: wire strings, segments, JSON, kinds, algorithms, keys.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            TokenError::MalformedToken { .. }
                | TokenError::InvalidEncoding(_)
                | TokenError::InvalidJson(_)
                | TokenError::UnknownKind(_)
                | TokenError::UnsupportedAlgorithm(_)
                | TokenError::InconsistentClaims(_)
                | TokenError::InvalidPrivateKey(_)
                | TokenError::InvalidPublicKey(_)
        )
    }

    /// Operation attempted on a token that is not in the right state for it.
    pub fn is_state_error(&self) -> bool {
        matches!(self, TokenError::MissingSignature)
    }
}

impl From<base64::DecodeError> for TokenError {
    fn from(e: base64::DecodeError) -> Self {
        TokenError::InvalidEncoding(e.to_string())
    }
}

impl From<serde_json::Error> for TokenError {
    fn from(e: serde_json::Error) -> Self {
        TokenError::InvalidJson(e.to_string())
    }
}
