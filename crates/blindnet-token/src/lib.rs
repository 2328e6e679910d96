//! # blindnet-token
//!
//! Compact, Ed25519-signed tokens for multi-tenant applications.
//!
//! A token asserts an application identity and, for user tokens, a user
//! identity. It expires after a bounded lifetime and is signed with the
//! application's private key.
//!
//! ## Token Kinds
//!
//! | Kind | `typ` | Carries user id |
//! |------|-------|-----------------|
//! | **Application** | `app` | no |
//! | **User** | `user` | yes |
//! | **Anonymous** | `anon` | no |
//!
//! ## Wire Format
//!
//! `b64url(header).b64url(payload).b64url(signature)`, all segments unpadded.
//! The header is `{"alg":"EdDSA","typ":...}`, the payload
//! `{"app":...,"exp":...,"uid":...}` with `uid` omitted for non-user tokens.
//!
//! ```no_run
//! use blindnet_token::{PrivateKey, Token, TokenBuilder};
//!
//! # fn main() -> Result<(), blindnet_token::TokenError> {
//! let key = PrivateKey::generate();
//! let public_key = key.public_key();
//!
//! let builder = TokenBuilder::new("3f1b6f5e-8f0c-4a57-9a55-0f3c8e6b2d11", key);
//! let raw = builder.issue_user_token("alice")?;
//!
//! let token = Token::parse(&raw)?;
//! assert!(public_key.verify(&token)?);
//! assert!(!token.is_expired());
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod codec;
pub mod config;
pub mod error;
pub mod keys;
pub mod token;
pub mod verifier;

pub use builder::TokenBuilder;
pub use config::TokenConfig;
pub use error::{Result, TokenError};
pub use keys::{KeyPair, PrivateKey, PublicKey};
pub use token::{ALGORITHM, Token, TokenKind};
pub use verifier::{TokenInfo, TokenVerifier, inspect_token_unverified};
