//! Token data model and wire format.
//!
//! A wire token is `b64(header).b64(payload).b64(signature)`. The first two
//! segments form the canonical form, which is the exact input to signing and
//! verification.

use crate::codec::{self, Header, Payload};
use crate::error::{Result, TokenError};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// The only signature algorithm tokens are issued with.
pub const ALGORITHM: &str = "EdDSA";

/// Lifetime of a token when no expiration is given.
pub const DEFAULT_VALIDITY_SECS: i64 = 15 * 60;

/// [`DEFAULT_VALIDITY_SECS`] as a duration.
pub fn default_validity() -> Duration {
    Duration::seconds(DEFAULT_VALIDITY_SECS)
}

/// Token category, carried in the header `typ` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    #[serde(rename = "app")]
    Application,
    #[serde(rename = "user")]
    User,
    #[serde(rename = "anon")]
    Anonymous,
}

impl TokenKind {
    /// Wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Application => "app",
            TokenKind::User => "user",
            TokenKind::Anonymous => "anon",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenKind {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "app" => Ok(TokenKind::Application),
            "user" => Ok(TokenKind::User),
            "anon" => Ok(TokenKind::Anonymous),
            other => Err(TokenError::UnknownKind(other.to_string())),
        }
    }
}

/// One authentication assertion.
///
/// Fields are fixed at construction. The canonical form is computed at most
/// once, either lazily on first use or directly from the transmitted bytes
/// when parsing.
#[derive(Debug, Clone)]
pub struct Token {
    kind: TokenKind,
    app_id: String,
    expiration: DateTime<Utc>,
    user_id: Option<String>,
    signature: Option<Vec<u8>>,
    canonical: OnceLock<String>,
}

impl Token {
    /// Create an unsigned token.
    ///
    /// `user_id` must be present for [`TokenKind::User`] and absent otherwise.
    pub fn new(
        kind: TokenKind,
        app_id: impl Into<String>,
        expiration: DateTime<Utc>,
        user_id: Option<String>,
    ) -> Result<Self> {
        match (kind, &user_id) {
            (TokenKind::User, None) => {
                return Err(TokenError::InconsistentClaims(
                    "user token requires a user id".to_string(),
                ));
            }
            (TokenKind::Application | TokenKind::Anonymous, Some(_)) => {
                return Err(TokenError::InconsistentClaims(format!(
                    "{kind} token cannot carry a user id"
                )));
            }
            _ => {}
        }

        Ok(Self::unchecked(kind, app_id.into(), expiration, user_id))
    }

    /// Application token expiring after the default validity.
    pub fn application(app_id: impl Into<String>) -> Self {
        Self::unchecked(TokenKind::Application, app_id.into(), default_expiration(), None)
    }

    /// User token expiring after the default validity.
    pub fn user(app_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self::unchecked(
            TokenKind::User,
            app_id.into(),
            default_expiration(),
            Some(user_id.into()),
        )
    }

    /// Anonymous token expiring after the default validity.
    pub fn anonymous(app_id: impl Into<String>) -> Self {
        Self::unchecked(TokenKind::Anonymous, app_id.into(), default_expiration(), None)
    }

    fn unchecked(
        kind: TokenKind,
        app_id: String,
        expiration: DateTime<Utc>,
        user_id: Option<String>,
    ) -> Self {
        Self {
            kind,
            app_id,
            expiration,
            user_id,
            signature: None,
            canonical: OnceLock::new(),
        }
    }

    /// Replace the expiration, producing a new unsigned token.
    pub fn with_expiration(self, expiration: DateTime<Utc>) -> Self {
        Self::unchecked(self.kind, self.app_id, expiration, self.user_id)
    }

    /// Attach a signature. The canonical form is carried over unchanged.
    pub fn signed(mut self, signature: Vec<u8>) -> Self {
        self.signature = Some(signature);
        self
    }

    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn expiration(&self) -> DateTime<Utc> {
        self.expiration
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// Raw signature bytes, if the token has been signed or parsed.
    pub fn signature(&self) -> Option<&[u8]> {
        self.signature.as_deref()
    }

    /// Whether the expiration instant has passed.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Whether `now` is strictly after the expiration instant.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expiration
    }

    /// Time left until expiration; negative once expired.
    pub fn expires_in(&self) -> Duration {
        self.expiration - Utc::now()
    }

    /// The `header.payload` string that is signed.
    pub fn canonical_form(&self) -> Result<&str> {
        if let Some(canonical) = self.canonical.get() {
            return Ok(canonical);
        }

        let computed = self.compute_canonical()?;
        Ok(self.canonical.get_or_init(|| computed))
    }

    fn compute_canonical(&self) -> Result<String> {
        let header = Header {
            alg: ALGORITHM.to_string(),
            typ: self.kind.as_str().to_string(),
        };
        let payload = Payload {
            app: self.app_id.clone(),
            exp: Some(self.expiration.timestamp()),
            uid: self.user_id.clone(),
        };

        Ok(format!(
            "{}.{}",
            codec::to_segment(&header)?,
            codec::to_segment(&payload)?
        ))
    }

    /// Full wire string. Fails if the token is unsigned.
    pub fn render(&self) -> Result<String> {
        let signature = self.signature.as_ref().ok_or(TokenError::MissingSignature)?;
        Ok(format!(
            "{}.{}",
            self.canonical_form()?,
            codec::encode_segment(signature)
        ))
    }

    /// Parse a wire string.
    ///
    /// Neither the signature nor the expiration is checked here.
    pub fn parse(raw: &str) -> Result<Self> {
        let segments: Vec<&str> = raw.split('.').collect();
        let [header_segment, payload_segment, signature_segment] = segments.as_slice() else {
            return Err(TokenError::MalformedToken {
                segments: segments.len(),
            });
        };

        let header: Header = codec::from_segment(header_segment)?;
        let payload: Payload = codec::from_segment(payload_segment)?;

        if header.alg != ALGORITHM {
            return Err(TokenError::UnsupportedAlgorithm(header.alg));
        }
        let kind: TokenKind = header.typ.parse()?;

        let exp = payload
            .exp
            .ok_or_else(|| TokenError::InvalidJson("missing field `exp`".to_string()))?;
        let expiration = DateTime::from_timestamp(exp, 0)
            .ok_or_else(|| TokenError::InvalidJson(format!("`exp` out of range: {exp}")))?;
        let signature = codec::decode_segment(signature_segment)?;

        let mut token = Token::new(kind, payload.app, expiration, payload.uid)?;
        token.canonical = OnceLock::from(format!("{header_segment}.{payload_segment}"));
        token.signature = Some(signature);

        tracing::trace!(kind = %token.kind, app_id = %token.app_id, "Parsed token");
        Ok(token)
    }
}

impl FromStr for Token {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self> {
        Token::parse(s)
    }
}

fn default_expiration() -> DateTime<Utc> {
    Utc::now() + default_validity()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{decode_segment, encode_segment};

    fn fixed_expiration() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn wire(header: &str, payload: &str) -> String {
        format!(
            "{}.{}.{}",
            encode_segment(header.as_bytes()),
            encode_segment(payload.as_bytes()),
            encode_segment(&[7u8; 64])
        )
    }

    #[test]
    fn test_kind_wire_strings() {
        for kind in [TokenKind::Application, TokenKind::User, TokenKind::Anonymous] {
            assert_eq!(kind.as_str().parse::<TokenKind>().unwrap(), kind);
        }
        assert_eq!(TokenKind::Anonymous.to_string(), "anon");
        assert!(matches!(
            "admin".parse::<TokenKind>(),
            Err(TokenError::UnknownKind(k)) if k == "admin"
        ));
    }

    #[test]
    fn test_kind_serde_uses_wire_string() {
        assert_eq!(serde_json::to_string(&TokenKind::Anonymous).unwrap(), r#""anon""#);
        assert_eq!(
            serde_json::from_str::<TokenKind>(r#""anon""#).unwrap(),
            TokenKind::Anonymous
        );
        for kind in [TokenKind::Application, TokenKind::User] {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
        assert!(serde_json::from_str::<TokenKind>(r#""Anonymous""#).is_err());
    }

    #[test]
    fn test_new_enforces_user_id_invariant() {
        let exp = fixed_expiration();
        assert!(Token::new(TokenKind::User, "a", exp, Some("u".into())).is_ok());
        assert!(Token::new(TokenKind::Application, "a", exp, None).is_ok());

        let err = Token::new(TokenKind::User, "a", exp, None).unwrap_err();
        assert!(matches!(err, TokenError::InconsistentClaims(_)));
        let err = Token::new(TokenKind::Anonymous, "a", exp, Some("u".into())).unwrap_err();
        assert!(matches!(err, TokenError::InconsistentClaims(_)));
    }

    #[test]
    fn test_canonical_form_is_deterministic() {
        let exp = fixed_expiration();
        let a = Token::new(TokenKind::User, "app", exp, Some("bob".into())).unwrap();
        let b = Token::new(TokenKind::User, "app", exp, Some("bob".into())).unwrap();
        assert_eq!(a.canonical_form().unwrap(), b.canonical_form().unwrap());

        let (header, payload) = a.canonical_form().unwrap().split_once('.').unwrap();
        assert_eq!(
            decode_segment(header).unwrap(),
            br#"{"alg":"EdDSA","typ":"user"}"#
        );
        assert_eq!(
            decode_segment(payload).unwrap(),
            br#"{"app":"app","exp":1700000000,"uid":"bob"}"#
        );
    }

    #[test]
    fn test_uid_omitted_for_non_user_tokens() {
        for token in [Token::application("app"), Token::anonymous("app")] {
            let canonical = token.canonical_form().unwrap();
            let payload = canonical.split('.').nth(1).unwrap();
            let json: serde_json::Value =
                serde_json::from_slice(&decode_segment(payload).unwrap()).unwrap();
            assert!(json.get("uid").is_none());
            assert!(json.get("app").is_some());
            assert!(json.get("exp").is_some());
        }
    }

    #[test]
    fn test_render_requires_signature() {
        let token = Token::application("app");
        assert!(matches!(token.render(), Err(TokenError::MissingSignature)));

        let rendered = token.signed(vec![1, 2, 3]).render().unwrap();
        assert_eq!(rendered.split('.').count(), 3);
        assert!(rendered.ends_with(".AQID"));
    }

    #[test]
    fn test_parse_round_trip() {
        let exp = fixed_expiration();
        let original = Token::new(TokenKind::User, "app", exp, Some("bob".into()))
            .unwrap()
            .signed(vec![9u8; 64]);
        let rendered = original.render().unwrap();

        let parsed = Token::parse(&rendered).unwrap();
        assert_eq!(parsed.kind(), TokenKind::User);
        assert_eq!(parsed.app_id(), "app");
        assert_eq!(parsed.expiration(), exp);
        assert_eq!(parsed.user_id(), Some("bob"));
        assert_eq!(parsed.signature(), Some(&[9u8; 64][..]));
        assert_eq!(parsed.render().unwrap(), rendered);
    }

    #[test]
    fn test_parse_keeps_transmitted_canonical_form() {
        // Non-canonical field order must be verified as sent, not re-derived.
        let raw = wire(
            r#"{"typ":"app","alg":"EdDSA"}"#,
            r#"{"exp":1700000000,"app":"app"}"#,
        );
        let token = Token::parse(&raw).unwrap();
        let expected = raw.rsplit_once('.').unwrap().0;
        assert_eq!(token.canonical_form().unwrap(), expected);
        assert_eq!(token.render().unwrap(), raw);
    }

    #[test]
    fn test_parse_truncates_sub_second_precision() {
        let exp = DateTime::from_timestamp(1_700_000_000, 999_000_000).unwrap();
        let token = Token::new(TokenKind::Anonymous, "app", exp, None)
            .unwrap()
            .signed(vec![0; 64]);
        let parsed = Token::parse(&token.render().unwrap()).unwrap();
        assert_eq!(parsed.expiration(), fixed_expiration());
    }

    #[test]
    fn test_parse_rejects_wrong_segment_count() {
        let err = Token::parse("a.b").unwrap_err();
        assert!(matches!(err, TokenError::MalformedToken { segments: 2 }));
        assert!(err.is_format_error());

        let err = Token::parse("a.b.c.d").unwrap_err();
        assert!(matches!(err, TokenError::MalformedToken { segments: 4 }));
    }

    #[test]
    fn test_parse_rejects_other_algorithms() {
        let raw = wire(
            r#"{"alg":"HS256","typ":"app"}"#,
            r#"{"app":"app","exp":1700000000}"#,
        );
        let err = Token::parse(&raw).unwrap_err();
        assert!(matches!(err, TokenError::UnsupportedAlgorithm(ref alg) if alg == "HS256"));
        assert!(err.is_format_error());
    }

    #[test]
    fn test_parse_rejects_unknown_kind() {
        let raw = wire(
            r#"{"alg":"EdDSA","typ":"root"}"#,
            r#"{"app":"app","exp":1700000000}"#,
        );
        assert!(matches!(Token::parse(&raw), Err(TokenError::UnknownKind(_))));
    }

    #[test]
    fn test_parse_rejects_bad_segments() {
        let raw = format!("!!!.{}.AA", encode_segment(b"{}"));
        assert!(matches!(Token::parse(&raw), Err(TokenError::InvalidEncoding(_))));

        let raw = wire(r#"{"alg":"EdDSA","typ":"app"}"#, r#"{"app":"app"}"#);
        assert!(matches!(Token::parse(&raw), Err(TokenError::InvalidJson(_))));

        let raw = wire(r#"{"alg":"EdDSA","typ":"app"}"#, r#"["app"]"#);
        assert!(matches!(Token::parse(&raw), Err(TokenError::InvalidJson(_))));
    }

    #[test]
    fn test_parse_rejects_bad_signature_segment() {
        let raw = format!(
            "{}.{}.!!",
            encode_segment(br#"{"alg":"EdDSA","typ":"app"}"#),
            encode_segment(br#"{"app":"app","exp":1700000000}"#)
        );
        let err = Token::parse(&raw).unwrap_err();
        assert!(matches!(err, TokenError::InvalidEncoding(_)));
        assert!(err.is_format_error());
    }

    #[test]
    fn test_parse_rejects_trailing_dot() {
        let raw = wire(
            r#"{"alg":"EdDSA","typ":"app"}"#,
            r#"{"app":"app","exp":1700000000}"#,
        );
        assert!(Token::parse(&raw).is_ok());

        let err = Token::parse(&format!("{raw}.")).unwrap_err();
        assert!(matches!(err, TokenError::MalformedToken { segments: 4 }));
        assert!(err.is_format_error());
    }

    #[test]
    fn test_parse_rejects_inconsistent_claims() {
        let raw = wire(
            r#"{"alg":"EdDSA","typ":"user"}"#,
            r#"{"app":"app","exp":1700000000}"#,
        );
        assert!(matches!(
            Token::parse(&raw),
            Err(TokenError::InconsistentClaims(_))
        ));
    }

    #[test]
    fn test_expiration() {
        let past = Utc::now() - Duration::seconds(1);
        let token = Token::new(TokenKind::Application, "app", past, None).unwrap();
        assert!(token.is_expired());

        let token = Token::application("app");
        assert!(!token.is_expired());
        assert!(token.expires_in() > Duration::minutes(14));
        assert!(token.expires_in() <= default_validity());

        let exp = fixed_expiration();
        let token = Token::new(TokenKind::Application, "app", exp, None).unwrap();
        assert!(!token.is_expired_at(exp));
        assert!(token.is_expired_at(exp + Duration::seconds(1)));
    }

    #[test]
    fn test_with_expiration_resets_canonical_form() {
        let token = Token::application("app");
        let before = token.canonical_form().unwrap().to_string();
        let token = token.with_expiration(fixed_expiration());
        assert_ne!(token.canonical_form().unwrap(), before);
        assert_eq!(token.expiration(), fixed_expiration());
    }

    #[test]
    fn test_token_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Token>();
    }
}
