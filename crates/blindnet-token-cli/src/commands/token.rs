//! Token management commands.
//!
//! `bntoken token issue` - Issue a signed application, user or anonymous token.
//! `bntoken token inspect` - Decode a token's header and payload.
//! `bntoken token verify` - Verify a token is valid.

use super::{read_token, resolve_private_key, resolve_public_key};
use anyhow::Context;
use blindnet_token::{TokenBuilder, TokenConfig, TokenKind, TokenVerifier, inspect_token_unverified};
use chrono::{DateTime, Duration, Utc};
use std::fs;
use std::path::PathBuf;

/// Parse a duration string like "15m", "1h", "7d" or "90s".
fn parse_duration(s: &str) -> anyhow::Result<Duration> {
    let s = s.trim().to_lowercase();

    let (value, unit) = match s.char_indices().last() {
        Some((idx, c)) if c.is_ascii_alphabetic() => (&s[..idx], Some(c)),
        _ => (s.as_str(), None),
    };
    let n: i64 = value
        .parse()
        .with_context(|| format!("Invalid duration: {s}"))?;

    let duration = match unit {
        Some('s') => Duration::try_seconds(n),
        Some('m') => Duration::try_minutes(n),
        Some('h') => Duration::try_hours(n),
        Some('d') => Duration::try_days(n),
        // Plain numbers are minutes
        None => Duration::try_minutes(n),
        Some(other) => anyhow::bail!("Unknown duration unit '{other}' in {s}"),
    };
    duration.with_context(|| format!("Duration out of range: {s}"))
}

/// Issue a signed token.
pub fn issue(
    config: &TokenConfig,
    private_key: Option<String>,
    app: Option<String>,
    kind: TokenKind,
    user: Option<String>,
    expires: Option<String>,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let key = resolve_private_key(private_key, config)?;
    let app_id = app
        .or_else(|| config.app_id.clone())
        .context("Application id not provided. Either pass --app <id> or set app_id in the config")?;
    let validity = match &expires {
        Some(e) => parse_duration(e)?,
        None => config.validity(),
    };

    let builder = TokenBuilder::new(app_id, key).with_validity(validity);
    let token = builder
        .issue(kind, user.clone())
        .with_context(|| format!("Failed to issue {kind} token"))?;

    if let Some(output_path) = output {
        fs::write(&output_path, &token)?;
        println!("✔ Token written to: {}", output_path.display());
        println!("  Kind: {kind}");
        println!("  App: {}", builder.app_id());
        if let Some(u) = &user {
            println!("  User: {u}");
        }
        println!("  Expires in: {}s", validity.num_seconds());
    } else {
        println!("{token}");
    }

    Ok(())
}

/// Inspect a token without verification.
pub fn inspect(token: String) -> anyhow::Result<()> {
    let token_str = read_token(token)?;
    let info = inspect_token_unverified(&token_str)?;

    println!("Token Information:");
    println!("  Header:  {}", serde_json::to_string(&info.header)?);
    println!("  Payload: {}", serde_json::to_string(&info.payload)?);
    if let Some(exp) = info.payload.exp.and_then(|exp| DateTime::from_timestamp(exp, 0)) {
        let state = if Utc::now() > exp { "expired" } else { "not expired" };
        println!("  Expires: {} ({state})", exp.to_rfc3339());
    }
    println!("  Signature: {} bytes", info.signature_len);

    Ok(())
}

/// Verify a token's signature, expiration and application.
pub fn verify(
    config: &TokenConfig,
    public_key: Option<String>,
    token: String,
    app: Option<String>,
) -> anyhow::Result<()> {
    let public_key = resolve_public_key(public_key, config)?;
    let mut verifier = TokenVerifier::new(public_key).with_leeway(config.leeway());
    if let Some(app_id) = app.or_else(|| config.app_id.clone()) {
        verifier = verifier.expect_application(app_id);
    }

    let token_str = read_token(token)?;
    let verified = verifier
        .verify(&token_str)
        .context("✖ Token verification failed")?;

    println!("✔ Token is valid");
    println!();
    println!("Token Details:");
    println!("  Kind: {}", verified.kind());
    println!("  App: {}", verified.app_id());
    if let Some(user_id) = verified.user_id() {
        println!("  User: {user_id}");
    }
    println!("  Expires: {}", verified.expiration().to_rfc3339());

    Ok(())
}
