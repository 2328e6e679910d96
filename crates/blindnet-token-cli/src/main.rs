use anyhow::Context;
use blindnet_token::{TokenConfig, TokenKind};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "bntoken", version, about = "Issue and verify blindnet tokens")]
struct Cli {
    /// TOML configuration file (app id, key locations, validity)
    #[arg(long, global = true, env = "BNTOKEN_CONFIG")]
    config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set, e.g. "debug" or "blindnet_token=trace"
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Key management (generate/public)
    Keys {
        #[command(subcommand)]
        cmd: KeysCommand,
    },

    /// Token management (issue/inspect/verify)
    Token {
        #[command(subcommand)]
        cmd: TokenCommand,
    },
}

#[derive(Subcommand, Debug)]
enum KeysCommand {
    /// Generate a new Ed25519 keypair
    Generate {
        /// Directory to write private.key and public.key into
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Print the public key of a private key
    Public {
        /// Private key, as a path or a Base64 string
        #[arg(long, env = "BNTOKEN_PRIVATE_KEY", hide_env_values = true)]
        key: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum TokenCommand {
    /// Issue a signed token
    Issue {
        /// Private key, as a path or a Base64 string
        #[arg(long, env = "BNTOKEN_PRIVATE_KEY", hide_env_values = true)]
        key: Option<String>,

        /// Application id (defaults to the configured app_id)
        #[arg(long)]
        app: Option<String>,

        /// Token kind: app, user or anon
        #[arg(long, default_value = "app")]
        kind: TokenKind,

        /// User id, required for user tokens
        #[arg(long)]
        user: Option<String>,

        /// Lifetime such as "15m", "1h" or "30s" (defaults to the configured validity)
        #[arg(long)]
        expires: Option<String>,

        /// Write the token to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Decode a token without verifying it
    Inspect {
        /// Token string or path to a file containing it
        token: String,
    },

    /// Verify a token's signature, expiration and application
    Verify {
        /// Public key, as a path or a Base64 string
        #[arg(long, env = "BNTOKEN_PUBLIC_KEY")]
        key: Option<String>,

        /// Token string or path to a file containing it
        token: String,

        /// Expected application id (defaults to the configured app_id)
        #[arg(long)]
        app: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .context("Invalid log filter")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => TokenConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => TokenConfig::default(),
    };

    match cli.cmd {
        Command::Keys { cmd } => match cmd {
            KeysCommand::Generate { output } => commands::keys::generate(output)?,
            KeysCommand::Public { key } => commands::keys::public(&config, key)?,
        },

        Command::Token { cmd } => match cmd {
            TokenCommand::Issue {
                key,
                app,
                kind,
                user,
                expires,
                output,
            } => commands::token::issue(&config, key, app, kind, user, expires, output)?,
            TokenCommand::Inspect { token } => commands::token::inspect(token)?,
            TokenCommand::Verify { key, token, app } => {
                commands::token::verify(&config, key, token, app)?
            }
        },
    }

    Ok(())
}
