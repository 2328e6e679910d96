//! Key management commands.
//!
//! `bntoken keys generate` - Generate a new Ed25519 keypair.
//! `bntoken keys public` - Print the public key of a private key.

use super::resolve_private_key;
use blindnet_token::{KeyPair, TokenConfig};
use std::fs;
use std::path::PathBuf;

/// Generate a new keypair.
pub fn generate(output: Option<PathBuf>) -> anyhow::Result<()> {
    let keypair = KeyPair::generate();

    if let Some(output_dir) = output {
        fs::create_dir_all(&output_dir)?;

        let private_path = output_dir.join("private.key");
        let public_path = output_dir.join("public.key");
        keypair.save_to_files(&private_path, &public_path)?;

        println!("✔ Generated Ed25519 keypair:");
        println!("  Private key: {}", private_path.display());
        println!("  Public key:  {}", public_path.display());
        println!();
        println!("⚠️  Keep your private key secure! Never commit it to version control.");
        println!();
        println!("Set as environment variables:");
        println!("  export BNTOKEN_PRIVATE_KEY=$(cat {})", private_path.display());
        println!("  export BNTOKEN_PUBLIC_KEY=$(cat {})", public_path.display());
    } else {
        println!("Private key (keep secure!):");
        println!("{}", keypair.private_key().encode());
        println!();
        println!("Public key:");
        println!("{}", keypair.public_key());
        println!();
        println!("Use --output <dir> to save keys to files.");
    }

    Ok(())
}

/// Print the public key matching a private key.
pub fn public(config: &TokenConfig, key: Option<String>) -> anyhow::Result<()> {
    let private_key = resolve_private_key(key, config)?;
    println!("{}", private_key.public_key());
    Ok(())
}
