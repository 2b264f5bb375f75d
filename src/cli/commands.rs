// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{anyhow, bail, Context, Result};
use clap::Args;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::config::EndpointConfig;
use crate::crypto::{decode_key, encode_key, EndpointFactory, KeySize};
use crate::logging::TracingSink;
use crate::storage::EndpointStore;

/// Arguments for the generate command
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Endpoint record name (defaults to ENDPOINT_NAME)
    #[arg(long)]
    pub name: Option<String>,

    /// Key size in bits: 128, 192, 256 or 512
    #[arg(long)]
    pub key_size: Option<KeySize>,

    /// Replace an existing record with the same name
    #[arg(long)]
    pub force: bool,

    /// Store directory (overrides ENDPOINT_STORE_DIR)
    #[arg(long)]
    pub store_dir: Option<PathBuf>,
}

/// Arguments for commands that only address a stored endpoint
#[derive(Args, Debug)]
pub struct NameArgs {
    /// Endpoint record name (defaults to ENDPOINT_NAME)
    #[arg(long)]
    pub name: Option<String>,

    /// Store directory (overrides ENDPOINT_STORE_DIR)
    #[arg(long)]
    pub store_dir: Option<PathBuf>,
}

/// Arguments for the derive command
#[derive(Args, Debug)]
pub struct DeriveArgs {
    #[command(flatten)]
    pub endpoint: NameArgs,

    /// Peer public key (base64 SPKI DER)
    #[arg(long)]
    pub peer: String,
}

/// Arguments for the encrypt and decrypt commands
#[derive(Args, Debug)]
pub struct TextArgs {
    #[command(flatten)]
    pub endpoint: NameArgs,

    /// Plaintext to encrypt, or base64 ciphertext to decrypt
    #[arg(long)]
    pub text: String,
}

struct Target {
    config: EndpointConfig,
    store: EndpointStore,
    name: String,
}

/// Command-line values take precedence over the environment
fn resolve(
    name: Option<String>,
    store_dir: Option<PathBuf>,
    key_size: Option<KeySize>,
) -> Result<Target> {
    let mut config = EndpointConfig::from_env();
    if let Some(size) = key_size {
        config.key_size = size;
    }
    if let Some(dir) = store_dir {
        config.store_dir = dir;
    }
    if let Some(name) = name {
        config.endpoint_name = name;
    }
    config
        .validate()
        .map_err(|e| anyhow!("Invalid endpoint configuration: {}", e))?;

    Ok(Target {
        store: EndpointStore::new(config.store_dir.clone()),
        name: config.endpoint_name.clone(),
        config,
    })
}

fn factory(config: &EndpointConfig) -> EndpointFactory {
    EndpointFactory::from_config(config, TracingSink::shared())
}

/// Create and persist a new endpoint, printing its public key
pub fn generate(args: GenerateArgs) -> Result<()> {
    let ctx = resolve(args.name, args.store_dir, args.key_size)?;

    if ctx.store.exists(&ctx.name) && !args.force {
        bail!(
            "Endpoint '{}' already exists (use --force to replace it)",
            ctx.name
        );
    }

    let endpoint = factory(&ctx.config).create();
    if !endpoint.has_key_pair() {
        bail!("Key generation failed for {}", ctx.config.key_size);
    }

    let path = ctx
        .store
        .save_endpoint(&ctx.name, &endpoint)
        .with_context(|| format!("Failed to save endpoint '{}'", ctx.name))?;
    info!(
        "✅ Generated endpoint '{}' ({}) at {}",
        ctx.name,
        endpoint.fingerprint().unwrap_or_default(),
        path.display()
    );

    let public = endpoint
        .encoded_public_key()
        .ok_or_else(|| anyhow!("Endpoint has no public key"))?;
    println!("{}", encode_key(&public));
    Ok(())
}

/// Print a stored endpoint's public key
pub fn public_key(args: NameArgs) -> Result<()> {
    let ctx = resolve(args.name, args.store_dir, None)?;
    let record = ctx
        .store
        .load(&ctx.name)
        .with_context(|| format!("Failed to load endpoint '{}'", ctx.name))?;

    let public = record
        .public
        .ok_or_else(|| anyhow!("Endpoint '{}' has no public key", ctx.name))?;
    println!("{}", public);
    Ok(())
}

/// Derive the shared secret from the peer's key and persist it
pub fn derive(args: DeriveArgs) -> Result<()> {
    let ctx = resolve(args.endpoint.name, args.endpoint.store_dir, None)?;
    let factory = factory(&ctx.config);
    let mut endpoint = ctx
        .store
        .load_endpoint(&ctx.name, &factory)
        .with_context(|| format!("Failed to load endpoint '{}'", ctx.name))?;

    let peer = decode_key(args.peer.trim()).context("Peer public key is not valid base64")?;
    endpoint
        .derive_shared_secret_from_encoded(&peer, factory.codec())
        .with_context(|| format!("Key agreement failed for endpoint '{}'", ctx.name))?;

    ctx.store
        .save_endpoint(&ctx.name, &endpoint)
        .with_context(|| format!("Failed to save endpoint '{}'", ctx.name))?;
    info!("✅ Shared secret established for endpoint '{}'", ctx.name);
    Ok(())
}

/// Encrypt text and print the base64 ciphertext
pub fn encrypt(args: TextArgs) -> Result<()> {
    let ctx = resolve(args.endpoint.name, args.endpoint.store_dir, None)?;
    let endpoint = ctx
        .store
        .load_endpoint(&ctx.name, &factory(&ctx.config))
        .with_context(|| format!("Failed to load endpoint '{}'", ctx.name))?;

    let ciphertext = endpoint
        .try_encrypt(args.text.as_bytes())
        .with_context(|| format!("Encryption failed for endpoint '{}'", ctx.name))?;
    println!("{}", String::from_utf8_lossy(&ciphertext));
    Ok(())
}

/// Decrypt base64 ciphertext and print the plaintext
pub fn decrypt(args: TextArgs) -> Result<()> {
    let ctx = resolve(args.endpoint.name, args.endpoint.store_dir, None)?;
    let endpoint = ctx
        .store
        .load_endpoint(&ctx.name, &factory(&ctx.config))
        .with_context(|| format!("Failed to load endpoint '{}'", ctx.name))?;

    let plaintext = endpoint
        .try_decrypt(args.text.trim().as_bytes())
        .with_context(|| format!("Decryption failed for endpoint '{}'", ctx.name))?;
    if std::str::from_utf8(&plaintext).is_err() {
        warn!("⚠️ Decrypted payload is not valid UTF-8; printing lossily");
    }
    println!("{}", String::from_utf8_lossy(&plaintext));
    Ok(())
}
