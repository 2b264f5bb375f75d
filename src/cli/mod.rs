// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// Fabstir Endpoint Crypto CLI
#[derive(Parser, Debug)]
#[command(name = "endpoint-cli")]
#[command(version = "1.0.0")]
#[command(about = "Manage ECDH encryption endpoints and run the payload cipher", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate and store a new endpoint key pair
    Generate(commands::GenerateArgs),

    /// Print a stored endpoint's public key (base64 SPKI)
    PublicKey(commands::NameArgs),

    /// Derive the shared secret from a peer's public key
    Derive(commands::DeriveArgs),

    /// Encrypt text with a stored endpoint's shared secret
    Encrypt(commands::TextArgs),

    /// Decrypt base64 ciphertext with a stored endpoint's shared secret
    Decrypt(commands::TextArgs),
}

/// Execute CLI command
pub fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Generate(args) => commands::generate(args),
        Commands::PublicKey(args) => commands::public_key(args),
        Commands::Derive(args) => commands::derive(args),
        Commands::Encrypt(args) => commands::encrypt(args),
        Commands::Decrypt(args) => commands::decrypt(args),
    }
}
