//! # CLI Interface
//!
//! `clap` derive definitions for the `swiftbridge` binary. Key material can
//! come from flags or from the environment so it stays out of shell
//! history.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::logging::LogFormat;

/// SWIFT ledger bridge.
///
/// Encrypts SWIFT messages for a recipient, wraps them in ledger transfers
/// (optionally through a multisig account) and decodes them back.
#[derive(Parser, Debug)]
#[command(
    name = "swiftbridge",
    about = "SWIFT ledger bridge",
    version,
    propagate_version = true
)]
pub struct SwiftBridgeCli {
    /// Bridge config file (JSON). Defaults apply when omitted.
    #[arg(long, short = 'c', global = true, env = "SWIFTBRIDGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty, env = "SWIFTBRIDGE_LOG_FORMAT")]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a fresh account keypair.
    Keygen,
    /// Encrypt a message for a recipient and print the hex blob.
    Encode(EncodeArgs),
    /// Decrypt a hex blob addressed to us.
    Decode(DecodeArgs),
    /// Build a transfer carrying an encrypted message and announce it to an
    /// in-memory ledger (dry run).
    Send(SendArgs),
    /// Print version information and exit.
    Version,
}

/// Plaintext source: inline text or a file.
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct MessageSource {
    /// Message text.
    #[arg(long, short = 'm')]
    pub message: Option<String>,

    /// Read the message from a file.
    #[arg(long, short = 'i')]
    pub input: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Hex-encoded sender secret key.
    #[arg(long, env = "SWIFTBRIDGE_SECRET_KEY", hide_env_values = true)]
    pub sender_key: String,

    /// Hex-encoded recipient public key.
    #[arg(long)]
    pub recipient: String,

    #[command(flatten)]
    pub source: MessageSource,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Hex-encoded recipient (our) secret key.
    #[arg(long, env = "SWIFTBRIDGE_SECRET_KEY", hide_env_values = true)]
    pub recipient_key: String,

    /// Hex-encoded sender public key.
    #[arg(long)]
    pub sender: String,

    /// Hex blob to decode.
    pub blob: String,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Hex-encoded sender secret key.
    #[arg(long, env = "SWIFTBRIDGE_SECRET_KEY", hide_env_values = true)]
    pub sender_key: String,

    /// Hex-encoded recipient public key.
    #[arg(long)]
    pub recipient: String,

    /// Native amount in the smallest ledger unit.
    #[arg(long, default_value_t = 0)]
    pub amount: u64,

    /// Fee override. Defaults to the configured fee.
    #[arg(long)]
    pub fee: Option<u64>,

    /// Route through this multisig account (hex public key). The transfer
    /// is assembled as a multisig wrapper signed by the sender.
    #[arg(long)]
    pub multisig: Option<String>,

    #[command(flatten)]
    pub source: MessageSource,
}
