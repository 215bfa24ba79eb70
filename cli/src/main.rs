// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # swiftbridge
//!
//! Thin command-line caller over `swiftbridge-protocol`:
//!
//! - `keygen`: generate an account keypair
//! - `encode`: encrypt a message for a recipient
//! - `decode`: decrypt a blob addressed to us
//! - `send`: build and dry-run announce a payload-bearing transfer
//! - `version`: print build version information

mod cli;
mod logging;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;

use swiftbridge_protocol::config::{BridgeConfig, PROTOCOL_VERSION};
use swiftbridge_protocol::transaction::LedgerTransaction;
use swiftbridge_protocol::{
    attach_from, Account, InMemoryGateway, KeyPair, MultisigAssembler, PublicKey,
    SecurePayloadCodec, SystemTimeProvider, TimeProvider, TransactionAssembler,
    TransportGateway,
};

use cli::{Commands, MessageSource, SwiftBridgeCli};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = SwiftBridgeCli::parse();
    logging::init_logging("swiftbridge=info,swiftbridge_protocol=info", cli.log_format);

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Keygen => keygen(),
        Commands::Encode(args) => encode(args, &config),
        Commands::Decode(args) => decode(args, &config),
        Commands::Send(args) => send(args, &config).await,
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<BridgeConfig> {
    match path {
        Some(path) => {
            let cfg = BridgeConfig::load(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?;
            tracing::info!(path = %path.display(), "config loaded");
            Ok(cfg)
        }
        None => Ok(BridgeConfig::default()),
    }
}

fn keygen() -> Result<()> {
    let keypair = KeyPair::generate();
    let account = Account::local(keypair.clone());
    let out = json!({
        "address": account.address().to_string(),
        "public_key": keypair.public_key().to_hex(),
        "secret_key": keypair.secret_key_hex(),
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn encode(args: cli::EncodeArgs, config: &BridgeConfig) -> Result<()> {
    let sender = KeyPair::from_hex(&args.sender_key).context("invalid sender secret key")?;
    let recipient = PublicKey::from_hex(&args.recipient).context("invalid recipient public key")?;
    let plaintext = read_message(&args.source)?;

    let hex = SecurePayloadCodec::new(config)
        .encode_hex(&sender, &recipient, &plaintext)
        .context("failed to encode message")?;
    println!("{hex}");
    Ok(())
}

fn decode(args: cli::DecodeArgs, config: &BridgeConfig) -> Result<()> {
    let recipient =
        KeyPair::from_hex(&args.recipient_key).context("invalid recipient secret key")?;
    let sender = PublicKey::from_hex(&args.sender).context("invalid sender public key")?;

    let text = SecurePayloadCodec::new(config)
        .decode_hex_text(&recipient, &sender, &args.blob)
        .context("failed to decode blob")?;
    println!("{text}");
    Ok(())
}

async fn send(args: cli::SendArgs, config: &BridgeConfig) -> Result<()> {
    let sender = KeyPair::from_hex(&args.sender_key).context("invalid sender secret key")?;
    let recipient = PublicKey::from_hex(&args.recipient).context("invalid recipient public key")?;
    let plaintext = read_message(&args.source)?;

    let blob = SecurePayloadCodec::new(config)
        .encode(&sender, &recipient, &plaintext)
        .context("failed to encode message")?;
    let attachment = attach_from(Some(blob), &[])?;

    let time: Arc<dyn TimeProvider> = Arc::new(SystemTimeProvider::new());
    let gateway = InMemoryGateway::new();
    let fee = args.fee.unwrap_or(config.default_fee);

    let transaction: LedgerTransaction = match args.multisig {
        None => {
            let mut draft = TransactionAssembler::new(time, config).draft();
            draft
                .sender(Account::local(sender))?
                .recipient(Account::from_public_key(recipient))?
                .amount(args.amount)?
                .fee(fee)?
                .attachment(attachment)?;
            draft.build_transaction()?.into()
        }
        Some(multisig_hex) => {
            let multisig =
                PublicKey::from_hex(&multisig_hex).context("invalid multisig public key")?;
            let mut draft = MultisigAssembler::new(time, config)
                .sender(Account::local(sender.clone()))
                .recipient(Account::from_public_key(recipient))
                .multisig(Account::from_public_key(multisig));
            draft
                .amount(args.amount)?
                .fee(fee)?
                .attachment(attachment)?;

            let mut tx = draft.build_multisig_transaction()?;
            tx.sign(&sender);
            tx.into()
        }
    };

    let receipt = gateway
        .announce(&transaction)
        .await
        .context("dry-run announcement failed")?;

    let out = json!({ "receipt": receipt, "transaction": transaction });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn read_message(source: &MessageSource) -> Result<Vec<u8>> {
    match (&source.message, &source.input) {
        (Some(text), _) => Ok(text.clone().into_bytes()),
        (None, Some(path)) => std::fs::read(path)
            .with_context(|| format!("failed to read message from {}", path.display())),
        (None, None) => anyhow::bail!("no message given: pass --message or --input"),
    }
}

fn print_version() {
    println!("swiftbridge {}", env!("CARGO_PKG_VERSION"));
    println!("protocol    {}", PROTOCOL_VERSION);
}
