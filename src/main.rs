//! Stream channel client
//!
//! Opens or recovers a payment channel, issues vouchers and triggers
//! settlement from the command line.

use clap::{Parser, Subcommand};
use ethers::types::{H256, U256};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use stream_channel_client::{
    config::PRIVATE_KEY_ENV, ChainClient, ChannelBootstrapper, ChannelRecord, ClientConfig,
    EthersChainClient, HttpSequencerClient, SequencerClient, Settlement, VoucherSigner,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Streaming payment channel client
#[derive(Parser, Debug)]
#[command(name = "stream-channel")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "./stream-channel.toml")]
    config: PathBuf,

    /// Owner private key (hex)
    #[arg(long, env = PRIVATE_KEY_ENV, hide_env_values = true)]
    private_key: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Recover a channel from the sequencer or open it on-chain, then
    /// record it for later commands
    Open {
        /// Known channel id, tried against the sequencer first
        #[arg(long, value_parser = parse_h256)]
        channel_id: Option<H256>,
        /// Deposit in token base units
        #[arg(long, value_parser = parse_u256)]
        balance: U256,
        /// Absolute expiry (unix seconds); defaults to now + configured window
        #[arg(long)]
        expiry: Option<u64>,
    },
    /// Issue one voucher on the recorded channel and print the payment
    /// payload as JSON. Never opens a channel.
    Pay {
        /// Recipient address
        #[arg(long)]
        recipient: String,
        /// Amount in token base units
        #[arg(long, value_parser = parse_u256)]
        amount: U256,
        /// Free-form purpose attached to the payload
        #[arg(long)]
        purpose: Option<String>,
    },
    /// Print the sequencer's view of a channel (default: the recorded one)
    Status {
        #[arg(long, value_parser = parse_h256)]
        channel_id: Option<H256>,
    },
    /// List channel ids the sequencer holds for this owner
    List,
    /// Ask the sequencer to settle a channel (default: the recorded one)
    /// and wait for the transaction
    Finalize {
        #[arg(long, value_parser = parse_h256)]
        channel_id: Option<H256>,
    },
}

fn parse_u256(s: &str) -> Result<U256, String> {
    U256::from_dec_str(s).map_err(|e| e.to_string())
}

fn parse_h256(s: &str) -> Result<H256, String> {
    H256::from_str(s).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = Args::parse();

    let config = ClientConfig::load(&args.config).map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;
    tracing::info!("Configuration loaded from {:?}", args.config);

    let signer = VoucherSigner::from_private_key(&args.private_key)?;
    let sequencer: Arc<dyn SequencerClient> =
        Arc::new(HttpSequencerClient::new(config.sequencer_url.clone()));
    let chain: Arc<dyn ChainClient> = Arc::new(EthersChainClient::new(
        config.rpc_url.as_str(),
        signer.wallet().clone(),
        config.chain_id,
        config.channel_contract,
        config.token,
        config.receipt_poll_interval(),
    )?);

    let bootstrapper = ChannelBootstrapper::new(
        sequencer.clone(),
        chain.clone(),
        signer.clone(),
        config.domain(),
    )
    .with_policy(config.bootstrap_policy);

    match args.command {
        Command::Open {
            channel_id,
            balance,
            expiry,
        } => {
            let expiry = expiry.unwrap_or_else(|| default_expiry(&config));
            let state = bootstrapper.ensure(channel_id, balance, expiry).await?;
            let record = ChannelRecord {
                channel_id: state.channel_id(),
                balance,
                expiry: state.channel().expiry,
            };
            record.save(&config.state_file)?;
            let snapshot = state.snapshot().await;
            println!("channel id: {:?}", state.channel_id());
            println!("sequence:   {}", snapshot.sequence_number);
            println!("recorded:   {}", config.state_file.display());
        }
        Command::Pay {
            recipient,
            amount,
            purpose,
        } => {
            let record = recorded_channel(&config)?;
            let state = bootstrapper
                .attach(record.channel_id, record.balance, record.expiry)
                .await?;
            let voucher = state.create_voucher_to(&recipient, amount).await?;
            let mut payload = voucher.payment_payload();
            if let Some(purpose) = purpose {
                payload = payload.with_purpose(purpose);
            }
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
        Command::Status { channel_id } => {
            let channel_id = resolve_channel_id(channel_id, &config)?;
            match sequencer.get_channel(channel_id).await? {
                Some(snapshot) => println!("{}", serde_json::to_string_pretty(&snapshot)?),
                None => println!("channel {channel_id:?} not found"),
            }
        }
        Command::List => {
            let channels = sequencer.channels_by_owner(signer.address()).await?;
            for id in channels.channel_ids {
                println!("{id}");
            }
        }
        Command::Finalize { channel_id } => {
            let channel_id = resolve_channel_id(channel_id, &config)?;
            let receipt = Settlement::new(sequencer, chain).finalize(channel_id).await?;
            println!("settled in tx {:?} (block {:?})", receipt.tx_hash, receipt.block_number);
        }
    }

    Ok(())
}

fn recorded_channel(config: &ClientConfig) -> anyhow::Result<ChannelRecord> {
    ChannelRecord::load(&config.state_file)?.ok_or_else(|| {
        anyhow::anyhow!(
            "no channel recorded in {}; run `open` first",
            config.state_file.display()
        )
    })
}

fn resolve_channel_id(channel_id: Option<H256>, config: &ClientConfig) -> anyhow::Result<H256> {
    match channel_id {
        Some(channel_id) => Ok(channel_id),
        None => Ok(recorded_channel(config)?.channel_id),
    }
}

fn default_expiry(config: &ClientConfig) -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
        + config.default_expiry_secs
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,stream_channel_client=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
