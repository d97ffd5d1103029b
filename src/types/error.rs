use ethers::types::{H256, U256};
use reqwest::StatusCode;
use thiserror::Error;

/// Failures talking to the off-chain sequencer.
#[derive(Error, Debug)]
pub enum SequencerError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("api error: status {status}, body: {body}")]
    Api { status: StatusCode, body: String },
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
    #[error("unexpected response: {0}")]
    InvalidResponse(String),
}

/// Failures talking to the chain through the RPC provider.
#[derive(Error, Debug)]
pub enum ChainError {
    #[error("provider error: {0}")]
    Provider(String),
    #[error("contract call failed: {0}")]
    Contract(String),
}

#[derive(Error, Debug)]
pub enum ChannelError {
    #[error("sequencer error: {0}")]
    Sequencer(#[from] SequencerError),
    #[error("chain error: {0}")]
    Chain(#[from] ChainError),
    #[error("Insufficient token allowance: required {required}, granted {granted}")]
    InsufficientAllowance { required: U256, granted: U256 },
    #[error("Token approval reverted: {tx_hash:?}")]
    ApprovalFailed { tx_hash: H256 },
    #[error("On-chain channel open reverted: {tx_hash:?}")]
    OnChainOpenFailed { tx_hash: H256 },
    #[error("Channel settlement reverted: {tx_hash:?}")]
    SettlementFailed { tx_hash: H256 },
    #[error("Payment amount must be greater than zero")]
    InvalidAmount,
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
    #[error("Stale sync: local sequence {local}, sequencer reports {remote}")]
    StaleSync { local: u64, remote: u64 },
    #[error("Signing failed: {0}")]
    Signing(String),
    #[error("Channel is unknown and cannot be established under the bootstrap policy")]
    UnknownChannel,
}

impl ChannelError {
    /// Whether the failure came from an unreachable or misbehaving remote.
    pub fn is_network(&self) -> bool {
        matches!(self, ChannelError::Sequencer(_) | ChannelError::Chain(_))
    }

    /// Whether the failure happened after an on-chain step and must abort
    /// the channel.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ChannelError::ApprovalFailed { .. }
                | ChannelError::OnChainOpenFailed { .. }
                | ChannelError::SettlementFailed { .. }
        )
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("validation error: {0}")]
    Validation(String),
}

/// Failures reading or writing the local channel record.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to access channel record: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed channel record: {0}")]
    Json(#[from] serde_json::Error),
}
