//! Network boundaries: the off-chain sequencer and the chain.
//!
//! Implementations surface every failure and never retry; retry and
//! timeout policy belongs to the caller.

pub mod chain;
pub mod sequencer;

pub use chain::EthersChainClient;
pub use sequencer::HttpSequencerClient;

use crate::types::{
    ChainError, ChannelSnapshot, ChannelsByOwnerResponse, SeedChannelRequest, SequencerError,
};
use async_trait::async_trait;
use ethers::types::{Address, Bytes, TxHash, H256, U256};
use serde::{Deserialize, Serialize};

/// Outcome of a mined transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxReceipt {
    pub tx_hash: TxHash,
    pub success: bool,
    pub block_number: Option<u64>,
}

#[async_trait]
pub trait SequencerClient: Send + Sync {
    /// `Ok(None)` when the sequencer does not know the channel.
    async fn get_channel(&self, channel_id: H256)
        -> Result<Option<ChannelSnapshot>, SequencerError>;

    async fn seed_channel(&self, payload: &SeedChannelRequest) -> Result<(), SequencerError>;

    /// Ask the sequencer to settle on-chain; returns the settlement tx hash.
    async fn finalize_channel(&self, channel_id: H256) -> Result<TxHash, SequencerError>;

    async fn channels_by_owner(
        &self,
        owner: Address,
    ) -> Result<ChannelsByOwnerResponse, SequencerError>;

    async fn health(&self) -> Result<(), SequencerError>;
}

#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Token allowance `owner` has granted the channel contract.
    async fn get_allowance(&self, owner: Address) -> Result<U256, ChainError>;

    /// Approve the channel contract to pull `amount` tokens.
    async fn approve(&self, amount: U256) -> Result<TxHash, ChainError>;

    async fn open_channel(
        &self,
        amount: U256,
        expiry: u64,
        timestamp: u64,
        signature: Bytes,
    ) -> Result<TxHash, ChainError>;

    /// Poll until the transaction is mined. There is no built-in timeout.
    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<TxReceipt, ChainError>;

    /// Whether the contract already holds a channel under `channel_id`.
    async fn channel_exists(&self, channel_id: H256) -> Result<bool, ChainError>;

    /// The id the contract derives for `(owner, expiry, amount)`.
    async fn get_channel_id_for(
        &self,
        owner: Address,
        expiry: u64,
        amount: U256,
    ) -> Result<H256, ChainError>;
}
