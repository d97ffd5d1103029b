use crate::network::{ChainClient, SequencerClient};
use crate::types::ChannelError;
use ethers::types::{TxHash, H256};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementReceipt {
    pub channel_id: H256,
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
}

/// Asks the sequencer to submit the latest agreed state on-chain and
/// watches the resulting transaction.
pub struct Settlement {
    sequencer: Arc<dyn SequencerClient>,
    chain: Arc<dyn ChainClient>,
}

impl Settlement {
    pub fn new(sequencer: Arc<dyn SequencerClient>, chain: Arc<dyn ChainClient>) -> Self {
        Self { sequencer, chain }
    }

    pub async fn finalize(&self, channel_id: H256) -> Result<SettlementReceipt, ChannelError> {
        let tx_hash = self.sequencer.finalize_channel(channel_id).await?;
        tracing::info!(channel_id = ?channel_id, tx_hash = ?tx_hash, "settlement submitted");

        let receipt = self.chain.wait_for_receipt(tx_hash).await?;
        if !receipt.success {
            tracing::error!(channel_id = ?channel_id, tx_hash = ?tx_hash, "settlement reverted");
            return Err(ChannelError::SettlementFailed { tx_hash });
        }

        tracing::info!(
            channel_id = ?channel_id,
            block_number = ?receipt.block_number,
            "settlement confirmed"
        );
        Ok(SettlementReceipt {
            channel_id,
            tx_hash,
            block_number: receipt.block_number,
        })
    }
}
