use crate::types::ChannelError;
use crate::utils::crypto::{recover_signer, ChannelData, ChannelDomain};
use ethers::types::{Address, Signature, H256, U256};
use ethers::utils::to_checksum;
use serde::{Deserialize, Serialize};

/// `0x`-prefixed, full-width hex form used on every wire surface.
pub fn format_channel_id(channel_id: H256) -> String {
    format!("0x{}", hex::encode(channel_id.as_bytes()))
}

/// Immutable identity of one payment channel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    pub channel_id: H256,
    pub owner: Address,
    pub domain: ChannelDomain,
    pub expiry: u64,
}

/// A signed snapshot of channel state at one sequence number.
///
/// `receiver` and `amount` describe the payment that produced this voucher;
/// the signed content is the full cumulative `recipients`/`amounts` list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Voucher {
    pub channel_id: H256,
    pub sequence_number: u64,
    pub timestamp: u64,
    pub recipients: Vec<Address>,
    pub amounts: Vec<U256>,
    pub signature: Signature,
    pub receiver: Address,
    pub amount: U256,
}

impl Voucher {
    pub fn message(&self) -> ChannelData {
        ChannelData {
            channel_id: self.channel_id,
            sequence_number: self.sequence_number,
            timestamp: self.timestamp,
            recipients: self.recipients.clone(),
            amounts: self.amounts.clone(),
        }
    }

    /// Cumulative amount owed to `recipient` as of this voucher.
    pub fn cumulative_for(&self, recipient: &Address) -> Option<U256> {
        self.recipients
            .iter()
            .position(|r| r == recipient)
            .and_then(|i| self.amounts.get(i).copied())
    }

    pub fn total_amount(&self) -> U256 {
        self.cumulative_for(&self.receiver).unwrap_or_default()
    }

    pub fn signer(&self, domain: &ChannelDomain) -> Result<Address, ChannelError> {
        recover_signer(domain, &self.message(), &self.signature)
    }

    /// Check the voucher was signed by `owner` under `domain`.
    pub fn verify(&self, domain: &ChannelDomain, owner: Address) -> Result<(), ChannelError> {
        let recovered = self.signer(domain)?;
        if recovered != owner {
            return Err(ChannelError::Signing(format!(
                "voucher signed by {recovered:?}, expected {owner:?}"
            )));
        }
        Ok(())
    }

    pub fn payment_payload(&self) -> PaymentPayload {
        PaymentPayload {
            channel_id: format_channel_id(self.channel_id),
            amount: self.amount.to_string(),
            receiver: to_checksum(&self.receiver, None),
            sequence_number: self.sequence_number,
            timestamp: self.timestamp,
            user_signature: format!("0x{}", hex::encode(self.signature.to_vec())),
            total_amount: self.total_amount().to_string(),
            purpose: None,
        }
    }
}

/// Body handed to a payment-acceptance endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPayload {
    pub channel_id: String,
    pub amount: String,
    pub receiver: String,
    pub sequence_number: u64,
    pub timestamp: u64,
    pub user_signature: String,
    pub total_amount: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
}

impl PaymentPayload {
    pub fn with_purpose(mut self, purpose: impl Into<String>) -> Self {
        self.purpose = Some(purpose.into());
        self
    }
}

/// Read-only view of a ledger: sequence number plus balances in recipient
/// order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSnapshot {
    pub sequence_number: u64,
    pub balances: Vec<(Address, U256)>,
}

impl LedgerSnapshot {
    pub fn balance_of(&self, recipient: &Address) -> U256 {
        self.balances
            .iter()
            .find(|(r, _)| r == recipient)
            .map(|(_, amount)| *amount)
            .unwrap_or_default()
    }
}
