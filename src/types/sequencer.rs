//! Wire objects exchanged with the sequencer's HTTP API.

use serde::{Deserialize, Serialize};

/// `GET /channel/{id}` response. Amounts are decimal strings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSnapshot {
    #[serde(default)]
    pub channel_id: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub balance: String,
    #[serde(default)]
    pub expiry_timestamp: u64,
    pub sequence_number: u64,
    #[serde(default)]
    pub recipients: Vec<RecipientBalance>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipientBalance {
    pub recipient_address: String,
    pub balance: String,
}

/// `POST /channel/seed` body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedChannelRequest {
    pub channel_id: String,
    pub owner: String,
    pub balance: String,
    pub expiry_timestamp: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeChannelRequest {
    pub channel_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeChannelResponse {
    pub transaction_hash: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelsByOwnerResponse {
    pub owner: String,
    pub channel_ids: Vec<String>,
}
