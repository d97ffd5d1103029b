//! The channel this client opened last, kept on disk so later runs attach
//! to it instead of deriving a fresh id.

use crate::types::StoreError;
use ethers::types::{H256, U256};
use serde::{Deserialize, Serialize};
use std::{fs, io, path::Path};

/// Everything needed to re-derive and re-seed an opened channel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelRecord {
    pub channel_id: H256,
    pub balance: U256,
    pub expiry: u64,
}

impl ChannelRecord {
    /// `Ok(None)` when no record has been written yet.
    pub fn load(path: impl AsRef<Path>) -> Result<Option<Self>, StoreError> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Replace the record. Written to a sibling file first and renamed.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        let path = path.as_ref();
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(self)?)?;
        fs::rename(&tmp, path)?;
        tracing::debug!(path = %path.display(), channel_id = ?self.channel_id, "channel record saved");
        Ok(())
    }
}
