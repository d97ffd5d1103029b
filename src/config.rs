//! Client configuration: a TOML file plus environment-supplied secrets.
//!
//! The private key never lives in the file; it comes from
//! [`PRIVATE_KEY_ENV`] or the command line.

use crate::bootstrap::BootstrapPolicy;
use crate::types::ConfigError;
use crate::utils::ChannelDomain;
use ethers::types::Address;
use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};
use url::Url;

pub const PRIVATE_KEY_ENV: &str = "STREAM_CHANNEL_PRIVATE_KEY";

fn default_poll_interval_ms() -> u64 {
    2_000
}

fn default_expiry_secs() -> u64 {
    24 * 60 * 60
}

fn default_state_file() -> PathBuf {
    PathBuf::from("./channel_state.json")
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub sequencer_url: Url,
    pub rpc_url: Url,
    pub chain_id: u64,
    pub channel_contract: Address,
    pub token: Address,
    #[serde(default)]
    pub bootstrap_policy: BootstrapPolicy,
    #[serde(default = "default_poll_interval_ms")]
    pub receipt_poll_interval_ms: u64,
    #[serde(default = "default_expiry_secs")]
    pub default_expiry_secs: u64,
    /// Where the last opened channel is recorded between runs.
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,
}

impl ClientConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: ClientConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.chain_id == 0 {
            return Err(ConfigError::Validation("chain_id must be non-zero".into()));
        }
        if self.receipt_poll_interval_ms == 0 {
            return Err(ConfigError::Validation(
                "receipt_poll_interval_ms must be non-zero".into(),
            ));
        }
        if self.channel_contract.is_zero() {
            return Err(ConfigError::Validation(
                "channel_contract must be set".into(),
            ));
        }
        Ok(())
    }

    pub fn domain(&self) -> ChannelDomain {
        ChannelDomain::new(self.chain_id, self.channel_contract)
    }

    pub fn receipt_poll_interval(&self) -> Duration {
        Duration::from_millis(self.receipt_poll_interval_ms)
    }
}
