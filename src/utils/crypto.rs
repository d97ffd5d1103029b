//! EIP-712 encoding of `ChannelData` vouchers.
//!
//! The digest is built by hand so the exact byte layout is visible and
//! matches what the channel contract and the sequencer derive:
//!
//! ```text
//! keccak256(0x19 0x01 || domainSeparator || hashStruct(ChannelData))
//! ```

use crate::types::ChannelError;
use ethers::types::{Address, RecoveryMessage, Signature, H256, U256};
use ethers::utils::keccak256;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub const DOMAIN_NAME: &str = "StreamChannel";
pub const DOMAIN_VERSION: &str = "1";
pub const PRIMARY_TYPE: &str = "ChannelData";

const DOMAIN_TYPE: &[u8] =
    b"EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)";
const CHANNEL_DATA_TYPE: &[u8] = b"ChannelData(bytes32 channelId,uint256 sequenceNumber,uint256 timestamp,address[] recipients,uint256[] amounts)";

pub trait U256Ext {
    fn to_be_bytes_vec(&self) -> Vec<u8>;
}

impl U256Ext for U256 {
    fn to_be_bytes_vec(&self) -> Vec<u8> {
        let mut bytes = [0u8; 32];
        self.to_big_endian(&mut bytes);
        bytes.to_vec()
    }
}

fn address_word(address: &Address) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(address.as_bytes());
    word
}

/// Signature domain binding a voucher to one contract on one chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelDomain {
    pub name: String,
    pub version: String,
    pub chain_id: u64,
    pub verifying_contract: Address,
}

impl ChannelDomain {
    pub fn new(chain_id: u64, verifying_contract: Address) -> Self {
        Self {
            name: DOMAIN_NAME.to_string(),
            version: DOMAIN_VERSION.to_string(),
            chain_id,
            verifying_contract,
        }
    }

    pub fn separator(&self) -> H256 {
        let mut encoded = Vec::with_capacity(5 * 32);
        encoded.extend_from_slice(&keccak256(DOMAIN_TYPE));
        encoded.extend_from_slice(&keccak256(self.name.as_bytes()));
        encoded.extend_from_slice(&keccak256(self.version.as_bytes()));
        encoded.extend_from_slice(&U256::from(self.chain_id).to_be_bytes_vec());
        encoded.extend_from_slice(&address_word(&self.verifying_contract));
        H256::from(keccak256(&encoded))
    }
}

/// The `ChannelData` struct every voucher signs.
///
/// `recipients` and `amounts` are parallel: `amounts[i]` is the cumulative
/// total owed to `recipients[i]`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelData {
    pub channel_id: H256,
    pub sequence_number: u64,
    pub timestamp: u64,
    pub recipients: Vec<Address>,
    pub amounts: Vec<U256>,
}

impl ChannelData {
    /// The zero-sequence, zero-recipient message an opener signs to
    /// authorize channel creation.
    pub fn open_authorization(channel_id: H256, timestamp: u64) -> Self {
        Self {
            channel_id,
            sequence_number: 0,
            timestamp,
            recipients: Vec::new(),
            amounts: Vec::new(),
        }
    }

    pub fn struct_hash(&self) -> H256 {
        let mut recipients = Vec::with_capacity(self.recipients.len() * 32);
        for recipient in &self.recipients {
            recipients.extend_from_slice(&address_word(recipient));
        }
        let mut amounts = Vec::with_capacity(self.amounts.len() * 32);
        for amount in &self.amounts {
            amounts.extend_from_slice(&amount.to_be_bytes_vec());
        }

        let mut encoded = Vec::with_capacity(6 * 32);
        encoded.extend_from_slice(&keccak256(CHANNEL_DATA_TYPE));
        encoded.extend_from_slice(self.channel_id.as_bytes());
        encoded.extend_from_slice(&U256::from(self.sequence_number).to_be_bytes_vec());
        encoded.extend_from_slice(&U256::from(self.timestamp).to_be_bytes_vec());
        encoded.extend_from_slice(&keccak256(&recipients));
        encoded.extend_from_slice(&keccak256(&amounts));
        H256::from(keccak256(&encoded))
    }
}

/// The 66-byte preimage `0x1901 || domainSeparator || structHash`.
pub fn encode_typed_data(domain: &ChannelDomain, message: &ChannelData) -> Vec<u8> {
    let mut encoded = Vec::with_capacity(2 + 32 + 32);
    encoded.extend_from_slice(&[0x19, 0x01]);
    encoded.extend_from_slice(domain.separator().as_bytes());
    encoded.extend_from_slice(message.struct_hash().as_bytes());
    encoded
}

/// The digest that gets signed.
pub fn typed_data_digest(domain: &ChannelDomain, message: &ChannelData) -> H256 {
    H256::from(keccak256(encode_typed_data(domain, message)))
}

/// Parse a hex address in any letter case.
pub fn parse_address(input: &str) -> Result<Address, ChannelError> {
    let trimmed = input.trim();
    let hex_part = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    if hex_part.len() != 40 {
        return Err(ChannelError::InvalidAddress(input.to_string()));
    }
    Address::from_str(hex_part).map_err(|_| ChannelError::InvalidAddress(input.to_string()))
}

/// Recover the address that produced `signature` over the voucher digest.
pub fn recover_signer(
    domain: &ChannelDomain,
    message: &ChannelData,
    signature: &Signature,
) -> Result<Address, ChannelError> {
    let digest = typed_data_digest(domain, message);
    signature
        .recover(RecoveryMessage::Hash(digest))
        .map_err(|e| ChannelError::Signing(format!("signature recovery failed: {e}")))
}
