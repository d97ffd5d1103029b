#![allow(dead_code)]

use async_trait::async_trait;
use ethers::types::{Address, Bytes, TxHash, H256, U256};
use ethers::utils::keccak256;
use reqwest::StatusCode;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use stream_channel_client::types::{
    ChainError, ChannelSnapshot, ChannelsByOwnerResponse, RecipientBalance, SeedChannelRequest,
    SequencerError,
};
use stream_channel_client::{ChainClient, ChannelDomain, SequencerClient, TxReceipt, VoucherSigner};

pub const TEST_KEY: &str = "1234567890123456789012345678901234567890123456789012345678901234";

pub fn create_test_signer() -> VoucherSigner {
    VoucherSigner::from_private_key(TEST_KEY).unwrap()
}

pub fn create_test_domain() -> ChannelDomain {
    ChannelDomain::new(31337, Address::repeat_byte(0xcc))
}

pub fn snapshot(sequence_number: u64, recipients: &[(Address, u64)]) -> ChannelSnapshot {
    ChannelSnapshot {
        sequence_number,
        recipients: recipients
            .iter()
            .map(|(address, balance)| RecipientBalance {
                recipient_address: format!("{address:?}"),
                balance: balance.to_string(),
            })
            .collect(),
        ..Default::default()
    }
}

#[derive(Default)]
pub struct MockSequencer {
    pub channels: Mutex<HashMap<H256, ChannelSnapshot>>,
    pub seeds: Mutex<Vec<SeedChannelRequest>>,
    pub get_calls: AtomicUsize,
    pub fail_seed: AtomicBool,
    pub fail_get: AtomicBool,
    pub finalize_tx: Mutex<Option<TxHash>>,
}

impl MockSequencer {
    pub fn with_channel(channel_id: H256, snapshot: ChannelSnapshot) -> Self {
        let sequencer = Self::default();
        sequencer
            .channels
            .lock()
            .unwrap()
            .insert(channel_id, snapshot);
        sequencer
    }

    pub fn seed_calls(&self) -> usize {
        self.seeds.lock().unwrap().len()
    }

    fn unavailable() -> SequencerError {
        SequencerError::Api {
            status: StatusCode::SERVICE_UNAVAILABLE,
            body: "sequencer down".into(),
        }
    }
}

#[async_trait]
impl SequencerClient for MockSequencer {
    async fn get_channel(
        &self,
        channel_id: H256,
    ) -> Result<Option<ChannelSnapshot>, SequencerError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_get.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }
        Ok(self.channels.lock().unwrap().get(&channel_id).cloned())
    }

    async fn seed_channel(&self, payload: &SeedChannelRequest) -> Result<(), SequencerError> {
        self.seeds.lock().unwrap().push(payload.clone());
        if self.fail_seed.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }
        let channel_id: H256 = payload.channel_id.parse().unwrap();
        self.channels.lock().unwrap().insert(
            channel_id,
            ChannelSnapshot {
                channel_id: payload.channel_id.clone(),
                owner: payload.owner.clone(),
                balance: payload.balance.clone(),
                expiry_timestamp: payload.expiry_timestamp,
                sequence_number: 0,
                recipients: Vec::new(),
            },
        );
        Ok(())
    }

    async fn finalize_channel(&self, _channel_id: H256) -> Result<TxHash, SequencerError> {
        self.finalize_tx
            .lock()
            .unwrap()
            .ok_or_else(Self::unavailable)
    }

    async fn channels_by_owner(
        &self,
        owner: Address,
    ) -> Result<ChannelsByOwnerResponse, SequencerError> {
        Ok(ChannelsByOwnerResponse {
            owner: format!("{owner:?}"),
            channel_ids: self
                .channels
                .lock()
                .unwrap()
                .keys()
                .map(|id| format!("{id:?}"))
                .collect(),
        })
    }

    async fn health(&self) -> Result<(), SequencerError> {
        Ok(())
    }
}

pub struct OpenCall {
    pub amount: U256,
    pub expiry: u64,
    pub timestamp: u64,
    pub signature: Bytes,
}

#[derive(Default)]
pub struct MockChain {
    pub allowance: Mutex<U256>,
    // Allowance an approval actually leaves behind; None grants the requested amount.
    pub approve_grants: Mutex<Option<U256>>,
    pub revert_open: AtomicBool,
    pub revert_approve: AtomicBool,
    pub approve_calls: AtomicUsize,
    pub opens: Mutex<Vec<OpenCall>>,
    pub receipts: Mutex<HashMap<TxHash, bool>>,
    // Ids the contract holds; a mined open adds the last derived id.
    pub open_ids: Mutex<HashSet<H256>>,
    last_derived: Mutex<Option<H256>>,
}

impl MockChain {
    pub fn with_allowance(allowance: U256) -> Self {
        let chain = Self::default();
        *chain.allowance.lock().unwrap() = allowance;
        chain
    }

    pub fn derive_id(owner: Address, expiry: u64, amount: U256) -> H256 {
        let mut data = Vec::new();
        data.extend_from_slice(owner.as_bytes());
        data.extend_from_slice(&expiry.to_be_bytes());
        let mut amount_bytes = [0u8; 32];
        amount.to_big_endian(&mut amount_bytes);
        data.extend_from_slice(&amount_bytes);
        H256::from(keccak256(data))
    }

    pub fn open_calls(&self) -> usize {
        self.opens.lock().unwrap().len()
    }

    pub fn transactions(&self) -> usize {
        self.approve_calls.load(Ordering::SeqCst) + self.open_calls()
    }

    pub fn mark_open(&self, channel_id: H256) {
        self.open_ids.lock().unwrap().insert(channel_id);
    }

    pub fn add_receipt(&self, tx_hash: TxHash, success: bool) {
        self.receipts.lock().unwrap().insert(tx_hash, success);
    }
}

#[async_trait]
impl ChainClient for MockChain {
    async fn get_allowance(&self, _owner: Address) -> Result<U256, ChainError> {
        Ok(*self.allowance.lock().unwrap())
    }

    async fn approve(&self, amount: U256) -> Result<TxHash, ChainError> {
        self.approve_calls.fetch_add(1, Ordering::SeqCst);
        let tx_hash = TxHash::random();
        let success = !self.revert_approve.load(Ordering::SeqCst);
        if success {
            let granted = self.approve_grants.lock().unwrap().unwrap_or(amount);
            *self.allowance.lock().unwrap() = granted;
        }
        self.add_receipt(tx_hash, success);
        Ok(tx_hash)
    }

    async fn open_channel(
        &self,
        amount: U256,
        expiry: u64,
        timestamp: u64,
        signature: Bytes,
    ) -> Result<TxHash, ChainError> {
        self.opens.lock().unwrap().push(OpenCall {
            amount,
            expiry,
            timestamp,
            signature,
        });
        let tx_hash = TxHash::random();
        let success = !self.revert_open.load(Ordering::SeqCst);
        if success {
            if let Some(channel_id) = *self.last_derived.lock().unwrap() {
                self.mark_open(channel_id);
            }
        }
        self.add_receipt(tx_hash, success);
        Ok(tx_hash)
    }

    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<TxReceipt, ChainError> {
        let success = self
            .receipts
            .lock()
            .unwrap()
            .get(&tx_hash)
            .copied()
            .ok_or_else(|| ChainError::Provider(format!("unknown transaction {tx_hash:?}")))?;
        Ok(TxReceipt {
            tx_hash,
            success,
            block_number: Some(42),
        })
    }

    async fn get_channel_id_for(
        &self,
        owner: Address,
        expiry: u64,
        amount: U256,
    ) -> Result<H256, ChainError> {
        let channel_id = Self::derive_id(owner, expiry, amount);
        *self.last_derived.lock().unwrap() = Some(channel_id);
        Ok(channel_id)
    }

    async fn channel_exists(&self, channel_id: H256) -> Result<bool, ChainError> {
        Ok(self.open_ids.lock().unwrap().contains(&channel_id))
    }
}
