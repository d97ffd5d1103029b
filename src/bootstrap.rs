//! Bringing a channel from "unknown" to "ready".
//!
//! The sequencer is always asked first. Only on a miss does the
//! bootstrapper touch the chain: derive the channel id, make sure the
//! contract may pull the deposit, open the channel and wait for it to be
//! mined, then seed the sequencer.

use crate::network::{ChainClient, SequencerClient};
use crate::state::ChannelState;
use crate::types::{format_channel_id, Channel, ChannelError, ChannelSnapshot, SeedChannelRequest};
use crate::utils::{parse_address, unix_now, ChannelData, ChannelDomain, VoucherSigner};
use ethers::types::{Bytes, H256, U256};
use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};
use tokio::sync::Mutex;

/// How a missing channel gets established.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BootstrapPolicy {
    /// Approve and open on-chain, then seed the sequencer.
    #[default]
    OnChain,
    /// Seed the sequencer with a caller-supplied id and never touch the
    /// chain. Only meant for local testing against a bare sequencer.
    SequencerOnly,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BootstrapStage {
    Unknown,
    SequencerSynced,
    IdComputed,
    AllowanceChecked,
    Approved,
    OnChainOpened,
    SequencerSeeded,
    Ready,
    Aborted,
}

impl fmt::Display for BootstrapStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

struct Progress {
    channel_id: Option<H256>,
    stage: BootstrapStage,
    on_chain_attempted: bool,
}

impl Progress {
    fn new(channel_id: Option<H256>) -> Self {
        Self {
            channel_id,
            stage: BootstrapStage::Unknown,
            on_chain_attempted: false,
        }
    }

    fn advance(&mut self, next: BootstrapStage) {
        tracing::debug!(
            channel_id = ?self.channel_id,
            from = %self.stage,
            to = %next,
            "bootstrap stage"
        );
        self.stage = next;
    }
}

pub struct ChannelBootstrapper {
    sequencer: Arc<dyn SequencerClient>,
    chain: Arc<dyn ChainClient>,
    signer: VoucherSigner,
    domain: ChannelDomain,
    policy: BootstrapPolicy,
    single_flight: Mutex<()>,
}

impl ChannelBootstrapper {
    pub fn new(
        sequencer: Arc<dyn SequencerClient>,
        chain: Arc<dyn ChainClient>,
        signer: VoucherSigner,
        domain: ChannelDomain,
    ) -> Self {
        Self {
            sequencer,
            chain,
            signer,
            domain,
            policy: BootstrapPolicy::default(),
            single_flight: Mutex::new(()),
        }
    }

    pub fn with_policy(mut self, policy: BootstrapPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> BootstrapPolicy {
        self.policy
    }

    /// Return a ready [`ChannelState`], recovering it from the sequencer or
    /// opening a new channel on-chain.
    ///
    /// Calls on one bootstrapper are serialized. A failure after any
    /// transaction was sent aborts the bootstrap; calling again re-queries
    /// the sequencer and chain instead of assuming nothing happened.
    pub async fn ensure(
        &self,
        channel_hint: Option<H256>,
        initial_balance: U256,
        expiry: u64,
    ) -> Result<ChannelState, ChannelError> {
        let _guard = self.single_flight.lock().await;

        let mut progress = Progress::new(channel_hint);
        let result = self
            .run(&mut progress, channel_hint, initial_balance, expiry)
            .await;

        if let Err(e) = &result {
            if progress.on_chain_attempted {
                progress.advance(BootstrapStage::Aborted);
            }
            tracing::error!(
                channel_id = ?progress.channel_id,
                stage = %progress.stage,
                error = %e,
                "channel bootstrap failed"
            );
        }
        result
    }

    /// Attach to a channel that was opened before, without sending any
    /// transaction. The sequencer is asked first; a channel that only
    /// exists on-chain is re-seeded. Anything else is
    /// [`ChannelError::UnknownChannel`].
    pub async fn attach(
        &self,
        channel_id: H256,
        initial_balance: U256,
        expiry: u64,
    ) -> Result<ChannelState, ChannelError> {
        let _guard = self.single_flight.lock().await;

        let mut progress = Progress::new(Some(channel_id));
        if let Some(state) = self.recover(&mut progress, channel_id, expiry).await? {
            return Ok(state);
        }
        if self.policy == BootstrapPolicy::OnChain
            && self.chain.channel_exists(channel_id).await?
        {
            progress.advance(BootstrapStage::OnChainOpened);
            self.seed_opened(&mut progress, channel_id, initial_balance, expiry)
                .await;
            return Ok(self.ready(&mut progress, channel_id, expiry));
        }
        tracing::warn!(channel_id = ?channel_id, "channel not found on sequencer or chain");
        Err(ChannelError::UnknownChannel)
    }

    async fn run(
        &self,
        progress: &mut Progress,
        channel_hint: Option<H256>,
        initial_balance: U256,
        expiry: u64,
    ) -> Result<ChannelState, ChannelError> {
        if initial_balance.is_zero() {
            return Err(ChannelError::InvalidAmount);
        }

        if let Some(channel_id) = channel_hint {
            if let Some(state) = self.recover(progress, channel_id, expiry).await? {
                return Ok(state);
            }
            tracing::info!(channel_id = ?channel_id, "channel unknown to sequencer");
        }

        if self.policy == BootstrapPolicy::SequencerOnly {
            let channel_id = channel_hint.ok_or(ChannelError::UnknownChannel)?;
            self.sequencer
                .seed_channel(&self.seed_payload(channel_id, initial_balance, expiry))
                .await?;
            progress.advance(BootstrapStage::SequencerSeeded);
            return Ok(self.ready(progress, channel_id, expiry));
        }

        let owner = self.signer.address();
        let channel_id = self
            .chain
            .get_channel_id_for(owner, expiry, initial_balance)
            .await?;
        progress.channel_id = Some(channel_id);
        progress.advance(BootstrapStage::IdComputed);

        // A previous, interrupted ensure may already have opened this id.
        if channel_hint != Some(channel_id) {
            if let Some(hint) = channel_hint {
                tracing::warn!(
                    hint = ?hint,
                    channel_id = ?channel_id,
                    "channel hint differs from the contract-derived id"
                );
            }
            if let Some(state) = self.recover(progress, channel_id, expiry).await? {
                return Ok(state);
            }
        }

        // Opened earlier but never seeded: the deposit is already escrowed.
        if self.chain.channel_exists(channel_id).await? {
            tracing::info!(channel_id = ?channel_id, "channel already open on-chain");
            progress.advance(BootstrapStage::OnChainOpened);
            self.seed_opened(progress, channel_id, initial_balance, expiry)
                .await;
            return Ok(self.ready(progress, channel_id, expiry));
        }

        let allowance = self.chain.get_allowance(owner).await?;
        progress.advance(BootstrapStage::AllowanceChecked);

        if allowance < initial_balance {
            tracing::info!(
                allowance = %allowance,
                required = %initial_balance,
                "approving channel contract"
            );
            progress.on_chain_attempted = true;
            let tx_hash = self.chain.approve(initial_balance).await?;
            let receipt = self.chain.wait_for_receipt(tx_hash).await?;
            if !receipt.success {
                return Err(ChannelError::ApprovalFailed { tx_hash });
            }

            let granted = self.chain.get_allowance(owner).await?;
            if granted < initial_balance {
                return Err(ChannelError::InsufficientAllowance {
                    required: initial_balance,
                    granted,
                });
            }
            progress.advance(BootstrapStage::Approved);
        }

        let timestamp = unix_now();
        let authorization = ChannelData::open_authorization(channel_id, timestamp);
        let signature = self.signer.sign(&self.domain, &authorization)?;

        progress.on_chain_attempted = true;
        let tx_hash = self
            .chain
            .open_channel(
                initial_balance,
                expiry,
                timestamp,
                Bytes::from(signature.to_vec()),
            )
            .await?;
        tracing::info!(channel_id = ?channel_id, tx_hash = ?tx_hash, "open transaction sent");

        let receipt = self.chain.wait_for_receipt(tx_hash).await?;
        if !receipt.success {
            return Err(ChannelError::OnChainOpenFailed { tx_hash });
        }
        progress.advance(BootstrapStage::OnChainOpened);

        self.seed_opened(progress, channel_id, initial_balance, expiry)
            .await;
        Ok(self.ready(progress, channel_id, expiry))
    }

    /// Seed a channel that is known to be open on-chain. A failure is only
    /// logged: the channel stays valid and a later call re-seeds it.
    async fn seed_opened(
        &self,
        progress: &mut Progress,
        channel_id: H256,
        initial_balance: U256,
        expiry: u64,
    ) {
        match self
            .sequencer
            .seed_channel(&self.seed_payload(channel_id, initial_balance, expiry))
            .await
        {
            Ok(()) => progress.advance(BootstrapStage::SequencerSeeded),
            Err(e) => tracing::warn!(
                channel_id = ?channel_id,
                error = %e,
                "channel open on-chain but sequencer seed failed"
            ),
        }
    }

    async fn recover(
        &self,
        progress: &mut Progress,
        channel_id: H256,
        expiry: u64,
    ) -> Result<Option<ChannelState>, ChannelError> {
        let Some(snapshot) = self.sequencer.get_channel(channel_id).await? else {
            return Ok(None);
        };
        self.check_owner(&snapshot)?;

        let state = ChannelState::new(
            self.channel(channel_id, remote_expiry(&snapshot).unwrap_or(expiry)),
            self.signer.clone(),
        );
        state.sync_from(&snapshot).await?;
        progress.channel_id = Some(channel_id);
        progress.advance(BootstrapStage::SequencerSynced);
        progress.advance(BootstrapStage::Ready);
        Ok(Some(state))
    }

    fn check_owner(&self, snapshot: &ChannelSnapshot) -> Result<(), ChannelError> {
        if snapshot.owner.is_empty() {
            return Ok(());
        }
        let owner = parse_address(&snapshot.owner)?;
        if owner != self.signer.address() {
            tracing::warn!(
                channel_owner = ?owner,
                signer = ?self.signer.address(),
                "sequencer channel belongs to another owner"
            );
            return Err(ChannelError::InvalidAddress(snapshot.owner.clone()));
        }
        Ok(())
    }

    fn ready(&self, progress: &mut Progress, channel_id: H256, expiry: u64) -> ChannelState {
        progress.advance(BootstrapStage::Ready);
        tracing::info!(channel_id = ?channel_id, "channel ready");
        ChannelState::new(self.channel(channel_id, expiry), self.signer.clone())
    }

    fn channel(&self, channel_id: H256, expiry: u64) -> Channel {
        Channel {
            channel_id,
            owner: self.signer.address(),
            domain: self.domain.clone(),
            expiry,
        }
    }

    fn seed_payload(&self, channel_id: H256, balance: U256, expiry: u64) -> SeedChannelRequest {
        SeedChannelRequest {
            channel_id: format_channel_id(channel_id),
            owner: format!("{:?}", self.signer.address()),
            balance: balance.to_string(),
            expiry_timestamp: expiry,
        }
    }
}

fn remote_expiry(snapshot: &ChannelSnapshot) -> Option<u64> {
    (snapshot.expiry_timestamp > 0).then_some(snapshot.expiry_timestamp)
}
