use crate::types::{Channel, ChannelError, ChannelSnapshot, LedgerSnapshot, Voucher};
use crate::utils::{parse_address, unix_now, ChannelData, VoucherSigner};
use ethers::types::{Address, H256, U256};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Ledger {
    sequence_number: u64,
    // Insertion order is the order recipients are encoded in every voucher.
    balances: Vec<(Address, U256)>,
    issued: u64,
}

impl Ledger {
    fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            sequence_number: self.sequence_number,
            balances: self.balances.clone(),
        }
    }
}

/// In-process ledger for one channel.
///
/// Cloning yields another handle to the same ledger. Voucher issuance holds
/// the write lock for the whole read-modify-sign-commit cycle, so concurrent
/// callers never share a sequence number.
#[derive(Clone, Debug)]
pub struct ChannelState {
    channel: Arc<Channel>,
    signer: Arc<VoucherSigner>,
    ledger: Arc<RwLock<Ledger>>,
}

impl ChannelState {
    pub fn new(channel: Channel, signer: VoucherSigner) -> Self {
        Self {
            channel: Arc::new(channel),
            signer: Arc::new(signer),
            ledger: Arc::new(RwLock::new(Ledger::default())),
        }
    }

    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    pub fn channel_id(&self) -> H256 {
        self.channel.channel_id
    }

    pub async fn create_voucher(
        &self,
        recipient: Address,
        amount: U256,
    ) -> Result<Voucher, ChannelError> {
        if amount.is_zero() {
            return Err(ChannelError::InvalidAmount);
        }
        if recipient.is_zero() {
            return Err(ChannelError::InvalidAddress(format!("{recipient:?}")));
        }

        let mut ledger = self.ledger.write().await;

        let sequence_number = ledger
            .sequence_number
            .checked_add(1)
            .ok_or(ChannelError::InvalidAmount)?;

        let mut balances = ledger.balances.clone();
        match balances.iter_mut().find(|(r, _)| *r == recipient) {
            Some((_, total)) => {
                *total = total
                    .checked_add(amount)
                    .ok_or(ChannelError::InvalidAmount)?;
            }
            None => balances.push((recipient, amount)),
        }

        let message = ChannelData {
            channel_id: self.channel.channel_id,
            sequence_number,
            timestamp: unix_now(),
            recipients: balances.iter().map(|(r, _)| *r).collect(),
            amounts: balances.iter().map(|(_, a)| *a).collect(),
        };
        let signature = self.signer.sign(&self.channel.domain, &message)?;

        ledger.sequence_number = sequence_number;
        ledger.balances = balances;
        ledger.issued += 1;

        tracing::debug!(
            channel_id = ?self.channel.channel_id,
            sequence_number,
            recipient = ?recipient,
            amount = %amount,
            "voucher issued"
        );

        Ok(Voucher {
            channel_id: message.channel_id,
            sequence_number,
            timestamp: message.timestamp,
            recipients: message.recipients,
            amounts: message.amounts,
            signature,
            receiver: recipient,
            amount,
        })
    }

    /// Same as [`create_voucher`](Self::create_voucher) for a recipient given
    /// as a hex string.
    pub async fn create_voucher_to(
        &self,
        recipient: &str,
        amount: U256,
    ) -> Result<Voucher, ChannelError> {
        let recipient = parse_address(recipient)?;
        self.create_voucher(recipient, amount).await
    }

    /// Overwrite sequence number and balances with the sequencer's view.
    ///
    /// Refused once this handle has issued vouchers, and whenever the remote
    /// sequence is behind the local one, since either would roll back
    /// progress. Malformed recipient entries are skipped.
    pub async fn sync_from(&self, remote: &ChannelSnapshot) -> Result<(), ChannelError> {
        let mut ledger = self.ledger.write().await;

        if ledger.issued > 0 || remote.sequence_number < ledger.sequence_number {
            return Err(ChannelError::StaleSync {
                local: ledger.sequence_number,
                remote: remote.sequence_number,
            });
        }

        let mut balances: Vec<(Address, U256)> = Vec::with_capacity(remote.recipients.len());
        for entry in &remote.recipients {
            let address = match parse_address(&entry.recipient_address) {
                Ok(address) => address,
                Err(_) => {
                    tracing::warn!(
                        address = %entry.recipient_address,
                        "skipping malformed recipient address from sequencer"
                    );
                    continue;
                }
            };
            let balance = match U256::from_dec_str(&entry.balance) {
                Ok(balance) => balance,
                Err(_) => {
                    tracing::warn!(
                        address = %entry.recipient_address,
                        balance = %entry.balance,
                        "skipping malformed recipient balance from sequencer"
                    );
                    continue;
                }
            };
            match balances.iter_mut().find(|(r, _)| *r == address) {
                Some((_, total)) => *total = balance,
                None => balances.push((address, balance)),
            }
        }

        ledger.sequence_number = remote.sequence_number;
        ledger.balances = balances;

        tracing::info!(
            channel_id = ?self.channel.channel_id,
            sequence_number = ledger.sequence_number,
            recipients = ledger.balances.len(),
            "channel state synced from sequencer"
        );
        Ok(())
    }

    pub async fn snapshot(&self) -> LedgerSnapshot {
        self.ledger.read().await.snapshot()
    }
}
