//! Client side of a cumulative-balance streaming payment channel.
//!
//! [`ChannelBootstrapper`] recovers a channel from the sequencer or opens
//! it on-chain, [`ChannelState`] issues EIP-712 signed vouchers carrying
//! the cumulative amount owed to every recipient, and [`Settlement`] asks
//! the sequencer to close the channel on-chain.

pub mod bootstrap;
pub mod config;
pub mod network;
pub mod settlement;
pub mod state;
pub mod types;
pub mod utils;

pub use bootstrap::{BootstrapPolicy, BootstrapStage, ChannelBootstrapper};
pub use config::ClientConfig;
pub use network::{
    ChainClient, EthersChainClient, HttpSequencerClient, SequencerClient, TxReceipt,
};
pub use settlement::{Settlement, SettlementReceipt};
pub use state::{ChannelRecord, ChannelState};
pub use types::{Channel, ChannelError, LedgerSnapshot, PaymentPayload, Voucher};
pub use utils::{ChannelData, ChannelDomain, VoucherSigner};
