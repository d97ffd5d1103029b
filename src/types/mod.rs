pub mod channel;
pub mod error;
pub mod sequencer;

pub use channel::{format_channel_id, Channel, LedgerSnapshot, PaymentPayload, Voucher};
pub use error::{ChainError, ChannelError, ConfigError, SequencerError, StoreError};
pub use sequencer::{
    ChannelSnapshot, ChannelsByOwnerResponse, FinalizeChannelRequest, FinalizeChannelResponse,
    RecipientBalance, SeedChannelRequest,
};
