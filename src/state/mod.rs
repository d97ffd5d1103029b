pub mod channel;
pub mod record;

pub use channel::ChannelState;
pub use record::ChannelRecord;
