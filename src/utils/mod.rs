pub mod crypto;
pub mod signer;

pub use crypto::{parse_address, recover_signer, typed_data_digest, ChannelData, ChannelDomain};
pub use signer::VoucherSigner;

use std::time::{SystemTime, UNIX_EPOCH};

pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
