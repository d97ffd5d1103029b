use crate::types::ChannelError;
use crate::utils::crypto::{typed_data_digest, ChannelData, ChannelDomain};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, Signature};
use std::str::FromStr;

/// Holds the owner's key and signs `ChannelData` digests.
///
/// Signing is a pure computation: no network access and no channel state
/// is touched here.
#[derive(Clone, Debug)]
pub struct VoucherSigner {
    wallet: LocalWallet,
}

impl VoucherSigner {
    pub fn new(wallet: LocalWallet) -> Self {
        Self { wallet }
    }

    pub fn from_private_key(key: &str) -> Result<Self, ChannelError> {
        let wallet = LocalWallet::from_str(key.trim_start_matches("0x"))
            .map_err(|e| ChannelError::Signing(format!("invalid private key: {e}")))?;
        Ok(Self::new(wallet))
    }

    pub fn address(&self) -> Address {
        self.wallet.address()
    }

    pub fn wallet(&self) -> &LocalWallet {
        &self.wallet
    }

    pub fn sign(
        &self,
        domain: &ChannelDomain,
        message: &ChannelData,
    ) -> Result<Signature, ChannelError> {
        let digest = typed_data_digest(domain, message);
        self.wallet
            .sign_hash(digest)
            .map_err(|e| ChannelError::Signing(e.to_string()))
    }
}
