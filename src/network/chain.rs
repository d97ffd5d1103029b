use super::{ChainClient, TxReceipt};
use crate::types::ChainError;
use async_trait::async_trait;
use ethers::{
    contract::abigen,
    middleware::SignerMiddleware,
    providers::{Http, Middleware, Provider},
    signers::{LocalWallet, Signer},
    types::{Address, Bytes, TxHash, H256, U256, U64},
};
use std::{sync::Arc, time::Duration};

abigen!(
    StreamChannelContract,
    r#"[
        function getChannelId(address owner, uint256 expiry, uint256 amount) external view returns (bytes32)
        function channels(bytes32 channelId) external view returns (address owner, uint256 balance, uint256 expiryTime, uint256 sequenceNumber)
        function openChannel(uint256 amount, uint256 expiry, uint256 timestamp, bytes signature) external returns (bytes32)
    ]"#
);

abigen!(
    Erc20Token,
    r#"[
        function allowance(address owner, address spender) external view returns (uint256)
        function approve(address spender, uint256 amount) external returns (bool)
    ]"#
);

type SignerClient = SignerMiddleware<Provider<Http>, LocalWallet>;

/// JSON-RPC backed [`ChainClient`] signing transactions with the owner key.
#[derive(Clone)]
pub struct EthersChainClient {
    client: Arc<SignerClient>,
    channel_contract: StreamChannelContract<SignerClient>,
    token: Erc20Token<SignerClient>,
    poll_interval: Duration,
}

impl EthersChainClient {
    pub fn new(
        rpc_url: &str,
        wallet: LocalWallet,
        chain_id: u64,
        channel_contract: Address,
        token: Address,
        poll_interval: Duration,
    ) -> Result<Self, ChainError> {
        let provider =
            Provider::<Http>::try_from(rpc_url).map_err(|e| ChainError::Provider(e.to_string()))?;
        let client = Arc::new(SignerMiddleware::new(
            provider,
            wallet.with_chain_id(chain_id),
        ));

        Ok(Self {
            channel_contract: StreamChannelContract::new(channel_contract, client.clone()),
            token: Erc20Token::new(token, client.clone()),
            client,
            poll_interval,
        })
    }

    pub fn channel_contract_address(&self) -> Address {
        self.channel_contract.address()
    }
}

#[async_trait]
impl ChainClient for EthersChainClient {
    async fn get_allowance(&self, owner: Address) -> Result<U256, ChainError> {
        self.token
            .allowance(owner, self.channel_contract.address())
            .call()
            .await
            .map_err(|e| ChainError::Contract(e.to_string()))
    }

    async fn approve(&self, amount: U256) -> Result<TxHash, ChainError> {
        let call = self.token.approve(self.channel_contract.address(), amount);
        let pending = call
            .send()
            .await
            .map_err(|e| ChainError::Contract(e.to_string()))?;
        Ok(*pending)
    }

    async fn open_channel(
        &self,
        amount: U256,
        expiry: u64,
        timestamp: u64,
        signature: Bytes,
    ) -> Result<TxHash, ChainError> {
        let call = self.channel_contract.open_channel(
            amount,
            U256::from(expiry),
            U256::from(timestamp),
            signature,
        );
        let pending = call
            .send()
            .await
            .map_err(|e| ChainError::Contract(e.to_string()))?;
        Ok(*pending)
    }

    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<TxReceipt, ChainError> {
        loop {
            let receipt = self
                .client
                .get_transaction_receipt(tx_hash)
                .await
                .map_err(|e| ChainError::Provider(e.to_string()))?;

            if let Some(receipt) = receipt {
                return Ok(TxReceipt {
                    tx_hash,
                    success: receipt.status == Some(U64::from(1)),
                    block_number: receipt.block_number.map(|n| n.as_u64()),
                });
            }

            tracing::trace!(tx_hash = ?tx_hash, "transaction not mined yet");
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn channel_exists(&self, channel_id: H256) -> Result<bool, ChainError> {
        let (owner, _balance, _expiry, _sequence) = self
            .channel_contract
            .channels(channel_id.into())
            .call()
            .await
            .map_err(|e| ChainError::Contract(e.to_string()))?;
        Ok(!owner.is_zero())
    }

    async fn get_channel_id_for(
        &self,
        owner: Address,
        expiry: u64,
        amount: U256,
    ) -> Result<H256, ChainError> {
        let id = self
            .channel_contract
            .get_channel_id(owner, U256::from(expiry), amount)
            .call()
            .await
            .map_err(|e| ChainError::Contract(e.to_string()))?;
        Ok(H256::from(id))
    }
}
