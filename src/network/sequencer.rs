use super::SequencerClient;
use crate::types::{
    format_channel_id, ChannelSnapshot, ChannelsByOwnerResponse, FinalizeChannelRequest,
    FinalizeChannelResponse, SeedChannelRequest, SequencerError,
};
use async_trait::async_trait;
use ethers::types::{Address, TxHash, H256};
use reqwest::{Client, StatusCode};
use std::str::FromStr;
use url::Url;

/// Typed HTTP client for the sequencer API.
#[derive(Debug, Clone)]
pub struct HttpSequencerClient {
    http: Client,
    base_url: Url,
}

impl HttpSequencerClient {
    pub fn new(base_url: Url) -> Self {
        Self {
            http: Client::new(),
            base_url,
        }
    }

    /// Replace the default `reqwest::Client`, e.g. to set a request timeout.
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

#[async_trait]
impl SequencerClient for HttpSequencerClient {
    /// `GET /channel/{id}`
    async fn get_channel(
        &self,
        channel_id: H256,
    ) -> Result<Option<ChannelSnapshot>, SequencerError> {
        let url = self
            .base_url
            .join(&format!("/channel/{}", format_channel_id(channel_id)))?;

        let resp = self.http.get(url).send().await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        parse_response(resp).await.map(Some)
    }

    /// `POST /channel/seed`
    async fn seed_channel(&self, payload: &SeedChannelRequest) -> Result<(), SequencerError> {
        let url = self.base_url.join("/channel/seed")?;

        let resp = self.http.post(url).json(payload).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SequencerError::Api { status, body });
        }
        Ok(())
    }

    /// `POST /channel/finalize`
    async fn finalize_channel(&self, channel_id: H256) -> Result<TxHash, SequencerError> {
        let url = self.base_url.join("/channel/finalize")?;
        let body = FinalizeChannelRequest {
            channel_id: format_channel_id(channel_id),
        };

        let resp = self.http.post(url).json(&body).send().await?;
        let finalized: FinalizeChannelResponse = parse_response(resp).await?;

        TxHash::from_str(&finalized.transaction_hash).map_err(|_| {
            SequencerError::InvalidResponse(format!(
                "invalid transaction hash: {}",
                finalized.transaction_hash
            ))
        })
    }

    /// `GET /channels/by-owner/{owner}`
    async fn channels_by_owner(
        &self,
        owner: Address,
    ) -> Result<ChannelsByOwnerResponse, SequencerError> {
        let url = self
            .base_url
            .join(&format!("/channels/by-owner/{owner:?}"))?;

        let resp = self.http.get(url).send().await?;
        parse_response(resp).await
    }

    /// `GET /health`
    async fn health(&self) -> Result<(), SequencerError> {
        let url = self.base_url.join("/health")?;

        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SequencerError::Api { status, body });
        }
        Ok(())
    }
}

async fn parse_response<T: serde::de::DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<T, SequencerError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(SequencerError::Api { status, body });
    }
    let bytes = resp.bytes().await?;
    serde_json::from_slice(&bytes).map_err(SequencerError::Json)
}
