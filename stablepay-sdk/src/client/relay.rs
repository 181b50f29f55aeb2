//! Relaying service client (checkout backend → relaying service).

use alloy::primitives::Address;
use reqwest::Client;
use url::Url;

use super::{ClientError, parse_response};
use crate::objects::relay::{
    BalancesResponse, ExecuteIntentRequest, ExecuteIntentResponse, GetIntentsRequest,
    GetIntentsResponse, SendRequest, SendResponse, TransfersRequest, TransfersResponse,
};

/// Typed HTTP client for the external **relaying service**.
///
/// The relaying service indexes balances, suggests optimal transfers,
/// prepares permit payloads and executes signed intents.
#[derive(Debug, Clone)]
pub struct RelayClient {
    http: Client,
    base_url: Url,
}

impl RelayClient {
    /// Create a new `RelayClient` rooted at `base_url`.
    pub fn new(base_url: Url) -> Self {
        Self {
            http: Client::new(),
            base_url,
        }
    }

    /// Replace the default `reqwest::Client` with a custom one.
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    /// `GET /balances/{address}` – balances of `address` keyed by chain name.
    pub async fn balances(&self, address: Address) -> Result<BalancesResponse, ClientError> {
        let url = self.base_url.join(&format!("balances/{address}"))?;
        tracing::debug!(%address, "Fetching balances");
        let resp = self.http.get(url).send().await?;
        parse_response(resp).await
    }

    /// `POST /getTransfers` – suggested balances covering a transfer amount.
    pub async fn get_transfers(
        &self,
        request: &TransfersRequest,
    ) -> Result<TransfersResponse, ClientError> {
        let url = self.base_url.join("getTransfers")?;
        let resp = self.http.post(url).json(request).send().await?;
        parse_response(resp).await
    }

    /// `POST /send` – obtain the permit payload for a gasless payment.
    pub async fn send(&self, request: &SendRequest) -> Result<SendResponse, ClientError> {
        let url = self.base_url.join("send")?;
        let resp = self.http.post(url).json(request).send().await?;
        parse_response(resp).await
    }

    /// `POST /executeIntent` – submit a signed permit payload.
    pub async fn execute_intent(
        &self,
        request: &ExecuteIntentRequest,
    ) -> Result<ExecuteIntentResponse, ClientError> {
        let url = self.base_url.join("executeIntent")?;
        let resp = self.http.post(url).json(request).send().await?;
        parse_response(resp).await
    }

    /// `POST /getIntents` – resolve quote ids to on-chain transactions.
    pub async fn get_intents(
        &self,
        request: &GetIntentsRequest,
    ) -> Result<GetIntentsResponse, ClientError> {
        let url = self.base_url.join("getIntents")?;
        let resp = self.http.post(url).json(request).send().await?;
        parse_response(resp).await
    }
}
