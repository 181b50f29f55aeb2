//! Intent quoting client.

use reqwest::Client;
use url::Url;

use super::{ClientError, parse_response};
use crate::objects::intent::{Intent, Quote, QuoteRequest, QuoteResponse};

/// Typed HTTP client for the solver **quoting service**.
#[derive(Debug, Clone)]
pub struct QuoteClient {
    http: Client,
    base_url: Url,
    dapp_id: String,
}

impl QuoteClient {
    /// * `base_url` – root URL of the quoting service.
    /// * `dapp_id` – identifier sent with every quote request.
    pub fn new(base_url: Url, dapp_id: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url,
            dapp_id: dapp_id.into(),
        }
    }

    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    /// `POST /api/v1/quotes` – every solver quote currently offered for `intent`.
    pub async fn request_quotes(&self, intent: &Intent) -> Result<Vec<Quote>, ClientError> {
        let url = self.base_url.join("api/v1/quotes")?;
        let body = QuoteRequest {
            dapp_id: self.dapp_id.clone(),
            intent: intent.clone(),
        };
        let resp = self.http.post(url).json(&body).send().await?;
        let parsed: QuoteResponse = parse_response(resp).await?;
        tracing::debug!(
            source = intent.route.source,
            destination = intent.route.destination,
            quotes = parsed.data.len(),
            "Received intent quotes"
        );
        Ok(parsed.data)
    }
}
