//! Human-readable name resolution (ENS, Base names).

use alloy::primitives::Address;
use reqwest::Client;
use url::Url;

use super::{ClientError, parse_response};

/// Client for a name-resolution API of the form
/// `GET /ens/resolve/{name}` → `{"address": "0x…" | null}`.
#[derive(Debug, Clone)]
pub struct NameResolverClient {
    http: Client,
    base_url: Url,
}

#[derive(Debug, serde::Deserialize)]
struct ResolveResponse {
    #[serde(default)]
    address: Option<Address>,
}

impl NameResolverClient {
    pub fn new(base_url: Url) -> Self {
        Self {
            http: Client::new(),
            base_url,
        }
    }

    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    /// Resolve `name` to an address. `Ok(None)` when the name has no record.
    pub async fn resolve(&self, name: &str) -> Result<Option<Address>, ClientError> {
        let url = self
            .base_url
            .join(&format!("ens/resolve/{}", urlencoding::encode(name)))?;
        let resp = self.http.get(url).send().await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let parsed: ResolveResponse = parse_response(resp).await?;
        Ok(parsed.address.filter(|address| !address.is_zero()))
    }
}
