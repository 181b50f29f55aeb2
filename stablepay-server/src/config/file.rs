//! TOML file configuration structures.
//!
//! These structs directly map to the `stablepay-config.toml` file format.

use std::net::SocketAddr;

use alloy::primitives::Address;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use stablepay_sdk::objects::{Chain, Stablecoin};
use url::Url;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub checkout: CheckoutConfig,
    pub services: ServicesConfig,
    #[serde(default)]
    pub rpc: Vec<RpcConfig>,
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The address and port to listen on (e.g., "0.0.0.0:8080").
    #[serde(default = "default_listen_addr")]
    pub listen: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen_addr(),
        }
    }
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

/// Checkout policy. Every field is optional and falls back to the
/// built-in policy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckoutConfig {
    pub supported_chains: Option<Vec<Chain>>,
    pub supported_tokens: Option<Vec<Stablecoin>>,
    pub default_token: Option<Stablecoin>,
    pub min_protocol_fee: Option<Decimal>,
    pub min_mainnet_protocol_fee: Option<Decimal>,
    pub dust_multiplier: Option<Decimal>,
    pub intent_source: Option<Address>,
    pub inbox: Option<Address>,
    pub prover: Option<Address>,
    pub intent_deadline_secs: Option<u64>,
}

/// External service endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServicesConfig {
    pub relay_url: Url,
    pub quote_url: Url,
    pub name_resolver_url: Url,
    #[serde(default = "default_dapp_id")]
    pub dapp_id: String,
}

fn default_dapp_id() -> String {
    "stablepay".to_string()
}

/// JSON-RPC node for one chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    pub chain: Chain,
    pub url: Url,
}
