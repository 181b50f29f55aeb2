//! Addresses of the external services and RPC nodes.

use std::net::SocketAddr;

use stablepay_sdk::objects::Chain;
use url::Url;

/// Server configuration with runtime values.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// The address and port to listen on.
    pub listen: SocketAddr,
}

/// Base URLs of the external collaborators.
///
/// Every URL ends with `/` so endpoint paths can be joined onto it.
#[derive(Debug, Clone)]
pub struct ServicesConfig {
    /// Relaying service (balances, transfer suggestions, permits, intent execution).
    pub relay_url: Url,
    /// Solver quoting service.
    pub quote_url: Url,
    /// Name-resolution service.
    pub name_resolver_url: Url,
    /// Identifier sent with quote requests.
    pub dapp_id: String,
}

/// JSON-RPC endpoint used for on-chain reads on one chain.
#[derive(Debug, Clone)]
pub struct RpcEndpoint {
    pub chain: Chain,
    pub url: Url,
}
