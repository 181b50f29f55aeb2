//! Cross-chain intent and quote shapes exchanged with the routing service.
//!
//! An [`Intent`] moves tokens from a source chain to a destination chain: the
//! route describes what must arrive and which calls run on the destination,
//! the reward describes what the payer locks on the source chain to pay the
//! solver. A [`Quote`] tells how much reward a solver wants for a route.

use alloy::primitives::{Address, B256, Bytes, U256};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenAmount {
    pub token: Address,
    pub amount: U256,
}

/// A call executed on the destination chain once the route is fulfilled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteCall {
    pub target: Address,
    pub data: Bytes,
    pub value: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub salt: B256,
    pub source: u64,
    pub destination: u64,
    pub inbox: Address,
    pub tokens: Vec<TokenAmount>,
    pub calls: Vec<RouteCall>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reward {
    pub creator: Address,
    pub prover: Address,
    /// Unix timestamp after which the reward can be refunded.
    pub deadline: u64,
    pub native_value: U256,
    pub tokens: Vec<TokenAmount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    pub route: Route,
    pub reward: Reward,
}

/// A solver's offer to fulfill an intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    #[serde(rename = "quoteID")]
    pub quote_id: String,
    #[serde(default)]
    pub solver_id: Option<String>,
    pub reward_tokens: Vec<TokenAmount>,
    #[serde(default)]
    pub route_tokens: Vec<TokenAmount>,
    pub expiry_time: u64,
    #[serde(default)]
    pub estimated_fulfill_time_sec: Option<u64>,
}

impl Quote {
    pub fn reward_total(&self) -> U256 {
        self.reward_tokens
            .iter()
            .fold(U256::ZERO, |acc, t| acc.saturating_add(t.amount))
    }
}

/// An intent with a solver quote applied to its reward and route tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentWithQuote {
    pub intent: Intent,
    #[serde(rename = "quoteID")]
    pub quote_id: String,
}

/// Body of a quote request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub dapp_id: String,
    pub intent: Intent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteResponse {
    pub data: Vec<Quote>,
}
