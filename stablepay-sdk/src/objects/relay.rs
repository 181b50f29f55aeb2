//! Wire types of the external relaying service.
//!
//! The relaying service indexes payer balances, suggests which balances to
//! spend, prepares permit payloads for gasless settlement, and executes
//! signed intents.

use std::collections::BTreeMap;

use alloy::primitives::{Address, B256};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One token balance as reported by the balances endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceEntry {
    pub token: String,
    pub amount: Decimal,
}

/// `GET balances/{address}`: balances keyed by chain name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BalancesResponse(pub BTreeMap<String, Vec<BalanceEntry>>);

/// `POST getTransfers` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransfersRequest {
    pub sender: Address,
    pub recipient: Address,
    pub destination_network: u64,
    pub destination_token: String,
    pub transfer_amount: Decimal,
}

/// One balance the relaying service suggests spending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestedTransfer {
    #[serde(rename = "chainID")]
    pub chain_id: u64,
    pub token_symbol: String,
    pub amount: Decimal,
    #[serde(default)]
    pub has_permit: bool,
    #[serde(default)]
    pub permit3_allowance: Option<Decimal>,
}

/// `POST getTransfers` response: suggestions grouped by an opaque key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransfersResponse(pub BTreeMap<String, Vec<SuggestedTransfer>>);

impl TransfersResponse {
    /// All suggestions, group by group.
    pub fn suggestions(&self) -> impl Iterator<Item = &SuggestedTransfer> {
        self.0.values().flatten()
    }
}

/// A single source leg of a gasless payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferLeg {
    #[serde(rename = "chainID")]
    pub chain_id: u64,
    pub token_symbol: String,
    pub amount: Decimal,
}

/// `POST send` body: asks the relaying service for a permit payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendRequest {
    pub sender: Address,
    pub recipient: Address,
    pub destination_network: u64,
    pub destination_token: String,
    pub transfers: Vec<TransferLeg>,
}

/// EIP-712 payload the payer must sign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureData {
    pub domain: serde_json::Value,
    #[serde(default)]
    pub types: serde_json::Value,
    #[serde(default)]
    pub primary_type: Option<String>,
    pub message: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendResponse {
    pub signature_data: SignatureData,
    #[serde(rename = "requestID")]
    pub request_id: String,
}

/// `POST executeIntent` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteIntentRequest {
    #[serde(rename = "requestID")]
    pub request_id: String,
    pub signed_message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentOutcome {
    #[serde(rename = "quoteID")]
    pub quote_id: String,
    #[serde(rename = "chainID", default)]
    pub chain_id: Option<u64>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteIntentResponse {
    #[serde(default)]
    pub successes: Vec<IntentOutcome>,
    #[serde(default)]
    pub failures: Vec<IntentOutcome>,
}

/// `POST getIntents` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetIntentsRequest {
    #[serde(rename = "quoteIDs")]
    pub quote_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentRecord {
    #[serde(rename = "quoteID")]
    pub quote_id: String,
    #[serde(rename = "chainID")]
    pub chain_id: u64,
    #[serde(default)]
    pub transaction_hash: Option<B256>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetIntentsResponse {
    #[serde(default)]
    pub intents: Vec<IntentRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balances_response_parsing() {
        let json = r#"{
            "base": [{"token": "USDC", "amount": "12.5"}],
            "optimism": [{"token": "USDT", "amount": 3}, {"token": "USDC", "amount": "0.01"}]
        }"#;
        let parsed: BalancesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.0.len(), 2);
        assert_eq!(parsed.0["optimism"].len(), 2);
        assert_eq!(parsed.0["base"][0].amount, Decimal::new(125, 1));
    }

    #[test]
    fn test_transfers_response_parsing() {
        let json = r#"{
            "optimized": [
                {"chainID": 8453, "tokenSymbol": "USDC", "amount": "5", "hasPermit": true, "permit3Allowance": "100"},
                {"chainID": 10, "tokenSymbol": "USDT", "amount": "7"}
            ]
        }"#;
        let parsed: TransfersResponse = serde_json::from_str(json).unwrap();
        let suggestions: Vec<_> = parsed.suggestions().collect();
        assert_eq!(suggestions.len(), 2);
        assert!(suggestions[0].has_permit);
        assert!(!suggestions[1].has_permit);
        assert_eq!(suggestions[1].permit3_allowance, None);
    }

    #[test]
    fn test_send_response_parsing() {
        let json = r#"{
            "signatureData": {"domain": {"name": "Permit3"}, "message": {"nonce": "1"}},
            "requestID": "req-42"
        }"#;
        let parsed: SendResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.request_id, "req-42");
        assert_eq!(parsed.signature_data.primary_type, None);
    }
}
