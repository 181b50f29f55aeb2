//! Follow-ups run after a typed-data signature.

use alloy::primitives::{B256, Bytes};
use async_trait::async_trait;
use stablepay_sdk::client::{ClientError, RelayClient};
use stablepay_sdk::objects::Chain;
use stablepay_sdk::objects::relay::{
    ExecuteIntentRequest, ExecuteIntentResponse, GetIntentsRequest, GetIntentsResponse,
};
use thiserror::Error;
use tracing::{info, warn};

use super::action::FollowUp;

#[derive(Debug, Error)]
pub enum FollowUpError {
    #[error("relay request failed: {0}")]
    Relay(#[from] ClientError),
    #[error("intent execution failed: {0}")]
    Failed(String),
}

/// Transactions produced by a follow-up, in the order the relay reported them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FollowUpOutcome {
    pub transactions: Vec<(Chain, B256)>,
}

#[async_trait]
pub trait FollowUpHandler: Send + Sync {
    async fn handle(
        &self,
        follow_up: &FollowUp,
        signature: &Bytes,
    ) -> Result<FollowUpOutcome, FollowUpError>;
}

/// The part of the relaying service that executes signed intents.
#[async_trait]
pub trait IntentRelay: Send + Sync {
    async fn execute_intent(
        &self,
        request: &ExecuteIntentRequest,
    ) -> Result<ExecuteIntentResponse, ClientError>;

    async fn get_intents(
        &self,
        request: &GetIntentsRequest,
    ) -> Result<GetIntentsResponse, ClientError>;
}

#[async_trait]
impl IntentRelay for RelayClient {
    async fn execute_intent(
        &self,
        request: &ExecuteIntentRequest,
    ) -> Result<ExecuteIntentResponse, ClientError> {
        RelayClient::execute_intent(self, request).await
    }

    async fn get_intents(
        &self,
        request: &GetIntentsRequest,
    ) -> Result<GetIntentsResponse, ClientError> {
        RelayClient::get_intents(self, request).await
    }
}

/// Submits permit signatures through the relaying service and resolves the
/// resulting transaction hashes.
pub struct RelayIntentExecutor<R> {
    relay: R,
}

impl<R: IntentRelay> RelayIntentExecutor<R> {
    pub fn new(relay: R) -> Self {
        Self { relay }
    }
}

#[async_trait]
impl<R: IntentRelay> FollowUpHandler for RelayIntentExecutor<R> {
    async fn handle(
        &self,
        follow_up: &FollowUp,
        signature: &Bytes,
    ) -> Result<FollowUpOutcome, FollowUpError> {
        let FollowUp::ExecuteIntent { request_id } = follow_up;
        let response = self
            .relay
            .execute_intent(&ExecuteIntentRequest {
                request_id: request_id.clone(),
                signed_message: signature.to_string(),
            })
            .await?;

        if !response.failures.is_empty() {
            let reasons = response
                .failures
                .iter()
                .map(|f| {
                    format!(
                        "{}: {}",
                        f.quote_id,
                        f.error.as_deref().unwrap_or("unknown error")
                    )
                })
                .collect::<Vec<_>>()
                .join("; ");
            warn!(%request_id, %reasons, "Relay reported intent failures");
            return Err(FollowUpError::Failed(reasons));
        }

        let quote_ids: Vec<String> = response
            .successes
            .into_iter()
            .map(|s| s.quote_id)
            .collect();
        if quote_ids.is_empty() {
            return Ok(FollowUpOutcome::default());
        }

        let intents = self
            .relay
            .get_intents(&GetIntentsRequest { quote_ids })
            .await?;
        let transactions: Vec<(Chain, B256)> = intents
            .intents
            .iter()
            .filter_map(|record| Some((Chain::from_id(record.chain_id)?, record.transaction_hash?)))
            .collect();
        info!(%request_id, transactions = transactions.len(), "Executed intent");
        Ok(FollowUpOutcome { transactions })
    }
}
