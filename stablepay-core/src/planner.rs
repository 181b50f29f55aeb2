//! Expands transaction steps, or a permit payload, into executor actions.

use alloy::primitives::{Address, U256};
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use stablepay_sdk::client::{ClientError, RelayClient};
use stablepay_sdk::objects::relay::{SendRequest, SendResponse, TransferLeg};
use stablepay_sdk::objects::{RequiredPaymentParams, UserAsset};
use thiserror::Error;
use tracing::info;

use crate::contracts::{IERC20, IIntentSource};
use crate::executor::{ActionItem, ActionKind, ActionMetadata, ContractCall, FollowUp};
use crate::selection::deductions;
use crate::steps::{StepKind, TransactionStep};

/// Produces permit payloads for gasless payments.
#[async_trait]
pub trait PermitSource: Send + Sync {
    async fn request_permit(&self, request: &SendRequest) -> Result<SendResponse, ClientError>;
}

#[async_trait]
impl PermitSource for RelayClient {
    async fn request_permit(&self, request: &SendRequest) -> Result<SendResponse, ClientError> {
        self.send(request).await
    }
}

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("failed to request permit: {0}")]
    Permit(#[from] ClientError),
    #[error("nothing selected")]
    EmptySelection,
}

fn erc20_call(token: Address, data: Vec<u8>) -> ContractCall {
    ContractCall {
        to: token,
        data: data.into(),
        value: U256::ZERO,
    }
}

fn step_action(index: usize, step: &TransactionStep) -> ActionItem {
    let symbol = step
        .assets
        .first()
        .map(|a| a.asset.symbol())
        .unwrap_or_default();
    let (call, label) = match &step.kind {
        StepKind::Transfer { token, to, amount } => (
            erc20_call(
                *token,
                IERC20::transferCall {
                    to: *to,
                    amount: *amount,
                }
                .abi_encode(),
            ),
            format!("Transfer {symbol} on {}", step.chain),
        ),
        StepKind::Approve {
            token,
            allowance_amount,
            intent_source_contract,
        } => (
            erc20_call(
                *token,
                IERC20::approveCall {
                    spender: *intent_source_contract,
                    amount: *allowance_amount,
                }
                .abi_encode(),
            ),
            format!("Approve {symbol} on {}", step.chain),
        ),
        StepKind::Intent {
            intent,
            intent_source_contract,
        } => {
            let data = IIntentSource::publishAndFundCall {
                intent: (&intent.intent).into(),
                allowPartial: false,
            }
            .abi_encode();
            (
                ContractCall {
                    to: *intent_source_contract,
                    data: data.into(),
                    value: intent.intent.reward.native_value,
                },
                format!("Send from {}", step.chain),
            )
        }
    };
    ActionItem::new(
        ActionKind::WriteContract(call),
        step.chain,
        ActionMetadata {
            label,
            step_index: Some(index),
        },
    )
}

/// One `writeContract` action per step, in step order.
pub fn plan_actions(steps: &[TransactionStep]) -> Vec<ActionItem> {
    steps
        .iter()
        .enumerate()
        .map(|(index, step)| step_action(index, step))
        .collect()
}

/// Whether every selected balance can be spent with a permit signature.
pub fn supports_permit(selection: &[UserAsset]) -> bool {
    !selection.is_empty() && selection.iter().all(|a| a.has_permit == Some(true))
}

/// Ask the relaying service for a permit covering the whole selection and
/// wrap it in a single signature action.
///
/// The signature is requested on the chain of the first selected balance.
pub async fn plan_permit<P>(
    source: &P,
    selection: &[UserAsset],
    sender: Address,
    params: &RequiredPaymentParams,
) -> Result<Vec<ActionItem>, PlanError>
where
    P: PermitSource + ?Sized,
{
    let first = selection.first().ok_or(PlanError::EmptySelection)?;
    let transfers = deductions(selection, params.amount_due)
        .into_iter()
        .map(|(token, amount)| TransferLeg {
            chain_id: token.chain.id(),
            token_symbol: token.asset.symbol().to_string(),
            amount,
        })
        .collect();
    let request = SendRequest {
        sender,
        recipient: params.recipient,
        destination_network: params.destination.id(),
        destination_token: params.token.symbol().to_string(),
        transfers,
    };
    let response = source.request_permit(&request).await?;
    info!(%sender, request_id = %response.request_id, "Received permit payload");

    Ok(vec![ActionItem::new(
        ActionKind::SignTypedData {
            payload: response.signature_data,
            follow_up: Some(FollowUp::ExecuteIntent {
                request_id: response.request_id,
            }),
        },
        first.chain,
        ActionMetadata {
            label: "Sign payment permit".to_string(),
            step_index: None,
        },
    )])
}
