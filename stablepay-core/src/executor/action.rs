//! Queue items of the executor.

use alloy::primitives::{Address, B256, Bytes, U256};
use serde::{Deserialize, Serialize};
use stablepay_sdk::objects::Chain;
use stablepay_sdk::objects::relay::SignatureData;

/// State of the queue as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HookStatus {
    Paused,
    Running,
    Error,
    Finished,
}

/// State of one action. Only moves forward within an attempt:
/// `ToSend -> Pending -> Success | Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionStatus {
    ToSend,
    Pending,
    Success,
    Error,
}

/// A contract call or plain transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractCall {
    pub to: Address,
    pub data: Bytes,
    pub value: U256,
}

/// Work that must complete after a signature before the queue advances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FollowUp {
    /// Submit the signature to the relaying service for request `request_id`.
    #[serde(rename_all = "camelCase")]
    ExecuteIntent { request_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ActionKind {
    #[serde(rename_all = "camelCase")]
    SignTypedData {
        payload: SignatureData,
        follow_up: Option<FollowUp>,
    },
    WriteContract(ContractCall),
    SendTransaction(ContractCall),
    CallContract(ContractCall),
}

impl ActionKind {
    pub fn name(&self) -> &'static str {
        match self {
            ActionKind::SignTypedData { .. } => "signTypedData",
            ActionKind::WriteContract(_) => "writeContract",
            ActionKind::SendTransaction(_) => "sendTransaction",
            ActionKind::CallContract(_) => "callContract",
        }
    }
}

/// Display information carried alongside an action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionMetadata {
    pub label: String,
    /// Index of the transaction step this action was planned from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_index: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionItem {
    pub kind: ActionKind,
    pub chain: Chain,
    pub metadata: ActionMetadata,
    pub status: ActionStatus,
    pub hash: Option<B256>,
    pub tx_link: Option<String>,
    /// Last failure, cleared when the action is retried.
    pub error: Option<String>,
    /// Attempts started so far, including the current one.
    pub attempts: u32,
}

impl ActionItem {
    pub fn new(kind: ActionKind, chain: Chain, metadata: ActionMetadata) -> Self {
        Self {
            kind,
            chain,
            metadata,
            status: ActionStatus::ToSend,
            hash: None,
            tx_link: None,
            error: None,
            attempts: 0,
        }
    }
}
