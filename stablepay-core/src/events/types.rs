//! Executor event types.
//!
//! Events are snapshots: they carry the new state of whatever changed so a
//! subscriber never has to read back from the executor.

use alloy::primitives::B256;
use serde::Serialize;

use crate::executor::{ActionStatus, HookStatus};

/// Emitted by [`crate::executor::ConsecutiveActions`] on every transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum ExecutorEvent {
    /// The queue as a whole changed state.
    StatusChanged { status: HookStatus },
    /// One action changed state.
    #[serde(rename_all = "camelCase")]
    ActionChanged {
        index: usize,
        status: ActionStatus,
        hash: Option<B256>,
        tx_link: Option<String>,
    },
}
