//! Consecutive action executor.
//!
//! Runs a queue of wallet operations strictly one at a time. Each action may
//! need a chain switch first; the switch completes before the action is
//! dispatched. A failing action stops the queue in [`HookStatus::Error`]
//! until [`ConsecutiveActions::retry`] is called. Nothing is retried
//! automatically.
//!
//! ```text
//! Paused --start--> Running --all done--> Finished
//!   ^                 |  |
//!   +------pause------+  +--action failed--> Error --retry--> Running
//! ```

mod action;
mod follow_up;
mod wallet;

pub use action::{
    ActionItem, ActionKind, ActionMetadata, ActionStatus, ContractCall, FollowUp, HookStatus,
};
pub use follow_up::{
    FollowUpError, FollowUpHandler, FollowUpOutcome, IntentRelay, RelayIntentExecutor,
};
pub use wallet::{TxReceipt, Wallet, WalletError};

use std::sync::Arc;

use alloy::primitives::B256;
use stablepay_sdk::objects::Chain;
use thiserror::Error;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::events::{ExecutorEvent, ExecutorEventSender};

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("failed to switch chain: {0}")]
    ChainSwitch(WalletError),
    #[error("signature failed: {0}")]
    Signature(WalletError),
    #[error("simulation failed: {0}")]
    Simulation(WalletError),
    #[error("submission failed: {0}")]
    Submission(WalletError),
    #[error("failed to get receipt: {0}")]
    Receipt(WalletError),
    #[error("transaction {0} reverted")]
    Reverted(B256),
    #[error("follow-up failed: {0}")]
    FollowUp(#[from] FollowUpError),
}

/// Lets another task pause a running queue.
///
/// The executor checks the flag between actions; an in-flight action always
/// runs to completion.
#[derive(Clone)]
pub struct PauseHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl PauseHandle {
    pub fn pause(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_paused(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Executes a queue of [`ActionItem`]s against a [`Wallet`].
pub struct ConsecutiveActions<W, F> {
    wallet: W,
    follow_ups: F,
    items: Vec<ActionItem>,
    current: usize,
    status: HookStatus,
    events: Option<ExecutorEventSender>,
    pause: Arc<watch::Sender<bool>>,
}

impl<W, F> ConsecutiveActions<W, F>
where
    W: Wallet,
    F: FollowUpHandler,
{
    /// A paused executor positioned at the first item.
    pub fn new(wallet: W, follow_ups: F, items: Vec<ActionItem>) -> Self {
        let (pause, _) = watch::channel(false);
        Self {
            wallet,
            follow_ups,
            items,
            current: 0,
            status: HookStatus::Paused,
            events: None,
            pause: Arc::new(pause),
        }
    }

    pub fn with_events(mut self, events: ExecutorEventSender) -> Self {
        self.events = Some(events);
        self
    }

    pub fn pause_handle(&self) -> PauseHandle {
        PauseHandle {
            tx: Arc::clone(&self.pause),
        }
    }

    pub fn items(&self) -> &[ActionItem] {
        &self.items
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn status(&self) -> HookStatus {
        self.status
    }

    pub fn wallet(&self) -> &W {
        &self.wallet
    }

    /// Paused or errored -> running. Returns whether the state changed.
    ///
    /// Starting from `Error` behaves like [`retry`](Self::retry).
    pub fn start(&mut self) -> bool {
        match self.status {
            HookStatus::Paused => {
                self.pause.send_replace(false);
                self.set_status(HookStatus::Running);
                true
            }
            HookStatus::Error => self.retry(),
            HookStatus::Running | HookStatus::Finished => false,
        }
    }

    /// Re-enter `Running` at the failed action.
    ///
    /// The failed action is reset to `ToSend` and starts a new attempt;
    /// earlier successful actions are not replayed.
    pub fn retry(&mut self) -> bool {
        if self.status != HookStatus::Error {
            return false;
        }
        let index = self.current;
        if let Some(item) = self.items.get_mut(index) {
            item.status = ActionStatus::ToSend;
            item.error = None;
            item.hash = None;
            item.tx_link = None;
        }
        self.emit_action(index);
        self.pause.send_replace(false);
        self.set_status(HookStatus::Running);
        true
    }

    /// Running -> paused, keeping every action's status.
    pub fn pause(&mut self) {
        if self.status == HookStatus::Running {
            self.set_status(HookStatus::Paused);
        }
    }

    /// Process actions until the queue finishes, fails or is paused.
    pub async fn run(&mut self) -> HookStatus {
        while self.status == HookStatus::Running {
            if *self.pause.borrow() {
                info!(index = self.current, "Executor paused");
                self.set_status(HookStatus::Paused);
                break;
            }
            let Some(item) = self.items.get(self.current) else {
                info!(actions = self.items.len(), "All actions finished");
                self.set_status(HookStatus::Finished);
                break;
            };
            if item.status == ActionStatus::Success {
                self.current += 1;
                continue;
            }

            let index = self.current;
            match self.execute(index).await {
                Ok(()) => {
                    self.update_item(index, |item| item.status = ActionStatus::Success);
                    self.current += 1;
                }
                Err(e) => {
                    warn!(index, error = %e, "Action failed");
                    let message = e.to_string();
                    self.update_item(index, |item| {
                        item.status = ActionStatus::Error;
                        item.error = Some(message);
                    });
                    self.set_status(HookStatus::Error);
                }
            }
        }
        self.status
    }

    async fn execute(&mut self, index: usize) -> Result<(), ExecutionError> {
        let Some(item) = self.items.get(index) else {
            return Ok(());
        };
        let chain = item.chain;
        let kind = item.kind.clone();
        debug!(index, %chain, action = kind.name(), "Dispatching action");

        let current_chain = self
            .wallet
            .chain_id()
            .await
            .map_err(ExecutionError::ChainSwitch)?;
        if current_chain != chain.id() {
            debug!(from = current_chain, to = chain.id(), "Switching chain");
            self.wallet
                .switch_chain(chain)
                .await
                .map_err(ExecutionError::ChainSwitch)?;
        }

        self.update_item(index, |item| {
            item.status = ActionStatus::Pending;
            item.attempts += 1;
        });

        match &kind {
            ActionKind::SignTypedData { payload, follow_up } => {
                let signature = self
                    .wallet
                    .sign_typed_data(payload)
                    .await
                    .map_err(ExecutionError::Signature)?;
                if let Some(follow_up) = follow_up {
                    let outcome = self.follow_ups.handle(follow_up, &signature).await?;
                    if let Some((tx_chain, hash)) = outcome.transactions.first().copied() {
                        self.update_item(index, |item| {
                            item.hash = Some(hash);
                            item.tx_link = Some(tx_chain.tx_link(hash));
                        });
                    }
                }
                Ok(())
            }
            ActionKind::WriteContract(call) => {
                self.wallet
                    .simulate_contract(call)
                    .await
                    .map_err(ExecutionError::Simulation)?;
                let hash = self
                    .wallet
                    .write_contract(call)
                    .await
                    .map_err(ExecutionError::Submission)?;
                self.confirm(index, chain, hash).await
            }
            ActionKind::SendTransaction(call) => {
                let hash = self
                    .wallet
                    .send_transaction(call)
                    .await
                    .map_err(ExecutionError::Submission)?;
                self.confirm(index, chain, hash).await
            }
            ActionKind::CallContract(call) => {
                let hash = self
                    .wallet
                    .call_contract(call)
                    .await
                    .map_err(ExecutionError::Submission)?;
                self.confirm(index, chain, hash).await
            }
        }
    }

    /// Record the submitted hash and wait for a successful receipt.
    async fn confirm(
        &mut self,
        index: usize,
        chain: Chain,
        hash: B256,
    ) -> Result<(), ExecutionError> {
        self.update_item(index, |item| {
            item.hash = Some(hash);
            item.tx_link = Some(chain.tx_link(hash));
        });
        let receipt = self
            .wallet
            .wait_for_receipt(hash)
            .await
            .map_err(ExecutionError::Receipt)?;
        if !receipt.success {
            return Err(ExecutionError::Reverted(hash));
        }
        info!(index, %chain, %hash, "Transaction confirmed");
        Ok(())
    }

    fn update_item(&mut self, index: usize, f: impl FnOnce(&mut ActionItem)) {
        if let Some(item) = self.items.get_mut(index) {
            f(item);
            self.emit_action(index);
        }
    }

    fn set_status(&mut self, status: HookStatus) {
        if self.status != status {
            debug!(from = ?self.status, to = ?status, "Executor status changed");
            self.status = status;
            self.emit(ExecutorEvent::StatusChanged { status });
        }
    }

    fn emit_action(&self, index: usize) {
        if let Some(item) = self.items.get(index) {
            self.emit(ExecutorEvent::ActionChanged {
                index,
                status: item.status,
                hash: item.hash,
                tx_link: item.tx_link.clone(),
            });
        }
    }

    fn emit(&self, event: ExecutorEvent) {
        let Some(events) = &self.events else {
            return;
        };
        match events.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                warn!(event = ?event, "Executor event channel full, dropping event");
            }
            Err(TrySendError::Closed(_)) => {}
        }
    }
}
