//! The wallet provider the executor drives.

use alloy::primitives::{B256, Bytes};
use async_trait::async_trait;
use stablepay_sdk::objects::Chain;
use stablepay_sdk::objects::relay::SignatureData;
use thiserror::Error;

use super::action::ContractCall;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    #[error("rejected by user: {0}")]
    Rejected(String),
    #[error("provider error: {0}")]
    Provider(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxReceipt {
    pub hash: B256,
    pub success: bool,
}

/// A connected, user-interactive wallet.
///
/// Every method may wait on the user for an unbounded time.
#[async_trait]
pub trait Wallet: Send + Sync {
    /// Chain the wallet is currently connected to.
    async fn chain_id(&self) -> Result<u64, WalletError>;

    async fn switch_chain(&self, chain: Chain) -> Result<(), WalletError>;

    async fn sign_typed_data(&self, data: &SignatureData) -> Result<Bytes, WalletError>;

    /// Dry-run `call`; `Err` if it would revert.
    async fn simulate_contract(&self, call: &ContractCall) -> Result<(), WalletError>;

    async fn write_contract(&self, call: &ContractCall) -> Result<B256, WalletError>;

    async fn send_transaction(&self, call: &ContractCall) -> Result<B256, WalletError>;

    async fn call_contract(&self, call: &ContractCall) -> Result<B256, WalletError>;

    async fn wait_for_receipt(&self, hash: B256) -> Result<TxReceipt, WalletError>;
}
