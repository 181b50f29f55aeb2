//! On-chain reads over JSON-RPC.

use std::collections::HashMap;

use alloy::primitives::{Address, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use async_trait::async_trait;
use stablepay_sdk::objects::Chain;
use thiserror::Error;
use tracing::debug;

use crate::config::RpcEndpoint;
use crate::contracts::IERC20;

#[derive(Debug, Error)]
pub enum AllowanceError {
    #[error("no rpc endpoint configured for {0}")]
    NoEndpoint(Chain),
    #[error("allowance call failed: {0}")]
    Call(#[from] alloy::contract::Error),
}

/// Reads ERC-20 allowances.
#[async_trait]
pub trait AllowanceReader: Send + Sync {
    /// Amount `spender` may move out of `owner`'s balance of `token` on `chain`.
    async fn allowance(
        &self,
        chain: Chain,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, AllowanceError>;
}

/// [`AllowanceReader`] backed by one HTTP provider per configured chain.
#[derive(Clone)]
pub struct RpcAllowanceReader {
    providers: HashMap<Chain, DynProvider>,
}

impl RpcAllowanceReader {
    pub fn new(endpoints: &[RpcEndpoint]) -> Self {
        let providers = endpoints
            .iter()
            .map(|endpoint| {
                let provider = ProviderBuilder::new()
                    .connect_http(endpoint.url.clone())
                    .erased();
                (endpoint.chain, provider)
            })
            .collect();
        Self { providers }
    }

    fn provider(&self, chain: Chain) -> Option<&DynProvider> {
        self.providers.get(&chain)
    }
}

#[async_trait]
impl AllowanceReader for RpcAllowanceReader {
    async fn allowance(
        &self,
        chain: Chain,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, AllowanceError> {
        let provider = self
            .provider(chain)
            .ok_or(AllowanceError::NoEndpoint(chain))?;
        let allowance = IERC20::new(token, provider)
            .allowance(owner, spender)
            .call()
            .await?;
        debug!(%chain, %token, %owner, %spender, %allowance, "Read allowance");
        Ok(allowance)
    }
}
