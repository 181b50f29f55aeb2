//! Balance acquisition, filtering and ranking.
//!
//! Raw balances come from the relaying service keyed by chain name. They are
//! converted to [`UserAsset`]s, run through the filter pipeline and ordered
//! so that cheap moves come first:
//!
//! 1. balances on the destination chain,
//! 2. balances on other non-mainnet chains,
//! 3. mainnet balances.
//!
//! Each group is sorted by descending amount.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use alloy::primitives::Address;
use async_trait::async_trait;
use rust_decimal::Decimal;
use stablepay_sdk::client::{ClientError, RelayClient};
use stablepay_sdk::objects::relay::BalancesResponse;
use stablepay_sdk::objects::{AssetKey, Chain, RequiredPaymentParams, Stablecoin, UserAsset};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::CheckoutConfig;

/// Where payer balances come from.
#[async_trait]
pub trait BalanceSource: Send + Sync {
    async fn fetch_balances(&self, address: Address) -> Result<BalancesResponse, ClientError>;
}

#[async_trait]
impl BalanceSource for RelayClient {
    async fn fetch_balances(&self, address: Address) -> Result<BalancesResponse, ClientError> {
        self.balances(address).await
    }
}

#[derive(Debug, Error)]
pub enum BalanceError {
    #[error("failed to fetch balances: {0}")]
    Source(#[from] ClientError),
}

/// Convert a raw balances response into one [`UserAsset`] per (token, chain).
///
/// Unknown chain names, unknown symbols and tokens without a known deployment
/// on the chain are skipped. Duplicate entries are summed.
pub fn to_user_assets(
    response: &BalancesResponse,
    config: &CheckoutConfig,
    destination: Chain,
) -> Vec<UserAsset> {
    let mut merged: BTreeMap<AssetKey, UserAsset> = BTreeMap::new();
    for (chain_name, entries) in &response.0 {
        let Some(chain) = Chain::from_name(chain_name) else {
            debug!(chain = %chain_name, "Skipping balances on unknown chain");
            continue;
        };
        for entry in entries {
            let Some(asset) = Stablecoin::from_symbol(&entry.token) else {
                debug!(%chain, token = %entry.token, "Skipping unknown token");
                continue;
            };
            let Some(deployment) = asset.deployment(chain) else {
                debug!(%chain, %asset, "Skipping token without deployment");
                continue;
            };
            let estimated_fee = config.estimated_fee(chain, destination);
            merged
                .entry((asset, chain))
                .and_modify(|existing| {
                    existing.amount += entry.amount;
                    existing.spendable_amount =
                        spendable(existing.amount, existing.estimated_fee);
                })
                .or_insert_with(|| UserAsset {
                    asset,
                    chain,
                    amount: entry.amount,
                    spendable_amount: spendable(entry.amount, estimated_fee),
                    estimated_fee,
                    token_contract_address: deployment.address,
                    decimals: deployment.decimals,
                    has_permit: None,
                    permit3_allowance: None,
                });
        }
    }
    merged.into_values().collect()
}

/// `amount - fee`, never below zero.
pub fn spendable(amount: Decimal, fee: Decimal) -> Decimal {
    (amount - fee).max(Decimal::ZERO)
}

/// Apply the balance filter pipeline. Re-applying it to its output is a no-op.
pub fn filter_balances(
    assets: Vec<UserAsset>,
    config: &CheckoutConfig,
    params: &RequiredPaymentParams,
) -> Vec<UserAsset> {
    let dust = config.dust_threshold();
    assets
        .into_iter()
        .filter(|a| config.supports_token(a.asset))
        .filter(|a| config.supports_chain(a.chain))
        .filter(|a| a.amount >= dust)
        .filter(|a| a.chain != params.destination || a.asset == params.token)
        .filter(|a| {
            let crosses_mainnet = a.chain != params.destination
                && (a.chain.is_mainnet() || params.destination.is_mainnet());
            !crosses_mainnet || params.amount_due >= config.min_mainnet_protocol_fee
        })
        .collect()
}

fn rank_group(asset: &UserAsset, destination: Chain) -> u8 {
    if asset.chain == destination {
        0
    } else if !asset.chain.is_mainnet() {
        1
    } else {
        2
    }
}

/// Order balances by chain affinity, then by descending amount.
pub fn rank_balances(mut assets: Vec<UserAsset>, destination: Chain) -> Vec<UserAsset> {
    assets.sort_by_key(|a| (rank_group(a, destination), Reverse(a.amount)));
    assets
}

/// Fetch, convert, filter and rank the balances of `address`.
pub async fn fetch_balances<S>(
    source: &S,
    address: Address,
    config: &CheckoutConfig,
    params: &RequiredPaymentParams,
) -> Result<Vec<UserAsset>, BalanceError>
where
    S: BalanceSource + ?Sized,
{
    let response = source.fetch_balances(address).await?;
    let assets = to_user_assets(&response, config, params.destination);
    let fetched = assets.len();
    let ranked = rank_balances(filter_balances(assets, config, params), params.destination);
    info!(
        %address,
        fetched,
        usable = ranked.len(),
        destination = %params.destination,
        "Fetched payer balances"
    );
    Ok(ranked)
}

/// Balances of one payer with independent loading, fetched and error flags.
///
/// The flags distinguish "never fetched" from "fetching", "fetched empty"
/// and "failed".
#[derive(Debug, Clone, Default)]
pub struct BalanceStore {
    pub balances: Vec<UserAsset>,
    pub is_loading: bool,
    pub has_fetched: bool,
    pub has_error: bool,
}

impl BalanceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refetch balances. Previous balances are kept if the fetch fails.
    pub async fn refresh<S>(
        &mut self,
        source: &S,
        address: Address,
        config: &CheckoutConfig,
        params: &RequiredPaymentParams,
    ) -> Result<&[UserAsset], BalanceError>
    where
        S: BalanceSource + ?Sized,
    {
        self.is_loading = true;
        self.has_error = false;
        let result = fetch_balances(source, address, config, params).await;
        self.is_loading = false;
        self.has_fetched = true;
        match result {
            Ok(balances) => {
                self.balances = balances;
                Ok(&self.balances)
            }
            Err(e) => {
                warn!(%address, error = %e, "Balance fetch failed");
                self.has_error = true;
                Err(e)
            }
        }
    }
}
