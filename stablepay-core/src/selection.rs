//! Token selection: which balances pay the invoice and how much each one
//! carries.
//!
//! The optimized selection comes from the relaying service's transfer
//! suggestions, mapped back onto the payer's ranked balances and sorted by
//! ascending amount. Deductions fill the invoice from the smallest balance
//! up; whichever token is reached last absorbs what is left.

use std::collections::HashSet;

use alloy::primitives::Address;
use async_trait::async_trait;
use itertools::Itertools;
use rust_decimal::Decimal;
use stablepay_sdk::client::{ClientError, RelayClient};
use stablepay_sdk::objects::relay::{SuggestedTransfer, TransfersRequest, TransfersResponse};
use stablepay_sdk::objects::{AssetKey, Chain, RequiredPaymentParams, Stablecoin, UserAsset};
use thiserror::Error;
use tracing::{debug, info};

/// Suggests which balances to spend for a transfer.
#[async_trait]
pub trait TransferSuggester: Send + Sync {
    async fn suggest_transfers(
        &self,
        request: &TransfersRequest,
    ) -> Result<TransfersResponse, ClientError>;
}

#[async_trait]
impl TransferSuggester for RelayClient {
    async fn suggest_transfers(
        &self,
        request: &TransfersRequest,
    ) -> Result<TransfersResponse, ClientError> {
        self.get_transfers(request).await
    }
}

#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("failed to fetch transfer suggestions: {0}")]
    Suggestion(#[from] ClientError),
    #[error("selection total {total} does not cover {required}")]
    Insufficient { total: Decimal, required: Decimal },
}

/// Sort ascending by amount. Ties are broken by (token, chain) so the order
/// never depends on input order.
pub fn sort_ascending(selection: &mut [UserAsset]) {
    selection.sort_by(|a, b| a.amount.cmp(&b.amount).then_with(|| a.key().cmp(&b.key())));
}

fn matches_suggestion(asset: &UserAsset, suggestion: &SuggestedTransfer) -> bool {
    Chain::from_id(suggestion.chain_id) == Some(asset.chain)
        && Stablecoin::from_symbol(&suggestion.token_symbol) == Some(asset.asset)
}

/// Ask the relaying service for the cheapest way to cover the invoice and
/// map its suggestions onto `ranked`.
///
/// Suggestions that match no ranked balance are dropped.
pub async fn select_optimized<S>(
    suggester: &S,
    ranked: &[UserAsset],
    sender: Address,
    params: &RequiredPaymentParams,
) -> Result<Vec<UserAsset>, SelectionError>
where
    S: TransferSuggester + ?Sized,
{
    let request = TransfersRequest {
        sender,
        recipient: params.recipient,
        destination_network: params.destination.id(),
        destination_token: params.token.symbol().to_string(),
        transfer_amount: params.amount_due,
    };
    let response = suggester.suggest_transfers(&request).await?;

    let mut selection: Vec<UserAsset> = response
        .suggestions()
        .filter_map(|suggestion| {
            let found = ranked.iter().find(|a| matches_suggestion(a, suggestion));
            if found.is_none() {
                debug!(
                    chain_id = suggestion.chain_id,
                    token = %suggestion.token_symbol,
                    "Suggested transfer has no matching balance"
                );
            }
            found.map(|asset| UserAsset {
                has_permit: Some(suggestion.has_permit),
                permit3_allowance: suggestion.permit3_allowance,
                ..asset.clone()
            })
        })
        .unique_by(UserAsset::key)
        .collect();
    sort_ascending(&mut selection);

    info!(
        %sender,
        selected = selection.len(),
        total = %selected_total(&selection),
        amount_due = %params.amount_due,
        "Computed optimized selection"
    );
    Ok(selection)
}

/// Σ amount over the selection.
pub fn selected_total(selection: &[UserAsset]) -> Decimal {
    selection.iter().map(|a| a.amount).sum()
}

/// Σ spendable amount over the selection.
pub fn spendable_total(selection: &[UserAsset]) -> Decimal {
    selection.iter().map(|a| a.spendable_amount).sum()
}

/// How much of `amount_due` the token identified by `target` carries.
///
/// Walks the selection from the smallest amount up with a running
/// remainder. Tokens before the target consume their whole spendable
/// amount; the target takes its spendable amount or the remainder,
/// whichever is smaller. Never negative. Zero if `target` is not selected.
pub fn amount_deducted_for(target: AssetKey, selection: &[UserAsset], amount_due: Decimal) -> Decimal {
    let mut sorted = selection.to_vec();
    sort_ascending(&mut sorted);
    let mut remaining = amount_due;
    for token in &sorted {
        if token.key() == target {
            return token.spendable_amount.min(remaining.max(Decimal::ZERO));
        }
        remaining -= token.spendable_amount;
    }
    Decimal::ZERO
}

/// Deduction of every selected token, in ascending allocation order.
pub fn deductions(selection: &[UserAsset], amount_due: Decimal) -> Vec<(UserAsset, Decimal)> {
    let mut sorted = selection.to_vec();
    sort_ascending(&mut sorted);
    sorted
        .into_iter()
        .map(|token| {
            let deducted = amount_deducted_for(token.key(), selection, amount_due);
            (token, deducted)
        })
        .collect()
}

/// Whether two selections contain the same (token, chain) pairs.
pub fn is_optimized(optimized: &[UserAsset], manual: &[UserAsset]) -> bool {
    let left: HashSet<AssetKey> = optimized.iter().map(UserAsset::key).collect();
    let right: HashSet<AssetKey> = manual.iter().map(UserAsset::key).collect();
    left == right
}

/// A user-edited working copy of a selection.
#[derive(Debug, Clone)]
pub struct ManualSelection {
    tokens: Vec<UserAsset>,
    amount_due: Decimal,
}

impl ManualSelection {
    pub fn new(amount_due: Decimal) -> Self {
        Self {
            tokens: Vec::new(),
            amount_due,
        }
    }

    /// Start editing from an existing selection, usually the optimized one.
    pub fn from_selection(selection: &[UserAsset], amount_due: Decimal) -> Self {
        Self {
            tokens: selection.to_vec(),
            amount_due,
        }
    }

    pub fn tokens(&self) -> &[UserAsset] {
        &self.tokens
    }

    pub fn total(&self) -> Decimal {
        selected_total(&self.tokens)
    }

    pub fn contains(&self, key: AssetKey) -> bool {
        self.tokens.iter().any(|t| t.key() == key)
    }

    /// Remove `token` if selected, otherwise select it.
    ///
    /// Picking a new token while the working total already covers the
    /// invoice replaces the selection with that token alone.
    pub fn toggle(&mut self, token: &UserAsset) {
        let key = token.key();
        if self.contains(key) {
            self.tokens.retain(|t| t.key() != key);
        } else if self.total() >= self.amount_due {
            self.tokens = vec![token.clone()];
        } else {
            self.tokens.push(token.clone());
        }
    }

    pub fn clear(&mut self) {
        self.tokens.clear();
    }

    /// Confirmation needs the total to cover the invoice plus `known_fees`.
    pub fn can_confirm(&self, known_fees: Decimal) -> bool {
        !self.tokens.is_empty() && self.total() >= self.amount_due + known_fees
    }

    pub fn confirm(&self, known_fees: Decimal) -> Result<Vec<UserAsset>, SelectionError> {
        if !self.can_confirm(known_fees) {
            return Err(SelectionError::Insufficient {
                total: self.total(),
                required: self.amount_due + known_fees,
            });
        }
        Ok(self.tokens.clone())
    }
}
