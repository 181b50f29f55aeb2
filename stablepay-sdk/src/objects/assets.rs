use alloy::primitives::Address;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::chains::Chain;
use super::tokens::Stablecoin;

/// A payer balance of one stablecoin variant on one chain.
///
/// Amounts are in display units (`1.5` USDC, not `1500000`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAsset {
    pub asset: Stablecoin,
    pub chain: Chain,
    pub amount: Decimal,
    /// Part of `amount` usable once the estimated fee is set aside.
    pub spendable_amount: Decimal,
    pub estimated_fee: Decimal,
    pub token_contract_address: Address,
    pub decimals: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_permit: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permit3_allowance: Option<Decimal>,
}

/// Identity of a balance within one payer snapshot.
pub type AssetKey = (Stablecoin, Chain);

impl UserAsset {
    pub fn key(&self) -> AssetKey {
        (self.asset, self.chain)
    }
}
