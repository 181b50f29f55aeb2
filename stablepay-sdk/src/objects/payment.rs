//! Payment parameter types.
//!
//! [`PaymentParams`] is the raw, untrusted shape coming from a checkout URL
//! query string or a persisted short link. [`ValidatedPaymentParams`] is the
//! typed result of running it through the validator in `stablepay-core`.

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

use super::chains::Chain;
use super::tokens::Stablecoin;

/// Raw payment parameters as supplied by the payer's URL or a short link.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_due: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desired_network_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desired_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_fees: Option<bool>,
}

/// Payment parameters after validation.
///
/// A field is `Some` only if it passed its validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatedPaymentParams {
    pub recipient: Option<Address>,
    pub amount_due: Option<rust_decimal::Decimal>,
    pub desired_network_id: Option<Chain>,
    pub desired_token: Option<Stablecoin>,
    pub redirect: String,
    pub show_fees: bool,
}

impl ValidatedPaymentParams {
    /// Every required field (recipient, amount, network, token) is present.
    pub fn all_valid(&self) -> bool {
        self.recipient.is_some()
            && self.amount_due.is_some()
            && self.desired_network_id.is_some()
            && self.desired_token.is_some()
    }

    /// The required fields, if all of them passed validation.
    pub fn required(&self) -> Option<RequiredPaymentParams> {
        Some(RequiredPaymentParams {
            recipient: self.recipient?,
            amount_due: self.amount_due?,
            destination: self.desired_network_id?,
            token: self.desired_token?,
        })
    }
}

/// The subset of validated params the selection and build stages depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequiredPaymentParams {
    pub recipient: Address,
    pub amount_due: rust_decimal::Decimal,
    pub destination: Chain,
    pub token: Stablecoin,
}

/// Response body for the parameter validation endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub params: ValidatedPaymentParams,
    pub all_valid: bool,
}

/// Response body after persisting a payment link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentLinkCreated {
    pub id: String,
}
