//! Payment parameter validation.
//!
//! Every validator is total: malformed input yields `None` (or a default),
//! never an error. Recipient, amount and network fail closed to `None`;
//! the token fails open to the configured default symbol.

use std::str::FromStr;

use alloy::primitives::Address;
use async_trait::async_trait;
use rust_decimal::Decimal;
use stablepay_sdk::client::{ClientError, NameResolverClient};
use stablepay_sdk::objects::{Chain, PaymentParams, Stablecoin, ValidatedPaymentParams};
use tracing::{debug, warn};

use crate::config::CheckoutConfig;

/// Value used when no redirect is supplied.
pub const NO_REDIRECT: &str = "";

/// Resolves human-readable names (`vitalik.eth`, `name.base.eth`) to addresses.
#[async_trait]
pub trait NameResolver: Send + Sync {
    /// `Ok(None)` when the name has no address record.
    async fn resolve_name(&self, name: &str) -> Result<Option<Address>, ClientError>;
}

#[async_trait]
impl NameResolver for NameResolverClient {
    async fn resolve_name(&self, name: &str) -> Result<Option<Address>, ClientError> {
        self.resolve(name).await
    }
}

fn is_hex_address(input: &str) -> bool {
    input.len() == 42
        && input.starts_with("0x")
        && input[2..].bytes().all(|b| b.is_ascii_hexdigit())
}

fn looks_like_name(input: &str) -> bool {
    let mut labels = input.split('.');
    input.contains('.')
        && !input.chars().any(char::is_whitespace)
        && labels.all(|label| !label.is_empty())
}

/// Accept a `0x`-prefixed 40-hex-digit address, or a name that resolves to one.
pub async fn validate_recipient<R>(input: Option<&str>, resolver: &R) -> Option<Address>
where
    R: NameResolver + ?Sized,
{
    let input = input?.trim();
    if is_hex_address(input) {
        return Address::from_str(input).ok();
    }
    if !looks_like_name(input) {
        return None;
    }
    match resolver.resolve_name(input).await {
        Ok(Some(address)) => {
            debug!(name = input, %address, "Resolved recipient name");
            Some(address)
        }
        Ok(None) => {
            debug!(name = input, "Recipient name has no address");
            None
        }
        Err(e) => {
            warn!(name = input, error = %e, "Failed to resolve recipient name");
            None
        }
    }
}

/// A strictly positive decimal amount, in plain or exponent notation.
pub fn validate_amount(input: Option<&str>) -> Option<Decimal> {
    let input = input?.trim();
    let amount = Decimal::from_str(input)
        .or_else(|_| Decimal::from_scientific(input))
        .ok()?;
    (amount > Decimal::ZERO).then_some(amount)
}

/// A numeric chain id belonging to the supported set.
pub fn validate_network(input: Option<&str>, supported: &[Chain]) -> Option<Chain> {
    let id: u64 = input?.trim().parse().ok()?;
    Chain::from_id(id).filter(|chain| supported.contains(chain))
}

/// The requested symbol if supported, otherwise `default`.
pub fn validate_token(input: Option<&str>, supported: &[Stablecoin], default: Stablecoin) -> Stablecoin {
    input
        .and_then(Stablecoin::from_symbol)
        .filter(|token| supported.contains(token))
        .unwrap_or(default)
}

pub fn validate_redirect(input: Option<&str>) -> String {
    input.map(str::to_owned).unwrap_or_else(|| NO_REDIRECT.to_owned())
}

pub fn validate_show_fees(input: Option<bool>) -> bool {
    input.unwrap_or(false)
}

/// Validate every field of `params` against `config`.
pub async fn validate_payment_params<R>(
    params: &PaymentParams,
    resolver: &R,
    config: &CheckoutConfig,
) -> ValidatedPaymentParams
where
    R: NameResolver + ?Sized,
{
    let validated = ValidatedPaymentParams {
        recipient: validate_recipient(params.recipient.as_deref(), resolver).await,
        amount_due: validate_amount(params.amount_due.as_deref()),
        desired_network_id: validate_network(
            params.desired_network_id.as_deref(),
            &config.supported_chains,
        ),
        desired_token: Some(validate_token(
            params.desired_token.as_deref(),
            &config.supported_tokens,
            config.default_token,
        )),
        redirect: validate_redirect(params.redirect.as_deref()),
        show_fees: validate_show_fees(params.show_fees),
    };
    debug!(
        recipient = ?validated.recipient,
        amount_due = ?validated.amount_due,
        network = ?validated.desired_network_id,
        token = ?validated.desired_token,
        all_valid = validated.all_valid(),
        "Validated payment params"
    );
    validated
}
