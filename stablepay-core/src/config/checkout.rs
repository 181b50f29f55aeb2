//! Checkout policy: which chains and tokens are accepted and what the
//! protocol charges.

use alloy::primitives::{Address, address};
use rust_decimal::Decimal;
use stablepay_sdk::objects::{Chain, Stablecoin};

/// Checkout policy shared by every payment session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutConfig {
    /// Chains balances may be spent from and settled on.
    pub supported_chains: Vec<Chain>,
    /// Stablecoins balances may be spent in and settled in.
    pub supported_tokens: Vec<Stablecoin>,
    /// Token used when the requested one is not supported.
    pub default_token: Stablecoin,
    /// Smallest fee the protocol charges for a cross-chain leg between L2s.
    pub min_protocol_fee: Decimal,
    /// Smallest fee for a leg touching the mainnet.
    pub min_mainnet_protocol_fee: Decimal,
    /// Balances below `dust_multiplier * min_protocol_fee` are ignored.
    pub dust_multiplier: Decimal,
    /// Contract that escrows intent rewards on every source chain.
    pub intent_source: Address,
    /// Contract that fulfills intents on the destination chain.
    pub inbox: Address,
    /// Prover attesting fulfillment back to the source chain.
    pub prover: Address,
    /// Lifetime of a published intent before its reward can be refunded.
    pub intent_deadline_secs: u64,
}

impl CheckoutConfig {
    /// Balances below this amount cannot cover the protocol deduction.
    pub fn dust_threshold(&self) -> Decimal {
        self.dust_multiplier * self.min_protocol_fee
    }

    /// Estimated protocol fee for moving a balance from `source` to `destination`.
    pub fn estimated_fee(&self, source: Chain, destination: Chain) -> Decimal {
        if source == destination {
            Decimal::ZERO
        } else if source.is_mainnet() || destination.is_mainnet() {
            self.min_mainnet_protocol_fee
        } else {
            self.min_protocol_fee
        }
    }

    pub fn supports_chain(&self, chain: Chain) -> bool {
        self.supported_chains.contains(&chain)
    }

    pub fn supports_token(&self, token: Stablecoin) -> bool {
        self.supported_tokens.contains(&token)
    }
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            supported_chains: Chain::ALL.to_vec(),
            supported_tokens: Stablecoin::ALL.to_vec(),
            default_token: Stablecoin::DEFAULT,
            min_protocol_fee: Decimal::new(1, 2),
            min_mainnet_protocol_fee: Decimal::new(150, 2),
            dust_multiplier: Decimal::TWO,
            intent_source: address!("2020ae689ed3e017450280cea110d0ef6e640da4"),
            inbox: address!("04c816032a076df65b411bb3f31c8d569d411ee2"),
            prover: address!("3e4a157079bc846e9d2c71f297d529e0fcb4d44d"),
            intent_deadline_secs: 2 * 60 * 60,
        }
    }
}
