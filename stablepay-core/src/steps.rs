//! Turns a token selection into ordered on-chain steps.
//!
//! Tokens are grouped by source chain in order of first appearance. The
//! destination-chain group becomes a single direct transfer. Every other
//! group becomes a cross-chain intent priced by the cheapest solver quote,
//! preceded by an `approve` for each token whose allowance to the intent
//! source contract does not cover its share of the reward.

use alloy::primitives::{Address, B256, Bytes, U256, keccak256};
use alloy::sol_types::{SolCall, SolValue};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use stablepay_sdk::client::{ClientError, QuoteClient};
use stablepay_sdk::objects::intent::{
    Intent, IntentWithQuote, Quote, Reward, Route, RouteCall, TokenAmount,
};
use stablepay_sdk::objects::{Chain, RequiredPaymentParams, UserAsset};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::CheckoutConfig;
use crate::contracts::IERC20;
use crate::onchain::{AllowanceError, AllowanceReader};
use crate::selection::amount_deducted_for;
use crate::utils::units::{UnitsError, to_base_units_rounded};

/// Prices intents.
#[async_trait]
pub trait IntentRouter: Send + Sync {
    async fn request_quotes(&self, intent: &Intent) -> Result<Vec<Quote>, ClientError>;
}

#[async_trait]
impl IntentRouter for QuoteClient {
    async fn request_quotes(&self, intent: &Intent) -> Result<Vec<Quote>, ClientError> {
        QuoteClient::request_quotes(self, intent).await
    }
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("quotes not available for {chain}, please try again")]
    QuotesNotAvailable { chain: Chain },
    #[error("{token} cannot be settled on {chain}")]
    InvalidChain { chain: Chain, token: String },
    #[error("{count} tokens selected on the destination chain, expected one")]
    AmbiguousTransfer { count: usize },
    #[error("nothing selected")]
    EmptySelection,
    #[error("failed to read allowance: {0}")]
    Allowance(#[from] AllowanceError),
    #[error("invalid amount: {0}")]
    Amount(#[from] UnitsError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StepStatus {
    ToSend,
    AwaitingConfirmation,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum StepKind {
    #[serde(rename_all = "camelCase")]
    Approve {
        token: Address,
        allowance_amount: U256,
        intent_source_contract: Address,
    },
    #[serde(rename_all = "camelCase")]
    Transfer {
        token: Address,
        to: Address,
        amount: U256,
    },
    #[serde(rename_all = "camelCase")]
    Intent {
        intent: IntentWithQuote,
        intent_source_contract: Address,
    },
}

/// One unit of on-chain work on `chain`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionStep {
    pub chain: Chain,
    pub assets: Vec<UserAsset>,
    #[serde(flatten)]
    pub kind: StepKind,
    pub status: StepStatus,
}

impl TransactionStep {
    fn new(chain: Chain, assets: Vec<UserAsset>, kind: StepKind) -> Self {
        Self {
            chain,
            assets,
            kind,
            status: StepStatus::ToSend,
        }
    }
}

/// The quote asking for the smallest total reward. Ties keep the first.
pub fn select_cheapest_quote(quotes: &[Quote]) -> Option<&Quote> {
    quotes.iter().min_by_key(|q| q.reward_total())
}

/// Replace the intent's reward tokens, and its route tokens if the quote
/// names any, with the quoted amounts.
pub fn apply_quote_to_intent(mut intent: Intent, quote: &Quote) -> IntentWithQuote {
    intent.reward.tokens = quote.reward_tokens.clone();
    if !quote.route_tokens.is_empty() {
        intent.route.tokens = quote.route_tokens.clone();
    }
    IntentWithQuote {
        intent,
        quote_id: quote.quote_id.clone(),
    }
}

/// Group by chain, keeping the order in which chains first appear.
pub fn group_by_chain(selection: &[UserAsset]) -> Vec<(Chain, Vec<UserAsset>)> {
    let mut groups: Vec<(Chain, Vec<UserAsset>)> = Vec::new();
    for token in selection {
        match groups.iter_mut().find(|(chain, _)| *chain == token.chain) {
            Some((_, tokens)) => tokens.push(token.clone()),
            None => groups.push((token.chain, vec![token.clone()])),
        }
    }
    groups
}

fn unix_now() -> u64 {
    u64::try_from(time::OffsetDateTime::now_utc().unix_timestamp()).unwrap_or_default()
}

/// Builds [`TransactionStep`]s for one payer.
pub struct StepBuilder<'a, Q: ?Sized, A: ?Sized> {
    router: &'a Q,
    allowances: &'a A,
    config: &'a CheckoutConfig,
}

impl<'a, Q, A> StepBuilder<'a, Q, A>
where
    Q: IntentRouter + ?Sized,
    A: AllowanceReader + ?Sized,
{
    pub fn new(router: &'a Q, allowances: &'a A, config: &'a CheckoutConfig) -> Self {
        Self {
            router,
            allowances,
            config,
        }
    }

    /// Build every step for `selection`, or nothing at all.
    pub async fn build_steps(
        &self,
        selection: &[UserAsset],
        sender: Address,
        params: &RequiredPaymentParams,
    ) -> Result<Vec<TransactionStep>, BuildError> {
        if selection.is_empty() {
            return Err(BuildError::EmptySelection);
        }
        let mut steps = Vec::new();
        for (chain, tokens) in group_by_chain(selection) {
            if chain == params.destination {
                steps.push(self.transfer_step(chain, tokens, selection, params)?);
            } else {
                steps.extend(
                    self.intent_steps(chain, tokens, selection, sender, params)
                        .await?,
                );
            }
        }
        info!(
            %sender,
            destination = %params.destination,
            steps = steps.len(),
            "Built transaction steps"
        );
        Ok(steps)
    }

    fn transfer_step(
        &self,
        chain: Chain,
        tokens: Vec<UserAsset>,
        selection: &[UserAsset],
        params: &RequiredPaymentParams,
    ) -> Result<TransactionStep, BuildError> {
        let [token] = tokens.as_slice() else {
            return Err(BuildError::AmbiguousTransfer {
                count: tokens.len(),
            });
        };
        let deducted = amount_deducted_for(token.key(), selection, params.amount_due);
        let amount = to_base_units_rounded(deducted, token.decimals)?;
        let kind = StepKind::Transfer {
            token: token.token_contract_address,
            to: params.recipient,
            amount,
        };
        Ok(TransactionStep::new(chain, tokens, kind))
    }

    async fn intent_steps(
        &self,
        chain: Chain,
        tokens: Vec<UserAsset>,
        selection: &[UserAsset],
        sender: Address,
        params: &RequiredPaymentParams,
    ) -> Result<Vec<TransactionStep>, BuildError> {
        let intent = self.draft_intent(chain, &tokens, selection, sender, params)?;
        let quotes = self.router.request_quotes(&intent).await.map_err(|e| {
            warn!(%chain, error = %e, "Quote request failed");
            BuildError::QuotesNotAvailable { chain }
        })?;
        let quote = select_cheapest_quote(&quotes).ok_or_else(|| {
            warn!(%chain, "No quotes offered");
            BuildError::QuotesNotAvailable { chain }
        })?;
        debug!(%chain, quote_id = %quote.quote_id, reward = %quote.reward_total(), "Selected quote");
        let intent = apply_quote_to_intent(intent, quote);

        let mut steps = Vec::with_capacity(tokens.len() + 1);
        for token in &tokens {
            let share = reward_share(&intent.intent.reward, token.token_contract_address);
            let allowance = self
                .allowances
                .allowance(
                    chain,
                    token.token_contract_address,
                    sender,
                    self.config.intent_source,
                )
                .await?;
            if allowance < share {
                debug!(%chain, asset = %token.asset, %allowance, %share, "Allowance too low");
                steps.push(TransactionStep::new(
                    chain,
                    vec![token.clone()],
                    StepKind::Approve {
                        token: token.token_contract_address,
                        allowance_amount: U256::MAX,
                        intent_source_contract: self.config.intent_source,
                    },
                ));
            }
        }
        steps.push(TransactionStep::new(
            chain,
            tokens,
            StepKind::Intent {
                intent,
                intent_source_contract: self.config.intent_source,
            },
        ));
        Ok(steps)
    }

    /// Intent moving the group's deductions to the recipient, before quoting.
    fn draft_intent(
        &self,
        chain: Chain,
        tokens: &[UserAsset],
        selection: &[UserAsset],
        sender: Address,
        params: &RequiredPaymentParams,
    ) -> Result<Intent, BuildError> {
        let destination_token = params
            .token
            .deployment(params.destination)
            .ok_or_else(|| BuildError::InvalidChain {
                chain: params.destination,
                token: params.token.to_string(),
            })?;

        let mut total = Decimal::ZERO;
        let mut reward_tokens = Vec::with_capacity(tokens.len());
        for token in tokens {
            let deducted = amount_deducted_for(token.key(), selection, params.amount_due);
            total += deducted;
            reward_tokens.push(TokenAmount {
                token: token.token_contract_address,
                amount: to_base_units_rounded(deducted, token.decimals)?,
            });
        }
        let route_amount = to_base_units_rounded(total, destination_token.decimals)?;

        let now = unix_now();
        let salt: B256 = keccak256(
            (sender, chain.id(), params.destination.id(), route_amount, now).abi_encode(),
        );
        let transfer = IERC20::transferCall {
            to: params.recipient,
            amount: route_amount,
        };

        Ok(Intent {
            route: Route {
                salt,
                source: chain.id(),
                destination: params.destination.id(),
                inbox: self.config.inbox,
                tokens: vec![TokenAmount {
                    token: destination_token.address,
                    amount: route_amount,
                }],
                calls: vec![RouteCall {
                    target: destination_token.address,
                    data: Bytes::from(transfer.abi_encode()),
                    value: U256::ZERO,
                }],
            },
            reward: Reward {
                creator: sender,
                prover: self.config.prover,
                deadline: now + self.config.intent_deadline_secs,
                native_value: U256::ZERO,
                tokens: reward_tokens,
            },
        })
    }
}

fn reward_share(reward: &Reward, token: Address) -> U256 {
    reward
        .tokens
        .iter()
        .filter(|t| t.token == token)
        .fold(U256::ZERO, |acc, t| acc.saturating_add(t.amount))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::balances::tests::{MERCHANT, PAYER, asset, params};
    use stablepay_sdk::objects::Stablecoin;
    use std::collections::HashMap;
    use std::sync::Mutex;

    pub(crate) struct FakeRouter {
        pub quotes: Option<Vec<Quote>>,
        /// Source chains whose quote requests fail even when `quotes` is set.
        pub failing_sources: Vec<Chain>,
        pub seen: Mutex<Vec<Intent>>,
    }

    impl FakeRouter {
        pub(crate) fn quoting(quotes: Vec<Quote>) -> Self {
            Self {
                quotes: Some(quotes),
                failing_sources: Vec::new(),
                seen: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn failing() -> Self {
            Self {
                quotes: None,
                failing_sources: Vec::new(),
                seen: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn failing_on(mut self, chain: Chain) -> Self {
            self.failing_sources.push(chain);
            self
        }
    }

    #[async_trait]
    impl IntentRouter for FakeRouter {
        async fn request_quotes(&self, intent: &Intent) -> Result<Vec<Quote>, ClientError> {
            self.seen.lock().unwrap().push(intent.clone());
            let source = Chain::from_id(intent.route.source);
            if source.is_some_and(|chain| self.failing_sources.contains(&chain)) {
                return Err(ClientError::Url(url::ParseError::EmptyHost));
            }
            self.quotes
                .clone()
                .ok_or(ClientError::Url(url::ParseError::EmptyHost))
        }
    }

    /// Unknown (chain, token) pairs have a zero allowance.
    #[derive(Default)]
    pub(crate) struct FakeAllowances(pub HashMap<(Chain, Address), U256>);

    #[async_trait]
    impl AllowanceReader for FakeAllowances {
        async fn allowance(
            &self,
            chain: Chain,
            token: Address,
            _owner: Address,
            _spender: Address,
        ) -> Result<U256, AllowanceError> {
            Ok(self.0.get(&(chain, token)).copied().unwrap_or_default())
        }
    }

    pub(crate) fn quote(id: &str, reward: Vec<(Address, u64)>) -> Quote {
        Quote {
            quote_id: id.to_string(),
            solver_id: None,
            reward_tokens: reward
                .into_iter()
                .map(|(token, amount)| TokenAmount {
                    token,
                    amount: U256::from(amount),
                })
                .collect(),
            route_tokens: vec![],
            expiry_time: 0,
            estimated_fulfill_time_sec: None,
        }
    }

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn example_selection() -> Vec<UserAsset> {
        vec![
            asset(Stablecoin::Usdc, Chain::Base, dec("5")),
            asset(Stablecoin::Usdc, Chain::Optimism, dec("10")),
        ]
    }

    fn op_usdc() -> Address {
        Stablecoin::Usdc.deployment(Chain::Optimism).unwrap().address
    }

    #[test]
    fn test_cheapest_quote() {
        let token = op_usdc();
        let quotes = vec![
            quote("a", vec![(token, 7_100_000)]),
            quote("b", vec![(token, 7_050_000)]),
            quote("c", vec![(token, 7_050_000)]),
        ];
        assert_eq!(select_cheapest_quote(&quotes).unwrap().quote_id, "b");
        assert!(select_cheapest_quote(&[]).is_none());
    }

    #[test]
    fn test_group_by_chain_keeps_first_appearance() {
        let selection = vec![
            asset(Stablecoin::Usdt, Chain::Optimism, dec("1")),
            asset(Stablecoin::Usdc, Chain::Base, dec("2")),
            asset(Stablecoin::Usdc, Chain::Optimism, dec("3")),
        ];
        let groups = group_by_chain(&selection);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, Chain::Optimism);
        assert_eq!(groups[0].1.len(), 2);
        assert_eq!(groups[1].0, Chain::Base);
    }

    #[tokio::test]
    async fn test_build_transfer_then_approve_and_intent() {
        let config = CheckoutConfig::default();
        let router = FakeRouter::quoting(vec![
            quote("pricey", vec![(op_usdc(), 7_200_000)]),
            quote("cheap", vec![(op_usdc(), 7_010_000)]),
        ]);
        let allowances = FakeAllowances::default();
        let builder = StepBuilder::new(&router, &allowances, &config);
        let steps = builder
            .build_steps(&example_selection(), PAYER, &params(dec("12"), Chain::Base))
            .await
            .unwrap();

        assert_eq!(steps.len(), 3);
        assert_eq!(steps[0].chain, Chain::Base);
        assert_eq!(
            steps[0].kind,
            StepKind::Transfer {
                token: Stablecoin::Usdc.deployment(Chain::Base).unwrap().address,
                to: MERCHANT,
                amount: U256::from(5_000_000u64),
            }
        );
        assert!(matches!(
            steps[1].kind,
            StepKind::Approve { allowance_amount, .. } if allowance_amount == U256::MAX
        ));
        let StepKind::Intent { intent, .. } = &steps[2].kind else {
            panic!("expected an intent step");
        };
        assert_eq!(intent.quote_id, "cheap");
        assert_eq!(intent.intent.route.source, 10);
        assert_eq!(intent.intent.route.destination, 8453);
        assert_eq!(intent.intent.route.tokens[0].amount, U256::from(7_000_000u64));
        assert_eq!(intent.intent.reward.creator, PAYER);
        assert!(steps.iter().all(|s| s.status == StepStatus::ToSend));

        let drafted = &router.seen.lock().unwrap()[0];
        assert_eq!(drafted.reward.tokens[0].amount, U256::from(7_000_000u64));
    }

    #[tokio::test]
    async fn test_sufficient_allowance_skips_approve() {
        let config = CheckoutConfig::default();
        let router = FakeRouter::quoting(vec![quote("q", vec![(op_usdc(), 7_010_000)])]);
        let allowances = FakeAllowances(HashMap::from([(
            (Chain::Optimism, op_usdc()),
            U256::from(7_010_000u64),
        )]));
        let steps = StepBuilder::new(&router, &allowances, &config)
            .build_steps(&example_selection(), PAYER, &params(dec("12"), Chain::Base))
            .await
            .unwrap();
        assert_eq!(steps.len(), 2);
        assert!(matches!(steps[1].kind, StepKind::Intent { .. }));
    }

    #[tokio::test]
    async fn test_quote_failure_returns_no_steps() {
        let config = CheckoutConfig::default();
        let allowances = FakeAllowances::default();
        let p = params(dec("12"), Chain::Base);

        let failing = FakeRouter::failing();
        let result = StepBuilder::new(&failing, &allowances, &config)
            .build_steps(&example_selection(), PAYER, &p)
            .await;
        assert!(matches!(
            result,
            Err(BuildError::QuotesNotAvailable { chain: Chain::Optimism })
        ));

        let empty = FakeRouter::quoting(vec![]);
        let result = StepBuilder::new(&empty, &allowances, &config)
            .build_steps(&example_selection(), PAYER, &p)
            .await;
        assert!(matches!(result, Err(BuildError::QuotesNotAvailable { .. })));
    }

    #[tokio::test]
    async fn test_later_group_failure_discards_earlier_groups() {
        let config = CheckoutConfig::default();
        let arb_usdc = Stablecoin::Usdc.deployment(Chain::ArbitrumOne).unwrap().address;
        let router = FakeRouter::quoting(vec![quote("q", vec![(op_usdc(), 4_010_000)])])
            .failing_on(Chain::ArbitrumOne);
        let allowances = FakeAllowances::default();
        let selection = vec![
            asset(Stablecoin::Usdc, Chain::Base, dec("5")),
            asset(Stablecoin::Usdc, Chain::Optimism, dec("4")),
            asset(Stablecoin::Usdc, Chain::ArbitrumOne, dec("10")),
        ];
        let result = StepBuilder::new(&router, &allowances, &config)
            .build_steps(&selection, PAYER, &params(dec("12"), Chain::Base))
            .await;
        assert!(matches!(
            result,
            Err(BuildError::QuotesNotAvailable { chain: Chain::ArbitrumOne })
        ));

        // the optimism group was quoted before arbitrum failed
        let seen = router.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].route.source, Chain::Optimism.id());
        assert_eq!(seen[1].reward.tokens[0].token, arb_usdc);
    }

    #[tokio::test]
    async fn test_group_total_spans_tokens() {
        let config = CheckoutConfig::default();
        let op_usdt = Stablecoin::Usdt.deployment(Chain::Optimism).unwrap().address;
        let router = FakeRouter::quoting(vec![quote("q", vec![(op_usdc(), 1), (op_usdt, 1)])]);
        let allowances = FakeAllowances::default();
        let selection = vec![
            asset(Stablecoin::Usdt, Chain::Optimism, dec("2.5")),
            asset(Stablecoin::Usdc, Chain::Optimism, dec("4")),
        ];
        let steps = StepBuilder::new(&router, &allowances, &config)
            .build_steps(&selection, PAYER, &params(dec("3"), Chain::Base))
            .await
            .unwrap();

        // two approvals, then the intent
        assert_eq!(steps.len(), 3);
        let drafted = &router.seen.lock().unwrap()[0];
        assert_eq!(drafted.route.tokens[0].amount, U256::from(3_000_000u64));
        assert_eq!(drafted.reward.tokens.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_selection_is_rejected() {
        let config = CheckoutConfig::default();
        let router = FakeRouter::failing();
        let allowances = FakeAllowances::default();
        let result = StepBuilder::new(&router, &allowances, &config)
            .build_steps(&[], PAYER, &params(dec("3"), Chain::Base))
            .await;
        assert!(matches!(result, Err(BuildError::EmptySelection)));
    }
}
