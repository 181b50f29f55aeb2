//! One payer's checkout, from raw parameters to planned actions.
//!
//! A session owns its own state and reaches the outside world only through
//! the collaborators in [`CheckoutDeps`], so sessions never share mutable
//! state.

use std::sync::Arc;

use alloy::primitives::Address;
use itertools::Itertools;
use rust_decimal::Decimal;
use stablepay_sdk::client::{NameResolverClient, QuoteClient, RelayClient};
use stablepay_sdk::objects::{
    PaymentParams, RequiredPaymentParams, UserAsset, ValidatedPaymentParams,
};
use thiserror::Error;
use tracing::debug;

use crate::balances::{BalanceError, BalanceSource, BalanceStore};
use crate::config::CheckoutConfig;
use crate::executor::ActionItem;
use crate::onchain::AllowanceReader;
use crate::planner::{PermitSource, PlanError, plan_actions, plan_permit, supports_permit};
use crate::selection::{
    ManualSelection, SelectionError, TransferSuggester, is_optimized, select_optimized,
    selected_total,
};
use crate::steps::{BuildError, IntentRouter, StepBuilder, TransactionStep};
use crate::validation::{NameResolver, validate_payment_params};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("complete required fields")]
    InvalidParams,
    #[error("no payer address")]
    NoPayer,
    #[error(transparent)]
    Balance(#[from] BalanceError),
    #[error(transparent)]
    Selection(#[from] SelectionError),
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error(transparent)]
    Plan(#[from] PlanError),
}

/// External collaborators of a checkout session.
#[derive(Clone)]
pub struct CheckoutDeps {
    pub names: Arc<dyn NameResolver>,
    pub balances: Arc<dyn BalanceSource>,
    pub suggester: Arc<dyn TransferSuggester>,
    pub router: Arc<dyn IntentRouter>,
    pub allowances: Arc<dyn AllowanceReader>,
    pub permits: Arc<dyn PermitSource>,
}

impl CheckoutDeps {
    /// Wire every collaborator to the real service clients.
    pub fn from_clients(
        relay: RelayClient,
        quotes: QuoteClient,
        names: NameResolverClient,
        allowances: Arc<dyn AllowanceReader>,
    ) -> Self {
        let relay = Arc::new(relay);
        Self {
            names: Arc::new(names),
            balances: relay.clone(),
            suggester: relay.clone(),
            router: Arc::new(quotes),
            allowances,
            permits: relay,
        }
    }
}

pub struct CheckoutSession {
    deps: CheckoutDeps,
    config: Arc<CheckoutConfig>,
    params: ValidatedPaymentParams,
    payer: Option<Address>,
    balances: BalanceStore,
    optimized: Vec<UserAsset>,
    manual: Option<ManualSelection>,
    selected: Vec<UserAsset>,
    steps: Vec<TransactionStep>,
}

impl CheckoutSession {
    /// Validate `raw` and open a session for it.
    pub async fn open(deps: CheckoutDeps, config: Arc<CheckoutConfig>, raw: &PaymentParams) -> Self {
        let params = validate_payment_params(raw, deps.names.as_ref(), &config).await;
        Self {
            deps,
            config,
            params,
            payer: None,
            balances: BalanceStore::new(),
            optimized: Vec::new(),
            manual: None,
            selected: Vec::new(),
            steps: Vec::new(),
        }
    }

    pub fn params(&self) -> &ValidatedPaymentParams {
        &self.params
    }

    pub fn required(&self) -> Result<RequiredPaymentParams, SessionError> {
        self.params.required().ok_or(SessionError::InvalidParams)
    }

    fn payer(&self) -> Result<Address, SessionError> {
        self.payer.ok_or(SessionError::NoPayer)
    }

    pub fn balances(&self) -> &BalanceStore {
        &self.balances
    }

    /// Fetch the payer's usable balances. Clears any earlier selection.
    pub async fn load_balances(&mut self, payer: Address) -> Result<&[UserAsset], SessionError> {
        let params = self.required()?;
        self.payer = Some(payer);
        self.optimized.clear();
        self.selected.clear();
        self.manual = None;
        self.steps.clear();
        self.balances
            .refresh(self.deps.balances.as_ref(), payer, &self.config, &params)
            .await?;
        Ok(&self.balances.balances)
    }

    /// Compute the optimized selection and make it the active one.
    pub async fn optimize(&mut self) -> Result<&[UserAsset], SessionError> {
        let params = self.required()?;
        let payer = self.payer()?;
        self.optimized = select_optimized(
            self.deps.suggester.as_ref(),
            &self.balances.balances,
            payer,
            &params,
        )
        .await?;
        self.selected = self.optimized.clone();
        self.manual = None;
        self.steps.clear();
        Ok(&self.optimized)
    }

    pub fn optimized(&self) -> &[UserAsset] {
        &self.optimized
    }

    /// The selection steps are built from.
    pub fn selection(&self) -> &[UserAsset] {
        &self.selected
    }

    pub fn selected_total(&self) -> Decimal {
        selected_total(&self.selected)
    }

    pub fn is_optimized(&self) -> bool {
        is_optimized(&self.optimized, &self.selected)
    }

    /// Start editing a copy of the active selection.
    pub fn edit_selection(&mut self) -> Result<&mut ManualSelection, SessionError> {
        let params = self.required()?;
        Ok(self
            .manual
            .insert(ManualSelection::from_selection(&self.selected, params.amount_due)))
    }

    pub fn manual(&mut self) -> Option<&mut ManualSelection> {
        self.manual.as_mut()
    }

    /// Make the edited selection active.
    pub fn confirm_selection(&mut self, known_fees: Decimal) -> Result<&[UserAsset], SessionError> {
        let Some(manual) = &self.manual else {
            return Ok(&self.selected);
        };
        self.selected = manual.confirm(known_fees)?;
        self.manual = None;
        self.steps.clear();
        debug!(selected = self.selected.len(), optimized = self.is_optimized(), "Confirmed manual selection");
        Ok(&self.selected)
    }

    /// Make `tokens` the active selection as an explicit set.
    ///
    /// Toggle rules do not apply; the set only has to cover the invoice
    /// plus `known_fees`. Repeated (token, chain) pairs count once.
    pub fn select(
        &mut self,
        tokens: &[UserAsset],
        known_fees: Decimal,
    ) -> Result<&[UserAsset], SessionError> {
        let params = self.required()?;
        let tokens: Vec<UserAsset> = tokens.iter().unique_by(|t| t.key()).cloned().collect();
        self.selected =
            ManualSelection::from_selection(&tokens, params.amount_due).confirm(known_fees)?;
        self.manual = None;
        self.steps.clear();
        debug!(selected = self.selected.len(), optimized = self.is_optimized(), "Selected explicit set");
        Ok(&self.selected)
    }

    /// Build transaction steps for the active selection.
    pub async fn build_steps(&mut self) -> Result<&[TransactionStep], SessionError> {
        let params = self.required()?;
        let payer = self.payer()?;
        let builder = StepBuilder::new(
            self.deps.router.as_ref(),
            self.deps.allowances.as_ref(),
            &self.config,
        );
        self.steps = builder.build_steps(&self.selected, payer, &params).await?;
        Ok(&self.steps)
    }

    pub fn steps(&self) -> &[TransactionStep] {
        &self.steps
    }

    /// Executor actions for the active selection: a single permit signature
    /// when every balance supports permits, otherwise one action per step.
    pub async fn plan(&mut self) -> Result<Vec<ActionItem>, SessionError> {
        let params = self.required()?;
        let payer = self.payer()?;
        if supports_permit(&self.selected) {
            return Ok(plan_permit(self.deps.permits.as_ref(), &self.selected, payer, &params).await?);
        }
        self.build_steps().await?;
        Ok(plan_actions(&self.steps))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::balances::tests::{FakeBalances, PAYER};
    use crate::executor::ActionKind;
    use crate::selection::tests::{FakeSuggester, suggestion};
    use crate::steps::tests::{FakeAllowances, FakeRouter, quote};
    use crate::validation::tests::StaticResolver;
    use async_trait::async_trait;
    use stablepay_sdk::client::ClientError;
    use stablepay_sdk::objects::relay::{BalanceEntry, BalancesResponse, SendRequest, SendResponse};
    use stablepay_sdk::objects::{Chain, Stablecoin};
    use std::collections::{BTreeMap, HashMap};

    struct NoPermits;

    #[async_trait]
    impl PermitSource for NoPermits {
        async fn request_permit(&self, _: &SendRequest) -> Result<SendResponse, ClientError> {
            Err(ClientError::Url(url::ParseError::EmptyHost))
        }
    }

    fn deps(permit: bool) -> CheckoutDeps {
        let balances = BalancesResponse(BTreeMap::from([
            (
                "base".to_string(),
                vec![BalanceEntry {
                    token: "USDC".into(),
                    amount: Decimal::from(5),
                }],
            ),
            (
                "optimism".to_string(),
                vec![BalanceEntry {
                    token: "USDC".into(),
                    amount: Decimal::from(10),
                }],
            ),
        ]));
        let op_usdc = Stablecoin::Usdc.deployment(Chain::Optimism).unwrap().address;
        CheckoutDeps {
            names: Arc::new(StaticResolver(HashMap::new())),
            balances: Arc::new(FakeBalances(Some(balances))),
            suggester: Arc::new(FakeSuggester::new(vec![(
                "optimized",
                vec![
                    suggestion(Chain::Base, "USDC", Decimal::from(5), permit),
                    suggestion(Chain::Optimism, "USDC", Decimal::from(7), permit),
                ],
            )])),
            router: Arc::new(FakeRouter::quoting(vec![quote("q", vec![(op_usdc, 7_010_000)])])),
            allowances: Arc::new(FakeAllowances::default()),
            permits: Arc::new(NoPermits),
        }
    }

    fn raw() -> PaymentParams {
        PaymentParams {
            recipient: Some("0x00000000000000000000000000000000000000bb".into()),
            amount_due: Some("12".into()),
            desired_network_id: Some("8453".into()),
            desired_token: Some("USDC".into()),
            redirect: None,
            show_fees: None,
        }
    }

    #[tokio::test]
    async fn test_full_checkout_flow() {
        let config = Arc::new(CheckoutConfig::default());
        let mut session = CheckoutSession::open(deps(false), config, &raw()).await;
        assert!(session.params().all_valid());

        let balances = session.load_balances(PAYER).await.unwrap();
        assert_eq!(balances.len(), 2);
        assert!(session.balances().has_fetched);

        session.optimize().await.unwrap();
        assert_eq!(session.selection()[0].chain, Chain::Base);
        assert!(session.is_optimized());
        assert_eq!(session.selected_total(), Decimal::from(15));

        let actions = session.plan().await.unwrap();
        assert_eq!(actions.len(), 3);
        assert_eq!(session.steps().len(), 3);
        assert!(actions.iter().all(|a| matches!(a.kind, ActionKind::WriteContract(_))));
    }

    #[tokio::test]
    async fn test_manual_edit_changes_active_selection() {
        let config = Arc::new(CheckoutConfig::default());
        let mut session = CheckoutSession::open(deps(false), config, &raw()).await;
        session.load_balances(PAYER).await.unwrap();
        session.optimize().await.unwrap();

        let base = session.selection()[0].clone();
        session.edit_selection().unwrap().toggle(&base);
        assert!(matches!(
            session.confirm_selection(Decimal::ZERO),
            Err(SessionError::Selection(SelectionError::Insufficient { .. }))
        ));
        // the failed confirmation keeps the optimized selection active
        assert!(session.is_optimized());
    }

    #[tokio::test]
    async fn test_explicit_set_ignores_pick_order() {
        let config = Arc::new(CheckoutConfig::default());
        let mut session = CheckoutSession::open(deps(false), config, &raw()).await;
        session.load_balances(PAYER).await.unwrap();
        let balances = session.balances().balances.clone();
        let reversed: Vec<_> = balances.iter().rev().cloned().collect();

        for picked in [balances.clone(), reversed] {
            let selected = session.select(&picked, Decimal::ZERO).unwrap();
            assert_eq!(selected.len(), 2);
            assert_eq!(session.selected_total(), Decimal::from(15));
        }

        let doubled = vec![balances[0].clone(), balances[0].clone()];
        assert!(matches!(
            session.select(&doubled, Decimal::ZERO),
            Err(SessionError::Selection(SelectionError::Insufficient { .. }))
        ));
        assert!(matches!(
            session.select(&balances, Decimal::from(4)),
            Err(SessionError::Selection(SelectionError::Insufficient { .. }))
        ));
    }

    #[tokio::test]
    async fn test_permit_path_uses_permit_source() {
        let config = Arc::new(CheckoutConfig::default());
        let mut session = CheckoutSession::open(deps(true), config, &raw()).await;
        session.load_balances(PAYER).await.unwrap();
        session.optimize().await.unwrap();
        assert!(matches!(
            session.plan().await,
            Err(SessionError::Plan(PlanError::Permit(_)))
        ));
    }

    #[tokio::test]
    async fn test_invalid_params_block_everything() {
        let config = Arc::new(CheckoutConfig::default());
        let mut bad = raw();
        bad.amount_due = Some("zero".into());
        let mut session = CheckoutSession::open(deps(false), config, &bad).await;
        assert!(!session.params().all_valid());
        assert!(matches!(
            session.load_balances(PAYER).await,
            Err(SessionError::InvalidParams)
        ));
    }
}
