//! Checkout endpoints called by the payer's frontend.
//!
//! Every request opens a fresh [`CheckoutSession`] from the params it
//! carries, so no per-payer state is kept between requests.

use alloy::primitives::Address;
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use stablepay_core::executor::ActionItem;
use stablepay_core::session::CheckoutSession;
use stablepay_core::steps::TransactionStep;
use stablepay_sdk::objects::{Chain, PaymentParams, Stablecoin, UserAsset, ValidationReport};
use tracing::warn;

use crate::api::ApiError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/params", get(validate_params))
        .route("/balances/{address}", get(get_balances))
        .route("/selection", post(optimize_selection))
        .route("/steps", post(build_steps))
}

/// Payment params as they appear in a checkout URL.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutQuery {
    recipient: Option<String>,
    #[serde(alias = "amountDue")]
    amount: Option<String>,
    #[serde(alias = "desiredNetworkId")]
    network: Option<String>,
    #[serde(alias = "desiredToken")]
    token: Option<String>,
    redirect: Option<String>,
    show_fees: Option<bool>,
}

impl From<CheckoutQuery> for PaymentParams {
    fn from(q: CheckoutQuery) -> Self {
        PaymentParams {
            recipient: q.recipient,
            amount_due: q.amount,
            desired_network_id: q.network,
            desired_token: q.token,
            redirect: q.redirect,
            show_fees: q.show_fees,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionRequest {
    payer: Address,
    params: PaymentParams,
}

/// A balance picked by the payer, identified by token and chain.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TokenRef {
    asset: Stablecoin,
    chain: Chain,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepsRequest {
    payer: Address,
    params: PaymentParams,
    /// Manual selection; the optimized selection is used when absent.
    #[serde(default)]
    selection: Option<Vec<TokenRef>>,
    /// Fees the payer already knows about, added to the amount a manual
    /// selection must cover.
    #[serde(default)]
    known_fees: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionResponse {
    selection: Vec<UserAsset>,
    total: Decimal,
    amount_due: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepsResponse {
    selection: Vec<UserAsset>,
    is_optimized: bool,
    steps: Vec<TransactionStep>,
    actions: Vec<ActionItem>,
}

async fn open_session(state: &AppState, params: &PaymentParams) -> CheckoutSession {
    let deps = state.deps.load().as_ref().clone();
    CheckoutSession::open(deps, state.checkout_config(), params).await
}

/// Open a session, load the payer's balances and compute the optimized
/// selection.
async fn optimized_session(
    state: &AppState,
    payer: Address,
    params: &PaymentParams,
) -> Result<CheckoutSession, ApiError> {
    let mut session = open_session(state, params).await;
    session.load_balances(payer).await?;
    session.optimize().await?;
    Ok(session)
}

/// `GET /checkout/params`: run the validators over URL params.
async fn validate_params(
    State(state): State<AppState>,
    Query(query): Query<CheckoutQuery>,
) -> Json<ValidationReport> {
    let session = open_session(&state, &query.into()).await;
    let params = session.params().clone();
    Json(ValidationReport {
        all_valid: params.all_valid(),
        params,
    })
}

/// `GET /checkout/balances/{address}`: ranked, usable balances of a payer.
async fn get_balances(
    State(state): State<AppState>,
    Path(address): Path<String>,
    Query(query): Query<CheckoutQuery>,
) -> Result<Json<Vec<UserAsset>>, ApiError> {
    let payer: Address = address
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("invalid address {address}")))?;
    let mut session = open_session(&state, &query.into()).await;
    let balances = session.load_balances(payer).await?;
    Ok(Json(balances.to_vec()))
}

/// `POST /checkout/selection`: the optimized selection for a payer.
async fn optimize_selection(
    State(state): State<AppState>,
    Json(request): Json<SelectionRequest>,
) -> Result<Json<SelectionResponse>, ApiError> {
    let session = optimized_session(&state, request.payer, &request.params).await?;
    let amount_due = session.required()?.amount_due;
    Ok(Json(SelectionResponse {
        selection: session.selection().to_vec(),
        total: session.selected_total(),
        amount_due,
    }))
}

/// `POST /checkout/steps`: transaction steps and the wallet actions that
/// carry them out.
async fn build_steps(
    State(state): State<AppState>,
    Json(request): Json<StepsRequest>,
) -> Result<Json<StepsResponse>, ApiError> {
    let mut session = open_session(&state, &request.params).await;
    session.load_balances(request.payer).await?;

    match request.selection {
        None => {
            session.optimize().await?;
        }
        Some(picked) => {
            // Only used to report `isOptimized` here.
            if let Err(error) = session.optimize().await {
                warn!(%error, "Optimized selection unavailable, keeping manual selection");
            }
            let tokens = picked
                .iter()
                .map(|r| {
                    session
                        .balances()
                        .balances
                        .iter()
                        .find(|b| b.key() == (r.asset, r.chain))
                        .cloned()
                        .ok_or_else(|| {
                            ApiError::BadRequest(format!(
                                "no usable {} balance on {}",
                                r.asset, r.chain
                            ))
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;
            session.select(&tokens, request.known_fees)?;
        }
    }

    let actions = session.plan().await?;
    Ok(Json(StepsResponse {
        selection: session.selection().to_vec(),
        is_optimized: session.is_optimized(),
        steps: session.steps().to_vec(),
        actions,
    }))
}
