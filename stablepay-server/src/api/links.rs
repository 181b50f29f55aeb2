//! Short payment links.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use stablepay_sdk::link::is_well_formed;
use stablepay_sdk::objects::{PaymentLinkCreated, PaymentParams};

use crate::api::ApiError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_link))
        .route("/{id}", get(get_link))
}

/// `POST /links`: store params and return their content-derived id.
async fn create_link(
    State(state): State<AppState>,
    Json(params): Json<PaymentParams>,
) -> Result<impl IntoResponse, ApiError> {
    let id = state.links.set_payment_params(&params).await?;
    tracing::info!(%id, "Created payment link");
    Ok((StatusCode::CREATED, Json(PaymentLinkCreated { id })))
}

/// `GET /links/{id}`: the params stored under `id`.
async fn get_link(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PaymentParams>, ApiError> {
    if !is_well_formed(&id) {
        return Err(ApiError::NotFound);
    }
    state
        .links
        .get_payment_params(&id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound)
}
