//! HTTP API handlers.
//!
//! # Endpoints
//!
//! - `GET  /api/v1/checkout/params`             – validate raw payment params
//! - `GET  /api/v1/checkout/balances/{address}` – ranked, filtered payer balances
//! - `POST /api/v1/checkout/selection`          – optimized token selection
//! - `POST /api/v1/checkout/steps`              – transaction steps and wallet actions
//! - `POST /api/v1/links`                       – store params behind a short id
//! - `GET  /api/v1/links/{id}`                  – look up stored params

pub mod checkout;
pub mod links;

use axum::{Json, Router, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use stablepay_core::balances::BalanceError;
use stablepay_core::entities::LinkStoreError;
use stablepay_core::planner::PlanError;
use stablepay_core::selection::SelectionError;
use stablepay_core::session::SessionError;
use stablepay_core::steps::BuildError;

use crate::state::AppState;

/// Build the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/checkout", checkout::router())
        .nest("/links", links::router())
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Errors returned by the API handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("not found")]
    NotFound,
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Links(#[from] LinkStoreError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Links(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Session(e) => match e {
                SessionError::InvalidParams | SessionError::NoPayer => StatusCode::BAD_REQUEST,
                SessionError::Balance(BalanceError::Source(_))
                | SessionError::Selection(SelectionError::Suggestion(_))
                | SessionError::Plan(PlanError::Permit(_)) => StatusCode::BAD_GATEWAY,
                SessionError::Selection(SelectionError::Insufficient { .. })
                | SessionError::Plan(PlanError::EmptySelection) => StatusCode::UNPROCESSABLE_ENTITY,
                SessionError::Build(build) => match build {
                    BuildError::QuotesNotAvailable { .. } | BuildError::Allowance(_) => {
                        StatusCode::BAD_GATEWAY
                    }
                    BuildError::Amount(_) => StatusCode::INTERNAL_SERVER_ERROR,
                    BuildError::InvalidChain { .. }
                    | BuildError::AmbiguousTransfer { .. }
                    | BuildError::EmptySelection => StatusCode::UNPROCESSABLE_ENTITY,
                },
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, %status, "API request failed");
        } else {
            tracing::debug!(error = %self, %status, "API request rejected");
        }
        let error = if status == StatusCode::INTERNAL_SERVER_ERROR {
            "internal server error".to_string()
        } else {
            self.to_string()
        };
        (status, Json(ErrorBody { error })).into_response()
    }
}
