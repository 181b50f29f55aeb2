//! Axum server setup and router configuration.

use std::net::SocketAddr;

use axum::{Json, Router, response::IntoResponse, routing::get};
use serde::Serialize;
use tokio::net::TcpListener;

use crate::api;
use crate::shutdown::shutdown_signal;
use crate::state::AppState;

/// Build the main application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api::router())
        .with_state(state)
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Simple health check - returns OK if the server is running.
async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Run the server with graceful shutdown support.
pub async fn run_server(router: Router, addr: SocketAddr) -> Result<(), std::io::Error> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{Address, U256};
    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use rust_decimal::Decimal;
    use serde_json::{Value, json};
    use stablepay_core::balances::BalanceSource;
    use stablepay_core::config::{
        CheckoutConfig, RuntimeConfig, ServerConfig, ServicesConfig,
    };
    use stablepay_core::entities::MemoryPaymentLinkStore;
    use stablepay_core::onchain::{AllowanceError, AllowanceReader};
    use stablepay_core::planner::PermitSource;
    use stablepay_core::selection::TransferSuggester;
    use stablepay_core::session::CheckoutDeps;
    use stablepay_core::steps::IntentRouter;
    use stablepay_core::validation::NameResolver;
    use stablepay_sdk::client::ClientError;
    use stablepay_sdk::objects::{Chain, Stablecoin};
    use stablepay_sdk::objects::intent::{Intent, Quote};
    use stablepay_sdk::objects::relay::{
        BalanceEntry, BalancesResponse, SendRequest, SendResponse, TransfersRequest,
        TransfersResponse,
    };
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use tower::ServiceExt;

    const PAYER: &str = "0x00000000000000000000000000000000000000aa";
    const MERCHANT: &str = "0x00000000000000000000000000000000000000bb";

    fn unavailable() -> ClientError {
        ClientError::Url(url::ParseError::EmptyHost)
    }

    /// Serves USDC on base and optimism and fails every other call.
    struct Offline;

    #[async_trait]
    impl NameResolver for Offline {
        async fn resolve_name(&self, _: &str) -> Result<Option<Address>, ClientError> {
            Ok(None)
        }
    }

    #[async_trait]
    impl BalanceSource for Offline {
        async fn fetch_balances(&self, _: Address) -> Result<BalancesResponse, ClientError> {
            Ok(BalancesResponse(BTreeMap::from([
                (
                    "base".to_string(),
                    vec![BalanceEntry {
                        token: "USDC".into(),
                        amount: Decimal::from(20),
                    }],
                ),
                (
                    "optimism".to_string(),
                    vec![BalanceEntry {
                        token: "USDC".into(),
                        amount: Decimal::from(5),
                    }],
                ),
            ])))
        }
    }

    #[async_trait]
    impl TransferSuggester for Offline {
        async fn suggest_transfers(
            &self,
            _: &TransfersRequest,
        ) -> Result<TransfersResponse, ClientError> {
            Err(unavailable())
        }
    }

    #[async_trait]
    impl IntentRouter for Offline {
        async fn request_quotes(&self, _: &Intent) -> Result<Vec<Quote>, ClientError> {
            Err(unavailable())
        }
    }

    #[async_trait]
    impl AllowanceReader for Offline {
        async fn allowance(
            &self,
            chain: Chain,
            _: Address,
            _: Address,
            _: Address,
        ) -> Result<U256, AllowanceError> {
            Err(AllowanceError::NoEndpoint(chain))
        }
    }

    #[async_trait]
    impl PermitSource for Offline {
        async fn request_permit(&self, _: &SendRequest) -> Result<SendResponse, ClientError> {
            Err(unavailable())
        }
    }

    /// Quotes every intent and reports unlimited allowances.
    struct Quoting;

    #[async_trait]
    impl IntentRouter for Quoting {
        async fn request_quotes(&self, intent: &Intent) -> Result<Vec<Quote>, ClientError> {
            Ok(vec![Quote {
                quote_id: "q".into(),
                solver_id: None,
                reward_tokens: intent.reward.tokens.clone(),
                route_tokens: vec![],
                expiry_time: 0,
                estimated_fulfill_time_sec: None,
            }])
        }
    }

    #[async_trait]
    impl AllowanceReader for Quoting {
        async fn allowance(
            &self,
            _: Chain,
            _: Address,
            _: Address,
            _: Address,
        ) -> Result<U256, AllowanceError> {
            Ok(U256::MAX)
        }
    }

    fn offline_deps() -> CheckoutDeps {
        let offline = Arc::new(Offline);
        CheckoutDeps {
            names: offline.clone(),
            balances: offline.clone(),
            suggester: offline.clone(),
            router: offline.clone(),
            allowances: offline.clone(),
            permits: offline,
        }
    }

    fn test_state() -> AppState {
        state_with(offline_deps())
    }

    fn state_with(deps: CheckoutDeps) -> AppState {
        let base = url::Url::parse("http://localhost/").unwrap();
        let config = RuntimeConfig {
            server: ServerConfig {
                listen: "127.0.0.1:0".parse().unwrap(),
            },
            checkout: CheckoutConfig::default(),
            services: ServicesConfig {
                relay_url: base.clone(),
                quote_url: base.clone(),
                name_resolver_url: base,
                dapp_id: "test".into(),
            },
            rpc: Vec::new(),
        };
        let state = AppState::new(config, Arc::new(MemoryPaymentLinkStore::new()));
        state.deps.update(deps);
        state
    }

    async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    fn post(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(build_router(test_state()), get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_validate_params() {
        let router = build_router(test_state());
        let uri = format!("/api/v1/checkout/params?recipient={MERCHANT}&amount=12.5&network=8453&token=USDC");
        let (status, body) = send(router.clone(), get(&uri)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["allValid"], true);
        assert_eq!(body["params"]["desiredNetworkId"], "base");
        assert_eq!(body["params"]["showFees"], false);

        let (_, body) = send(router, get("/api/v1/checkout/params?amount=-1")).await;
        assert_eq!(body["allValid"], false);
        assert_eq!(body["params"]["amountDue"], Value::Null);
    }

    #[tokio::test]
    async fn test_links_round_trip() {
        let router = build_router(test_state());
        let params = json!({"recipient": MERCHANT, "amountDue": "5", "desiredNetworkId": "10"});
        let (status, created) = send(router.clone(), post("/api/v1/links", params.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["id"].as_str().unwrap().to_string();

        let (status, again) = send(router.clone(), post("/api/v1/links", params.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(again["id"], id.as_str());

        let (status, stored) = send(router.clone(), get(&format!("/api/v1/links/{id}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stored, params);

        let (status, _) = send(router.clone(), get("/api/v1/links/0000000000000000")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(router, get("/api/v1/links/bad!")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_balances_are_filtered_and_ranked() {
        let router = build_router(test_state());
        let uri = format!(
            "/api/v1/checkout/balances/{PAYER}?recipient={MERCHANT}&amount=12&network=8453&token=USDC"
        );
        let (status, body) = send(router.clone(), get(&uri)).await;
        assert_eq!(status, StatusCode::OK);
        let balances = body.as_array().unwrap();
        assert_eq!(balances.len(), 2);
        assert_eq!(balances[0]["chain"], "base");
        assert_eq!(balances[1]["chain"], "optimism");

        let (status, _) = send(router, get("/api/v1/checkout/balances/not-an-address?amount=1")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_balances_need_valid_params() {
        let router = build_router(test_state());
        let uri = format!("/api/v1/checkout/balances/{PAYER}?amount=12");
        let (status, body) = send(router, get(&uri)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_upstream_failure_is_bad_gateway() {
        let router = build_router(test_state());
        let request = json!({
            "payer": PAYER,
            "params": {"recipient": MERCHANT, "amountDue": "12", "desiredNetworkId": "8453"},
        });
        let (status, _) = send(router, post("/api/v1/checkout/selection", request)).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }

    fn steps_request(selection: Option<Value>) -> Value {
        let mut request = json!({
            "payer": PAYER,
            "params": {
                "recipient": MERCHANT,
                "amountDue": "12",
                "desiredNetworkId": "8453",
                "desiredToken": "USDC",
            },
        });
        if let Some(selection) = selection {
            request["selection"] = selection;
        }
        request
    }

    #[tokio::test]
    async fn test_manual_selection_is_order_independent() {
        let quoting = Arc::new(Quoting);
        let state = state_with(CheckoutDeps {
            router: quoting.clone(),
            allowances: quoting,
            ..offline_deps()
        });
        let router = build_router(state);
        let base = json!({"asset": Stablecoin::Usdc, "chain": Chain::Base});
        let optimism = json!({"asset": Stablecoin::Usdc, "chain": Chain::Optimism});

        for picked in [
            json!([base.clone(), optimism.clone()]),
            json!([optimism.clone(), base.clone()]),
        ] {
            let request = steps_request(Some(picked));
            let (status, body) = send(router.clone(), post("/api/v1/checkout/steps", request)).await;
            assert_eq!(status, StatusCode::OK, "{body}");
            assert_eq!(body["selection"].as_array().unwrap().len(), 2);
            assert_eq!(body["isOptimized"], false);
        }
    }

    #[tokio::test]
    async fn test_manual_selection_survives_optimizer_failure() {
        let router = build_router(test_state());

        let (status, _) = send(router.clone(), post("/api/v1/checkout/steps", steps_request(None))).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);

        let picked = json!([{"asset": "USDC", "chain": "base"}]);
        let request = steps_request(Some(picked));
        let (status, body) = send(router.clone(), post("/api/v1/checkout/steps", request)).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["isOptimized"], false);
        assert_eq!(body["steps"].as_array().unwrap().len(), 1);
        assert_eq!(body["actions"].as_array().unwrap().len(), 1);

        let picked = json!([{"asset": "USDC", "chain": "arbitrum"}]);
        let (status, _) = send(router, post("/api/v1/checkout/steps", steps_request(Some(picked)))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
