//! Application state shared across all request handlers.

use std::sync::Arc;

use stablepay_core::config::{CheckoutConfig, ConfigStore, RuntimeConfig};
use stablepay_core::entities::PaymentLinkStore;
use stablepay_core::onchain::RpcAllowanceReader;
use stablepay_core::session::CheckoutDeps;
use stablepay_sdk::client::{NameResolverClient, QuoteClient, RelayClient};

/// Application state that is shared across all request handlers.
///
/// This is cloneable and cheap to pass around (everything is behind Arc).
#[derive(Clone)]
pub struct AppState {
    /// Runtime configuration (can be reloaded via SIGHUP).
    pub config: ConfigStore<RuntimeConfig>,
    /// Service clients built from the current configuration.
    pub deps: ConfigStore<CheckoutDeps>,
    /// Short-link storage.
    pub links: Arc<dyn PaymentLinkStore>,
}

impl AppState {
    pub fn new(config: RuntimeConfig, links: Arc<dyn PaymentLinkStore>) -> Self {
        let deps = build_deps(&config);
        Self {
            config: ConfigStore::new(config),
            deps: ConfigStore::new(deps),
            links,
        }
    }

    /// Swap in a reloaded configuration and rebuild the service clients.
    pub fn update_config(&self, config: RuntimeConfig) {
        self.deps.update(build_deps(&config));
        self.config.update(config);
    }

    pub fn checkout_config(&self) -> Arc<CheckoutConfig> {
        Arc::new(self.config.load().checkout.clone())
    }
}

/// Wire the checkout collaborators to the configured services.
pub fn build_deps(config: &RuntimeConfig) -> CheckoutDeps {
    let services = &config.services;
    CheckoutDeps::from_clients(
        RelayClient::new(services.relay_url.clone()),
        QuoteClient::new(services.quote_url.clone(), services.dapp_id.clone()),
        NameResolverClient::new(services.name_resolver_url.clone()),
        Arc::new(RpcAllowanceReader::new(&config.rpc)),
    )
}
