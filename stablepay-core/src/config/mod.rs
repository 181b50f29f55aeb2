//! Configuration types for Stablepay.
//!
//! These types represent the validated runtime configuration used by the
//! server and by checkout sessions. The actual file loading/parsing is
//! handled by the server crate.

mod checkout;
mod config_store;
mod services;

pub use checkout::CheckoutConfig;
pub use config_store::ConfigStore;
pub use services::{RpcEndpoint, ServerConfig, ServicesConfig};

/// Everything a running server reads from configuration.
///
/// Swapped atomically as a whole on reload through a [`ConfigStore`].
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub server: ServerConfig,
    pub checkout: CheckoutConfig,
    pub services: ServicesConfig,
    pub rpc: Vec<RpcEndpoint>,
}
