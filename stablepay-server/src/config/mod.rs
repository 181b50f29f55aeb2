//! Configuration module for stablepay-server.
//!
//! Handles loading configuration from TOML files and CLI arguments.

pub mod file;

use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use stablepay_core::config::{
    CheckoutConfig, RpcEndpoint, RuntimeConfig, ServerConfig, ServicesConfig,
};
use thiserror::Error;
use url::Url;

use crate::config::file::FileConfig;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    ValidationError(String),
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: PathBuf,
    listen_override: Option<SocketAddr>,
}

impl ConfigLoader {
    pub fn new(config_path: impl AsRef<Path>, listen_override: Option<SocketAddr>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            listen_override,
        }
    }

    /// Read the TOML file, apply CLI overrides and validate the result.
    pub fn load(&self) -> Result<RuntimeConfig, ConfigError> {
        let config_content = std::fs::read_to_string(&self.config_path)?;
        let mut file_config: FileConfig = toml::from_str(&config_content)?;

        if let Some(listen) = self.listen_override {
            file_config.server.listen = listen;
        }

        build_runtime_config(file_config)
    }

    /// Reload the configuration (used during SIGHUP).
    pub fn reload(&self) -> Result<RuntimeConfig, ConfigError> {
        self.load()
    }
}

fn build_runtime_config(file_config: FileConfig) -> Result<RuntimeConfig, ConfigError> {
    let checkout = convert_checkout(file_config.checkout);
    validate_checkout(&checkout)?;

    let mut seen = HashSet::new();
    let mut rpc = Vec::with_capacity(file_config.rpc.len());
    for endpoint in file_config.rpc {
        if !seen.insert(endpoint.chain) {
            return Err(ConfigError::ValidationError(format!(
                "duplicate rpc endpoint for {}",
                endpoint.chain
            )));
        }
        rpc.push(RpcEndpoint {
            chain: endpoint.chain,
            url: endpoint.url,
        });
    }

    Ok(RuntimeConfig {
        server: ServerConfig {
            listen: file_config.server.listen,
        },
        checkout,
        services: ServicesConfig {
            relay_url: with_trailing_slash(file_config.services.relay_url),
            quote_url: with_trailing_slash(file_config.services.quote_url),
            name_resolver_url: with_trailing_slash(file_config.services.name_resolver_url),
            dapp_id: file_config.services.dapp_id,
        },
        rpc,
    })
}

fn convert_checkout(c: file::CheckoutConfig) -> CheckoutConfig {
    let defaults = CheckoutConfig::default();
    CheckoutConfig {
        supported_chains: c.supported_chains.unwrap_or(defaults.supported_chains),
        supported_tokens: c.supported_tokens.unwrap_or(defaults.supported_tokens),
        default_token: c.default_token.unwrap_or(defaults.default_token),
        min_protocol_fee: c.min_protocol_fee.unwrap_or(defaults.min_protocol_fee),
        min_mainnet_protocol_fee: c
            .min_mainnet_protocol_fee
            .unwrap_or(defaults.min_mainnet_protocol_fee),
        dust_multiplier: c.dust_multiplier.unwrap_or(defaults.dust_multiplier),
        intent_source: c.intent_source.unwrap_or(defaults.intent_source),
        inbox: c.inbox.unwrap_or(defaults.inbox),
        prover: c.prover.unwrap_or(defaults.prover),
        intent_deadline_secs: c.intent_deadline_secs.unwrap_or(defaults.intent_deadline_secs),
    }
}

fn validate_checkout(checkout: &CheckoutConfig) -> Result<(), ConfigError> {
    if checkout.supported_chains.is_empty() {
        return Err(ConfigError::ValidationError(
            "checkout.supported_chains is empty".into(),
        ));
    }
    if !checkout.supports_token(checkout.default_token) {
        return Err(ConfigError::ValidationError(format!(
            "default token {} is not in checkout.supported_tokens",
            checkout.default_token
        )));
    }
    if checkout.min_protocol_fee.is_sign_negative()
        || checkout.min_mainnet_protocol_fee.is_sign_negative()
    {
        return Err(ConfigError::ValidationError(
            "protocol fees must not be negative".into(),
        ));
    }
    Ok(())
}

/// Endpoint paths are joined onto base URLs, which drops the last path
/// segment unless the base ends with `/`.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

/// Get the database URL from the environment, if one is configured.
pub fn get_database_url() -> Option<String> {
    std::env::var("DATABASE_URL").ok().filter(|url| !url.is_empty())
}
