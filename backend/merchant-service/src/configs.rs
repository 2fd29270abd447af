use std::path::PathBuf;

use rust_decimal::Decimal;

use crate::{consts, error::ConfigurationError, logger::Log};

#[derive(Clone, serde::Deserialize, Debug)]
pub struct Config {
    pub common: Common,
    pub server: Server,
    pub metrics: MetricsServer,
    pub log: Log,
    pub merchant: Merchant,
    pub risk: RiskConfig,
}

#[derive(Clone, serde::Deserialize, Debug)]
pub struct Common {
    pub environment: String,
}

impl Common {
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        match self.environment.as_str() {
            "development" | "production" => Ok(()),
            _ => Err(config::ConfigError::Message(format!(
                "Invalid environment '{}'. Must be 'development' or 'production'",
                self.environment
            ))),
        }
    }
}

#[derive(Clone, serde::Deserialize, Debug)]
pub struct Server {
    pub host: String,
    pub port: u16,
}

#[derive(Clone, serde::Deserialize, Debug)]
pub struct MetricsServer {
    pub host: String,
    pub port: u16,
}

/// Identity published at `/.well-known/ucp` (spec §6).
#[derive(Clone, serde::Deserialize, Debug)]
pub struct Merchant {
    pub id: String,
    pub name: String,
    pub url: String,
    /// Base URL this service is reachable at, advertised as the UCP
    /// rest endpoint.
    pub public_base_url: String,
    /// `None` when no DID signing endpoint is configured — receipts are
    /// issued unsigned (spec §4.2 step 5, §6).
    #[serde(default)]
    pub did_signing_endpoint: Option<String>,
}

/// Risk adjudication policy knobs (spec §4.2 step 3).
#[derive(Clone, serde::Deserialize, Debug)]
pub struct RiskConfig {
    pub step_up_enabled: bool,
    #[serde(default = "default_threshold_small")]
    pub threshold_small: f64,
    #[serde(default = "default_threshold_large")]
    pub threshold_large: f64,
    #[serde(default = "default_amount_threshold")]
    pub amount_threshold: Decimal,
}

fn default_threshold_small() -> f64 {
    0.10
}

fn default_threshold_large() -> f64 {
    0.30
}

fn default_amount_threshold() -> Decimal {
    Decimal::new(10000, 2)
}

impl From<&RiskConfig> for domain_types::risk::RiskPolicy {
    fn from(config: &RiskConfig) -> Self {
        Self {
            step_up_enabled: config.step_up_enabled,
            threshold_small: config.threshold_small,
            threshold_large: config.threshold_large,
            amount_threshold: config.amount_threshold,
        }
    }
}

impl Config {
    pub fn new() -> Result<Self, config::ConfigError> {
        Self::new_with_config_path(None)
    }

    pub fn new_with_config_path(explicit_config_path: Option<PathBuf>) -> Result<Self, config::ConfigError> {
        let env = consts::Env::current_env();
        let config_path = Self::config_path(&env, explicit_config_path);

        let config = Self::builder(&env)?
            .add_source(config::File::from(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("MERCHANT")
                    .try_parsing(true)
                    .separator("__"),
            )
            .build()?;

        #[allow(clippy::print_stderr)]
        let config: Self = serde_path_to_error::deserialize(config).map_err(|error| {
            eprintln!("Unable to deserialize application configuration: {error}");
            error.into_inner()
        })?;

        config.common.validate()?;

        Ok(config)
    }

    pub fn builder(environment: &consts::Env) -> Result<config::ConfigBuilder<config::builder::DefaultState>, config::ConfigError> {
        config::Config::builder().set_override("env", environment.to_string())
    }

    pub fn config_path(environment: &consts::Env, explicit_config_path: Option<PathBuf>) -> PathBuf {
        let mut config_path = PathBuf::new();
        if let Some(explicit_config_path_val) = explicit_config_path {
            config_path.push(explicit_config_path_val);
        } else {
            config_path.push(workspace_path());
            config_path.push("config");
            config_path.push("merchant-service");
            config_path.push(environment.config_path());
        }
        config_path
    }
}

impl Server {
    pub async fn tcp_listener(&self) -> Result<tokio::net::TcpListener, ConfigurationError> {
        let loc = format!("{}:{}", self.host, self.port);
        tracing::info!(loc = %loc, "binding the server");
        Ok(tokio::net::TcpListener::bind(loc).await?)
    }
}

impl MetricsServer {
    pub async fn tcp_listener(&self) -> Result<tokio::net::TcpListener, ConfigurationError> {
        let loc = format!("{}:{}", self.host, self.port);
        tracing::info!(loc = %loc, "binding the metrics server");
        Ok(tokio::net::TcpListener::bind(loc).await?)
    }
}

pub fn workspace_path() -> PathBuf {
    if let Ok(manifest_dir) = std::env::var("CARGO_MANIFEST_DIR") {
        let mut path = PathBuf::from(manifest_dir);
        path.pop();
        path.pop();
        path
    } else {
        PathBuf::from(".")
    }
}
