use std::path::PathBuf;

use crate::{consts, error::ConfigurationError, logger::Log};

#[derive(Clone, serde::Deserialize, Debug)]
pub struct Config {
    pub common: Common,
    pub server: Server,
    pub metrics: MetricsServer,
    pub log: Log,
    pub shopper: Shopper,
    pub tokenization: Tokenization,
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

fn default_call_timeout_secs() -> u64 {
    common_utils::consts::DEFAULT_CALL_TIMEOUT_SECS
}

/// The Credentials Provider and Checkout Orchestrator's knobs (spec §4.3,
/// §4.4).
#[derive(Clone, serde::Deserialize, Debug)]
pub struct Shopper {
    /// Where the merchant publishes its discovery document; polled once
    /// at startup and cached for the process lifetime.
    pub merchant_discovery_url: String,
    /// Base64 (unpadded, URL-safe) AES-256-GCM key used to encrypt PANs
    /// at rest. Held in memory for the process lifetime (spec §4.4, §5).
    pub pan_encryption_key: masking::Secret<String>,
    /// Origin string the simulated device binds its assertion to (spec
    /// §4.4 Authentication: "assertion over (challenge, origin, digest)").
    #[serde(default = "default_origin")]
    pub device_origin: String,
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,
}

fn default_origin() -> String {
    "https://shopper-demo.example".to_string()
}

/// Network Tokenization Adapter wiring (spec §4.5, §9 capability flag).
#[derive(Clone, serde::Deserialize, Debug)]
pub struct Tokenization {
    pub enabled: bool,
    #[serde(default)]
    pub consumer_key: String,
    /// Base64-encoded PKCS#8 RSA private key, present only when enabled.
    #[serde(default)]
    pub private_key: Option<masking::Secret<String>>,
    #[serde(default)]
    pub tokenize_url: Option<String>,
    #[serde(default)]
    pub authenticate_url: Option<String>,
    #[serde(default)]
    pub verify_url: Option<String>,
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,
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
                config::Environment::with_prefix("SHOPPER")
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
            config_path.push("shopper-service");
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
