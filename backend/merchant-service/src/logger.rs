//! Logging subsystem. The stack is deliberately plain `tracing_subscriber`
//! composition (env-filter + fmt layer) rather than the structured
//! sink/Kafka pipeline a larger deployment might reach for — this
//! demonstrator has no such sink to ship to.

pub use tracing::{debug, error, event as log, info, warn};

#[macro_export]
macro_rules! service_name {
    () => {
        env!("CARGO_BIN_NAME")
    };
}

#[derive(Clone, serde::Deserialize, Debug, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Default,
    Json,
}

#[derive(Clone, serde::Deserialize, Debug)]
pub struct Log {
    pub console: ConsoleConfig,
}

#[derive(Clone, serde::Deserialize, Debug)]
pub struct ConsoleConfig {
    pub enabled: bool,
    #[serde(default)]
    pub level: LogLevel,
    #[serde(default)]
    pub log_format: LogFormat,
}

#[derive(Clone, Copy, serde::Deserialize, Debug, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn into_level(self) -> tracing::Level {
        match self {
            Self::Error => tracing::Level::ERROR,
            Self::Warn => tracing::Level::WARN,
            Self::Info => tracing::Level::INFO,
            Self::Debug => tracing::Level::DEBUG,
            Self::Trace => tracing::Level::TRACE,
        }
    }
}

/// Holds the non-blocking writer guard alive for the process lifetime.
pub struct TelemetryGuard {
    _guard: Option<tracing_appender::non_blocking::WorkerGuard>,
}

pub fn setup(config: &Log, service_name: &str) -> TelemetryGuard {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let (writer, guard) = tracing_appender::non_blocking(std::io::stdout());

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.console.level.into_level().to_string()));

    let registry = tracing_subscriber::registry().with(filter);

    if config.console.enabled {
        match config.console.log_format {
            LogFormat::Json => {
                let fmt_layer = tracing_subscriber::fmt::layer().json().with_writer(writer);
                registry.with(fmt_layer).init();
            }
            LogFormat::Default => {
                let fmt_layer = tracing_subscriber::fmt::layer().with_writer(writer);
                registry.with(fmt_layer).init();
            }
        }
    } else {
        registry.init();
    }

    tracing::info!(service_name, "logging subsystem initialized");

    TelemetryGuard { _guard: Some(guard) }
}
