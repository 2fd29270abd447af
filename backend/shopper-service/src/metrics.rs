pub use shared_metrics::metrics::{metrics_handler, MetricsError};
