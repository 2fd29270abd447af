use std::{future::Future, net, sync::Arc};

use axum::http;
use external_services::did_signer::HttpDidSigner;
use tokio::signal::unix::{signal, SignalKind};
use tower_http::trace as tower_trace;

use crate::{
    ap2_agent::Ap2MerchantAgent, catalog::InMemoryCatalog, challenge_store::InMemoryChallengeStore, checkout::CheckoutSessionManager,
    configs, device_registry::InMemoryDeviceRegistry, error::ConfigurationError, logger, metrics, request_log,
    server, session_store::InMemorySessionStore, state::AppState, utils,
};

const REQUEST_LOG_CAPACITY: usize = 1_000;
const SESSION_SWEEP_INTERVAL_SECS: u64 = 60;

/// # Panics
///
/// Will panic if signal handling fails.
pub async fn server_builder(config: configs::Config) -> Result<(), ConfigurationError> {
    let server_config = config.server.clone();
    let socket_addr = net::SocketAddr::new(server_config.host.parse()?, server_config.port);

    // Signal handler
    let (tx, rx) = tokio::sync::oneshot::channel();

    #[allow(clippy::expect_used)]
    tokio::spawn(async move {
        let mut sig_int = signal(SignalKind::interrupt()).expect("Failed to initialize SIGINT signal handler");
        let mut sig_term = signal(SignalKind::terminate()).expect("Failed to initialize SIGTERM signal handler");
        let mut sig_quit = signal(SignalKind::quit()).expect("Failed to initialize QUIT signal handler");
        let mut sig_hup = signal(SignalKind::hangup()).expect("Failed to initialize SIGHUP signal handler");

        tokio::select! {
            _ = sig_int.recv() => {
                logger::info!("Received SIGINT");
                tx.send(()).expect("Failed to send SIGINT signal");
            }
            _ = sig_term.recv() => {
                logger::info!("Received SIGTERM");
                tx.send(()).expect("Failed to send SIGTERM signal");
            }
            _ = sig_quit.recv() => {
                logger::info!("Received QUIT");
                tx.send(()).expect("Failed to send QUIT signal");
            }
            _ = sig_hup.recv() => {
                logger::info!("Received SIGHUP");
                tx.send(()).expect("Failed to send SIGHUP signal");
            }
        }
    });

    #[allow(clippy::expect_used)]
    let shutdown_signal = async {
        rx.await.expect("Failed to receive shutdown signal");
        logger::info!("Shutdown signal received");
    };

    let state = build_state(config);
    spawn_inactivity_sweep(Arc::clone(&state));

    logger::info!(host = %server_config.host, port = %server_config.port, "starting merchant service");

    http_server(state, socket_addr, shutdown_signal).await
}

fn build_state(config: configs::Config) -> Arc<AppState> {
    let sessions: Arc<dyn interfaces::session_store::SessionStore> = Arc::new(InMemorySessionStore::new());
    let challenges: Arc<dyn interfaces::challenge_store::ChallengeStore> = Arc::new(InMemoryChallengeStore::new());
    let devices: Arc<dyn interfaces::device_registry::DeviceRegistry> = Arc::new(InMemoryDeviceRegistry::new());
    let catalog: Arc<dyn interfaces::catalog::CatalogProvider> = Arc::new(InMemoryCatalog);
    let signer: Arc<dyn interfaces::signer::ReceiptSigner> = Arc::new(HttpDidSigner {
        endpoint: config.merchant.did_signing_endpoint.clone(),
        call_timeout_secs: common_utils::consts::DEFAULT_CALL_TIMEOUT_SECS,
    });

    let risk_policy = domain_types::risk::RiskPolicy::from(&config.risk);
    let demo_mode = config.common.environment != "production";

    let checkout = CheckoutSessionManager::new(Arc::clone(&sessions), Some(Arc::clone(&catalog)));
    let ap2_agent = Ap2MerchantAgent::new(
        Arc::clone(&sessions),
        Arc::clone(&challenges),
        Arc::clone(&devices),
        Arc::clone(&signer),
        risk_policy,
        config.merchant.id.clone(),
        demo_mode,
    );

    Arc::new(AppState {
        config,
        checkout,
        ap2_agent,
        catalog,
        devices,
        challenges,
        signer,
        request_log: Arc::new(request_log::RequestLogRecorder::new(REQUEST_LOG_CAPACITY)),
    })
}

/// Expires `ready_for_complete`/`requires_escalation` sessions past the
/// inactivity window (spec §5).
fn spawn_inactivity_sweep(state: Arc<AppState>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(SESSION_SWEEP_INTERVAL_SECS));
        loop {
            interval.tick().await;
            let now = common_utils::date_time::now();
            match state.checkout.expire_inactive_sessions(now).await {
                Ok(expired) if !expired.is_empty() => {
                    logger::info!(count = expired.len(), "expired inactive checkout sessions");
                }
                Ok(_) => {}
                Err(error) => logger::warn!(?error, "inactivity sweep failed"),
            }
        }
    });
}

async fn http_server(
    state: Arc<AppState>,
    socket: net::SocketAddr,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ConfigurationError> {
    let logging_layer = tower_trace::TraceLayer::new_for_http()
        .make_span_with(|request: &axum::extract::Request<_>| utils::record_fields_from_header(request))
        .on_request(tower_trace::DefaultOnRequest::new().level(tracing::Level::INFO))
        .on_response(
            tower_trace::DefaultOnResponse::new()
                .level(tracing::Level::INFO)
                .latency_unit(tower_http::LatencyUnit::Micros),
        )
        .on_failure(
            tower_trace::DefaultOnFailure::new()
                .latency_unit(tower_http::LatencyUnit::Micros)
                .level(tracing::Level::ERROR),
        );

    let request_log_layer = axum::middleware::from_fn_with_state(Arc::clone(&state.request_log), request_log::record_request);

    let router = axum::Router::new()
        .merge(server::health_check::router())
        .merge(server::discovery::router())
        .merge(server::catalog::router())
        .merge(server::credentials::router())
        .merge(server::checkout::router())
        .layer(request_log_layer)
        .layer(logging_layer)
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(socket).await?;

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    Ok(())
}

pub async fn metrics_server_builder(config: configs::Config) -> Result<(), ConfigurationError> {
    let listener = config.metrics.tcp_listener().await?;

    let router = axum::Router::new().route(
        "/metrics",
        axum::routing::get(|| async {
            match metrics::metrics_handler().await {
                Ok(metrics) => Ok(metrics),
                Err(error) => {
                    tracing::error!(?error, "Error fetching metrics");
                    Err((http::StatusCode::INTERNAL_SERVER_ERROR, "Error fetching metrics".to_string()))
                }
            }
        }),
    );

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(async {
            let output = tokio::signal::ctrl_c().await;
            tracing::error!("shutting down: {:?}", output);
        })
        .await?;

    Ok(())
}
