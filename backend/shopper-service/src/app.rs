use std::{future::Future, net, sync::Arc};

use axum::http;
use external_services::{
    oauth1::Oauth1Signer,
    tokenization::{NoopAdapter, Oauth1Adapter},
};
use interfaces::tokenization::TokenizationAdapter;
use masking::ExposeInterface;
use tokio::signal::unix::{signal, SignalKind};
use tower_http::trace as tower_trace;

use crate::{
    ap2_consumer::Ap2ConsumerAgent, configs, credentials::CredentialsProvider, credentials_store::InMemoryCredentialsStore,
    error::ConfigurationError, logger, merchant_client::MerchantClient, metrics, orchestrator::CheckoutOrchestrator,
    pan_cipher::PanCipher, server, state::AppState, utils,
};

/// # Panics
///
/// Will panic if signal handling fails, or if the configured PAN
/// encryption key or tokenization private key is malformed — both are
/// startup-time configuration errors, not runtime conditions.
pub async fn server_builder(config: configs::Config) -> Result<(), ConfigurationError> {
    let server_config = config.server.clone();
    let socket_addr = net::SocketAddr::new(server_config.host.parse()?, server_config.port);

    let (tx, rx) = tokio::sync::oneshot::channel();

    #[allow(clippy::expect_used)]
    tokio::spawn(async move {
        let mut sig_int =
            signal(SignalKind::interrupt()).expect("Failed to initialize SIGINT signal handler");
        let mut sig_term =
            signal(SignalKind::terminate()).expect("Failed to initialize SIGTERM signal handler");
        let mut sig_quit =
            signal(SignalKind::quit()).expect("Failed to initialize QUIT signal handler");
        let mut sig_hup =
            signal(SignalKind::hangup()).expect("Failed to initialize SIGHUP signal handler");

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

    logger::info!(host = %server_config.host, port = %server_config.port, "starting shopper service");

    http_server(state, socket_addr, shutdown_signal).await
}

#[allow(clippy::expect_used)]
fn build_state(config: configs::Config) -> Arc<AppState> {
    let pan_cipher =
        PanCipher::from_base64(&config.shopper.pan_encryption_key).expect("configured PAN encryption key is malformed");

    let tokenization: Arc<dyn TokenizationAdapter> = if config.tokenization.enabled {
        let private_key = config
            .tokenization
            .private_key
            .as_ref()
            .expect("tokenization.enabled requires tokenization.private_key")
            .clone();
        let private_key_der =
            common_utils::b64::decode(private_key.expose()).expect("tokenization private key is not valid base64");
        let signer = Oauth1Signer::new(config.tokenization.consumer_key.clone(), &private_key_der)
            .expect("tokenization private key could not be parsed");
        Arc::new(Oauth1Adapter::new(
            config.tokenization.tokenize_url.clone().expect("tokenization.enabled requires tokenize_url"),
            config
                .tokenization
                .authenticate_url
                .clone()
                .expect("tokenization.enabled requires authenticate_url"),
            config.tokenization.verify_url.clone().expect("tokenization.enabled requires verify_url"),
            config.tokenization.call_timeout_secs,
            signer,
        ))
    } else {
        Arc::new(NoopAdapter)
    };

    let store = Arc::new(InMemoryCredentialsStore::new());
    let merchant = Arc::new(MerchantClient::new(config.shopper.merchant_discovery_url.clone(), config.shopper.call_timeout_secs));
    let credentials = Arc::new(CredentialsProvider::new(store, pan_cipher, Arc::clone(&tokenization), Arc::clone(&merchant)));
    let consumer_agent = Ap2ConsumerAgent::new(config.shopper.device_origin.clone());
    let orchestrator = CheckoutOrchestrator::new(Arc::clone(&credentials), consumer_agent, merchant, tokenization);

    Arc::new(AppState {
        config,
        credentials,
        orchestrator,
    })
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

    let router = axum::Router::new()
        .merge(server::health_check::router())
        .merge(server::enroll::router())
        .merge(server::purchase::router())
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
            let output = metrics::metrics_handler().await;
            match output {
                Ok(metrics) => Ok(metrics),
                Err(error) => {
                    tracing::error!(?error, "Error fetching metrics");

                    Err((
                        http::StatusCode::INTERNAL_SERVER_ERROR,
                        "Error fetching metrics".to_string(),
                    ))
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
