use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use imagegen_core::config::RenderConfig;
use imagegen_render::{JobDispatcher, TokioProcessRunner};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use imagegen_api::background::artifact_retention;
use imagegen_api::config::ServerConfig;
use imagegen_api::router::build_app_router;
use imagegen_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "imagegen_api=debug,imagegen_render=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env().expect("Invalid server configuration");
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    let render_config =
        RenderConfig::load(&config.render_config_path).expect("Invalid render configuration");
    tracing::info!(
        config_path = %config.render_config_path.display(),
        executable = %render_config.executable_path.display(),
        output_dir = %render_config.output_dir.display(),
        capacity = render_config.max_concurrent_renders,
        timeout_secs = render_config.render_timeout_secs,
        "Loaded render configuration"
    );

    let request_timeout = config
        .request_timeout(&render_config)
        .expect("Invalid request timeout");
    tracing::info!(
        request_timeout_secs = request_timeout.as_secs(),
        "Request timeout set"
    );

    tokio::fs::create_dir_all(&render_config.output_dir)
        .await
        .expect("Failed to create output directory");

    // --- Dispatcher ---
    let output_dir = render_config.output_dir.clone();
    let dispatcher = Arc::new(JobDispatcher::new(
        Arc::new(render_config),
        Arc::new(TokioProcessRunner),
    ));

    // --- Artifact retention ---
    let retention_cancel = CancellationToken::new();
    let retention_handle = config.retention_policy().map(|policy| {
        tokio::spawn(artifact_retention::run(
            output_dir,
            policy,
            retention_cancel.clone(),
        ))
    });
    if retention_handle.is_none() {
        tracing::info!("Artifact retention disabled");
    }

    // --- App state ---
    let state = AppState {
        config: Arc::new(config.clone()),
        dispatcher,
    };

    let app = build_app_router(state, &config).expect("Invalid request timeout");

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            shutdown_signal().await;
            shutdown.cancel();
        }
    });

    let server = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.clone().cancelled_owned())
        .into_future();
    let drain_deadline = async {
        shutdown.cancelled().await;
        tokio::time::sleep(Duration::from_secs(config.shutdown_timeout_secs)).await;
    };

    tokio::select! {
        result = server => result.expect("Server error"),
        () = drain_deadline => {
            tracing::warn!(
                timeout_secs = config.shutdown_timeout_secs,
                "In-flight requests did not finish in time, shutting down anyway"
            );
        }
    }

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    retention_cancel.cancel();
    if let Some(handle) = retention_handle {
        let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
        tracing::info!("Artifact retention stopped");
    }

    // Render tasks still running are dropped with the runtime, which kills
    // their child processes (`kill_on_drop`).
    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
