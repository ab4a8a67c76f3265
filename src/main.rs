use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use roombook::auth::Authenticator;
use roombook::config::Config;
use roombook::engine::Engine;
use roombook::http::{create_router, AppState};
use roombook::users::UserStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;
    roombook::observability::init(config.metrics_port)?;

    let engine = Arc::new(Engine::new(config.policy));
    let users = Arc::new(UserStore::new());
    let auth = Arc::new(Authenticator::new(&config.secret, config.token_ttl_secs));
    let app = create_router(AppState::new(engine, users, auth), config.testing);

    let addr = config.addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("roombook listening on {addr}");
    info!("  token_ttl: {}s", config.token_ttl_secs);
    info!("  testing routes: {}", if config.testing { "enabled" } else { "disabled" });
    info!(
        "  duration policy: {}",
        if config.policy.is_enabled() {
            format!("min={:?}ms max={:?}ms", config.policy.min, config.policy.max)
        } else {
            "disabled".to_string()
        }
    );
    info!(
        "  metrics: {}",
        config
            .metrics_port
            .map_or("disabled".to_string(), |p| format!("http://0.0.0.0:{p}/metrics"))
    );

    // Graceful shutdown: stop accepting on SIGTERM/ctrl-c, let in-flight requests finish
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("roombook stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("failed to listen for ctrl-c: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(e) => {
                tracing::warn!("failed to register SIGTERM handler: {e}");
                ctrl_c.await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await;
    }

    info!("shutdown signal received, draining requests");
}
