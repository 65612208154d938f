mod api;
mod events;
mod middleware;

use std::{sync::Arc, time::Duration};

use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, AppState},
    events::EventBus,
    middleware::{AuthState, RateLimitState},
};

const EVENT_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(shopdb_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = shopdb_db::PoolConfig::from_app_config(&config);
    let pool = shopdb_db::connect_pool(&config.database_url, pool_config).await?;
    let applied = shopdb_db::run_migrations(&pool).await?;
    tracing::info!(applied, env = %config.env, "database ready");

    let importer = Arc::new(shopdb_importer::PriceListClient::new(
        config.fetch_timeout_secs,
        &config.fetch_user_agent,
        config.max_upload_bytes,
    )?);
    let (events, event_task) = EventBus::spawn_logging();

    let auth = AuthState::new(pool.clone(), &config.token_salt);
    let rate_limit = RateLimitState::per_minute(config.rate_limit_per_minute);
    let state = AppState {
        pool,
        config: Arc::clone(&config),
        importer,
        events,
    };
    let app = build_app(state, auth, rate_limit);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The router owned the last senders; the consumer exits once drained.
    match tokio::time::timeout(EVENT_DRAIN_TIMEOUT, event_task).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::warn!(error = %e, "event consumer ended abnormally"),
        Err(_) => tracing::warn!("event consumer did not drain before shutdown"),
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
