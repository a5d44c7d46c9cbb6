//! API server entry point.

use std::sync::Arc;

use api::config::{Config, LogFormat};
use order_flow::FlowConfig;
use store::{InMemorySessionStore, PostgresSessionStore, SessionStore};
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str()));
    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn session_store(config: &Config, flow: &FlowConfig) -> Arc<dyn SessionStore> {
    let Some(url) = &config.database_url else {
        tracing::info!("DATABASE_URL not set, keeping sessions in memory");
        return Arc::new(InMemorySessionStore::new(flow.session_ttl));
    };

    let pool = sqlx::PgPool::connect(url)
        .await
        .expect("failed to connect to PostgreSQL");
    let store = PostgresSessionStore::new(pool, flow.session_ttl);
    store
        .run_migrations()
        .await
        .expect("failed to run migrations");
    tracing::info!("sessions stored in PostgreSQL");
    Arc::new(store)
}

#[tokio::main]
async fn main() {
    let config = Config::from_env();
    let flow = FlowConfig::from_env();

    // 1. Initialize tracing
    init_tracing(&config);

    // 2. Install Prometheus metrics recorder
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Create the engine over the demo shop
    let sessions = session_store(&config, &flow).await;
    let (state, _shop) = api::create_default_state(sessions, flow);

    // 4. Sweep expired sessions in the background
    let engine = state.engine.clone();
    let purge_interval = config.purge_interval;
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(purge_interval);
        loop {
            ticker.tick().await;
            if let Err(e) = engine.purge_expired_sessions().await {
                tracing::warn!(error = %e, "session purge failed");
            }
        }
    });

    // 5. Build the application
    let app = api::create_app(state, metrics_handle);

    // 6. Start server
    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("server shut down gracefully");
}
