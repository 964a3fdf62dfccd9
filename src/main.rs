use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use bistro_api::{config, db, events, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_config = config::load_config().context("Failed to load configuration")?;
    config::init_tracing(app_config.log_level(), app_config.log_json);
    info!(
        environment = %app_config.environment,
        "Starting bistro-api v{}",
        env!("CARGO_PKG_VERSION")
    );

    let pool = db::establish_connection_from_app_config(&app_config)
        .await
        .context("Failed to connect to the database")?;
    let pool = Arc::new(pool);

    if app_config.auto_migrate {
        db::run_migrations(&pool)
            .await
            .context("Failed to run migrations")?;
    }

    let (event_sender, event_rx) = events::channel();
    tokio::spawn(events::process_events(event_rx));

    let addr = format!("{}:{}", app_config.host, app_config.port);
    let state = AppState::new(pool, app_config, event_sender);
    let app = bistro_api::app(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
