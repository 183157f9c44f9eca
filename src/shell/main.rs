use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use guild_events::modules::members::adapters::outbound::tracing_notifier::TracingNotifier;
use guild_events::shared::infrastructure::error_reporter::TracingErrorReporter;
use guild_events::shell::config::AppConfig;
use guild_events::shell::http::router;
use guild_events::shell::state::{AppDependencies, AppState, MemberStore};
use guild_events::shell::workers::spawn_workers;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let config = AppConfig::from_env()?;
    let shutdown = CancellationToken::new();

    // In-memory store for now
    let dependencies = AppDependencies {
        store: Arc::new(MemberStore::new()),
        policy: Arc::new(config.experience_policy()),
        notifier: Arc::new(TracingNotifier),
        reporter: Arc::new(TracingErrorReporter),
    };
    let state = AppState::build(dependencies, config.channel_capacity, shutdown.clone()).await?;
    let workers = spawn_workers(&state, config.sweep_interval)?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(wait_for_ctrl_c(shutdown.clone()))
        .await?;

    shutdown.cancel();
    for worker in workers {
        if let Err(error) = worker.await {
            warn!(error = %error, "worker ended abnormally");
        }
    }
    info!("stopped");
    Ok(())
}

async fn wait_for_ctrl_c(shutdown: CancellationToken) {
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(error) = result {
                warn!(error = %error, "ctrl-c handler failed");
            }
            info!("shutdown requested");
            shutdown.cancel();
        }
        _ = shutdown.cancelled() => {}
    }
}
