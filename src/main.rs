use anyhow::Result;
use apex_vision::{config::Config, web, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "apex_vision=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("🚀 Starting Apex Vision");

    // Load configuration
    let config = Config::from_env()?;

    // Load models; missing artifacts leave the server in degraded mode
    let app_state = AppState::new(config)?;
    if app_state.is_degraded() {
        tracing::warn!("⚠️ Starting with at least one model unavailable");
    }

    // Start web server
    web::start_server(app_state).await?;

    Ok(())
}
