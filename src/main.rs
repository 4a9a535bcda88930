use anyhow::Context;
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::EnvFilter;
use voicepaint::{configuration::get_configuration, server::configure_app};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = get_configuration().context("Failed to load configuration")?;
    let app = configure_app(&settings).context("Failed to build the AI gateway")?;

    let listener = tokio::net::TcpListener::bind(settings.application.address())
        .await
        .with_context(|| format!("Failed to bind {}", settings.application.address()))?;
    let local_addr: SocketAddr = listener.local_addr()?;

    info!("✨ Server ready:");
    info!("  🌎 http://{}", local_addr);
    info!("  📝 API endpoint: http://{}/api/audio-to-image", local_addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
