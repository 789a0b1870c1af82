use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use upload_analyzer::{
    config::AppConfig,
    gemini::GeminiClient,
    setup_logging,
    web_pages::{self, AppState},
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    setup_logging();

    let config = AppConfig::from_env().context("failed to load configuration")?;
    let client = GeminiClient::new(&config.gemini).context("failed to create Gemini client")?;
    info!(
        model = %config.gemini.model,
        timeout_secs = config.gemini.timeout.as_secs(),
        "Gemini client configured"
    );

    let router = web_pages::router(AppState::new(Arc::new(client)), config.max_upload_bytes);
    let tcp_listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_address))?;

    info!("upload analyzer listening at http://{}", config.bind_address);

    axum::serve(tcp_listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}
