use dotenvy::dotenv;
use log::{error, info};
use std::sync::Arc;

use insighta::config::AppConfig;
use insighta::core::shared::state::AppState;
use insighta::main_module::run_axum_server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .write_style(env_logger::WriteStyle::Always)
        .init();

    let config = AppConfig::load()?;
    info!(
        "Starting {} v{}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );

    let state = Arc::new(AppState::from_config(config)?);
    if let Err(e) = run_axum_server(state).await {
        error!("Server stopped with error: {}", e);
        return Err(e.into());
    }

    info!("Server stopped");
    Ok(())
}
