use std::net::SocketAddr;

use anyhow::Context;

mod activity;
mod admin;
mod app;
mod auth;
mod config;
mod error;
mod jobs;
#[cfg(test)]
mod memory;
mod state;
mod users;

use crate::{config::AppConfig, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "jobtrack=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = AppConfig::from_env()?;
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("APP_HOST/APP_PORT")?;

    let state = AppState::init(config).await?;

    if let Some(seed) = &state.config.admin {
        state
            .credentials
            .ensure_admin(seed)
            .await
            .with_context(|| format!("seed admin {}", seed.email))?;
    }

    app::serve(app::build_app(state), addr).await
}
