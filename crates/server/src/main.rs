mod config;
mod model;
mod schedule;
mod state;
mod web;

use anyhow::Result;
use std::{env, sync::Arc};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // ── Env config ──────────────────────────────────────────────────
    let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    let model_path = env::var("MODEL_PATH").unwrap_or_else(|_| "watering_model.json".to_string());
    let scaler_path = env::var("SCALER_PATH").unwrap_or_else(|_| "scaler.json".to_string());

    // ── Watering windows (degrades to defaults, never fatal) ────────
    let cfg = config::load(&config_path);
    let windows = cfg.windows();
    info!(
        morning = ?windows.morning(),
        evening = ?windows.evening(),
        "watering windows ready"
    );

    // ── Model artifacts (one-shot; a failed load is not fatal) ──────
    // Without a model the service still serves status, and every predict
    // request gets a deterministic 503.
    let model = match model::ModelBundle::load(&model_path, &scaler_path) {
        Ok(bundle) => {
            info!("model and scaler loaded");
            Some(bundle)
        }
        Err(e) => {
            error!("model load failed: {e:#}; /api/predict will answer 503");
            None
        }
    };

    // ── Shared state + web server ───────────────────────────────────
    let state = Arc::new(AppState::new(windows, model));
    web::serve(state).await;

    Ok(())
}
