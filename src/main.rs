mod config;
mod error;
mod gemini;
mod history;
mod model;
mod predictor;
mod prompt;
mod stats;
mod storage;
mod ui;

use config::AppConfig;
use eframe::egui;
use gemini::GeminiClient;
use history::HistoryLog;
use predictor::Predictor;
use std::sync::Arc;
use storage::SqliteStorage;
use tracing_subscriber::EnvFilter;
use ui::ShopWiseApp;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("shopwise=info")),
        )
        .init();

    let config = AppConfig::load();
    if config.api_key.is_none() {
        tracing::warn!("no API key configured; set GEMINI_API_KEY before predicting");
    }
    tracing::info!(model = %config.model, db = %config.db_path, "starting ShopWise");

    let storage = match SqliteStorage::open(&config.db_path) {
        Ok(storage) => storage,
        Err(e) => {
            tracing::warn!(error = %e, "cannot open history database, history will not persist");
            SqliteStorage::in_memory()?
        }
    };
    let history = HistoryLog::load(storage, &config.history_key);
    let predictor = Predictor::new(Arc::new(GeminiClient::new(&config)?));

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 900.0])
            .with_min_inner_size([760.0, 600.0]),
        ..Default::default()
    };

    eframe::run_native(
        "ShopWise AI",
        options,
        Box::new(move |cc| {
            ui::set_custom_style(&cc.egui_ctx);
            Ok(Box::new(ShopWiseApp::new(predictor, history)))
        }),
    )?;
    Ok(())
}
