use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod api;
mod fallback;
mod models;
mod panels;
mod services;
mod utils;

use api::dsfm::DsfmClient;
use panels::PanelContext;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("marketdeck=debug".parse().unwrap())
                .add_directive("reqwest=warn".parse().unwrap()),
        )
        .with_target(true)
        .init();

    info!("📈 Starting marketdeck...");
    info!("  marketdeck - terminal client for the DSFM market dashboard");
    info!("");

    let base_url =
        std::env::var("DSFM_API_URL").unwrap_or_else(|_| "http://localhost:8000".to_string());
    let chart_dir = PathBuf::from(
        std::env::var("MARKETDECK_CHART_DIR").unwrap_or_else(|_| "./charts".to_string()),
    );

    if let Err(e) = std::fs::create_dir_all(&chart_dir) {
        error!("Failed to create chart directory {}: {}", chart_dir.display(), e);
        return;
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    let panel = args.first().map(String::as_str).unwrap_or("dashboard");
    let panel_args = args.get(1..).unwrap_or(&[]);

    info!("Backend: {}", base_url);
    info!("Charts:  {}", chart_dir.display());

    let ctx = PanelContext {
        client: Arc::new(DsfmClient::with_base_url(base_url)),
        chart_dir,
    };

    if let Err(e) = panels::run_panel(ctx, panel, panel_args).await {
        error!("❌ {}", e);
        std::process::exit(1);
    }
}
