pub mod dashboard;
pub mod watchlist;
pub mod portfolio;
pub mod terminal;
pub mod analysis;

use chrono::Local;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::api::dsfm::DsfmClient;
use crate::fallback;
use crate::services::quote_service;
use crate::services::refresh_service::{RefreshConfig, RefreshController, RefreshHandle};
use crate::utils::{connection_banner, format_fetch_error};

/// Shared wiring every panel receives
#[derive(Clone)]
pub struct PanelContext {
    pub client: Arc<DsfmClient>,
    pub chart_dir: PathBuf,
}

/// Route a panel name to its run loop
pub async fn run_panel(ctx: PanelContext, name: &str, args: &[String]) -> Result<(), String> {
    match name {
        "dashboard" | "dash" => dashboard::run(ctx).await,
        "watchlist" | "watch" => watchlist::run(ctx, args).await,
        "portfolio" | "pf" => portfolio::run(ctx).await,
        "terminal" | "trade" => terminal::run(ctx, args).await,
        "analysis" | "dsfm" => analysis::run(ctx, args).await,
        _ => Err(format!(
            "Unknown panel: '{}'. Available: dashboard, watchlist, portfolio, terminal, analysis",
            name
        )),
    }
}

/// Section heading with a wall-clock stamp, e.g. `── Top Gainers ─ 12:30:45`
pub(crate) fn heading(title: &str) -> String {
    format!("\n── {} ─ {}", title, Local::now().format("%H:%M:%S"))
}

/// Block until the user interrupts the panel
pub(crate) async fn wait_for_interrupt() -> Result<(), String> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| format!("Failed to listen for ctrl-c: {}", e))
}

/// Turn a symbol into a safe chart file stem
pub(crate) fn file_slug(symbol: &str) -> String {
    symbol
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect::<String>()
        .to_lowercase()
}

/// Start the index ticker every panel carries. Prints the ticker line on
/// each refresh; while the backend is unreachable it prints the offline
/// banner once per outage and falls back to the static quote.
pub(crate) fn start_index_ticker(ctx: &PanelContext, interval: Duration) -> RefreshHandle {
    let client = Arc::clone(&ctx.client);
    let base_url = ctx.client.base_url().to_string();
    let offline = Arc::new(AtomicBool::new(false));
    let offline_ok = Arc::clone(&offline);

    RefreshController::start(
        "index-ticker",
        RefreshConfig::every(interval).with_jitter(Duration::from_millis(500)),
        move || {
            let client = Arc::clone(&client);
            async move { quote_service::get_index_quote(&client).await }
        },
        move |quote| {
            offline_ok.store(false, Ordering::SeqCst);
            println!("{}", quote_service::format_ticker_line(&quote));
        },
        move |err| {
            if err.is_connection() {
                if !offline.swap(true, Ordering::SeqCst) {
                    println!("{}", connection_banner(&base_url));
                }
                println!("{}", quote_service::format_ticker_line(&fallback::index_quote()));
            } else {
                println!("{}", format_fetch_error(&err));
            }
        },
    )
}
