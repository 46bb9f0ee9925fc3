use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use super::{heading, start_index_ticker, wait_for_interrupt, PanelContext};
use crate::api::dsfm::models::{MarketMovers, Mover};
use crate::services::refresh_service::{RefreshConfig, RefreshController};
use crate::utils::{format_fetch_error, Table};

const INDEX_INTERVAL: Duration = Duration::from_secs(10);
const MOVERS_INTERVAL: Duration = Duration::from_secs(30);
const MOVER_ROWS: usize = 5;

/// Market overview: index ticker plus top gainers/losers
pub async fn run(ctx: PanelContext) -> Result<(), String> {
    info!("📊 Opening dashboard against {}", ctx.client.base_url());

    show_market_pulse(&ctx).await;

    let ticker = start_index_ticker(&ctx, INDEX_INTERVAL);

    let movers = {
        let client = Arc::clone(&ctx.client);
        RefreshController::start(
            "dashboard-movers",
            RefreshConfig::every(MOVERS_INTERVAL).with_jitter(Duration::from_secs(2)),
            move || {
                let client = Arc::clone(&client);
                async move { client.get_market_movers().await }
            },
            |movers| {
                println!("{}", render_movers(&movers));
            },
            |err| {
                println!("{}", format_fetch_error(&err));
            },
        )
    };

    info!(
        "Dashboard refreshing: indices every {}s, movers every {}s. Ctrl-C to exit.",
        INDEX_INTERVAL.as_secs(),
        MOVERS_INTERVAL.as_secs()
    );
    wait_for_interrupt().await?;

    ticker.cancel();
    movers.cancel();
    ticker.stopped().await;
    movers.stopped().await;
    Ok(())
}

/// One-shot extras shown when the panel opens
async fn show_market_pulse(ctx: &PanelContext) {
    match ctx.client.get_most_bought().await {
        Ok(response) => {
            if let Some(stock) = response.most_bought {
                println!("{}", heading("Most Bought"));
                println!("{}", stock);
            }
        }
        Err(err) => warn!("most-bought unavailable: {}", err),
    }

    match ctx.client.get_market_insights().await {
        Ok(insights) => {
            println!("{}", heading("Market Insights"));
            println!(
                "{}",
                serde_json::to_string_pretty(&insights).unwrap_or_else(|_| insights.to_string())
            );
        }
        Err(err) => warn!("market insights unavailable: {}", err),
    }
}

/// Both mover tables as one text block
fn render_movers(movers: &MarketMovers) -> String {
    let mut output = String::new();
    output.push_str(&heading("Top Gainers"));
    output.push('\n');
    output.push_str(&mover_table(&movers.gainers).render());
    output.push_str(&heading("Top Losers"));
    output.push('\n');
    output.push_str(&mover_table(&movers.losers).render());
    output
}

fn mover_table(movers: &[Mover]) -> Table {
    let mut table = Table::new(vec!["Symbol", "LTP", "% Chg"]).align_right(&[1, 2]);
    for mover in movers.iter().take(MOVER_ROWS) {
        let sign = if mover.pct_change >= 0.0 { "+" } else { "" };
        table.add_row(vec![
            mover.symbol.clone(),
            format!("{:.2}", mover.ltp),
            format!("{}{:.2}%", sign, mover.pct_change),
        ]);
    }
    table
}
