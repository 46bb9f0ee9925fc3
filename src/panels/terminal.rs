use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use super::{file_slug, heading, start_index_ticker, wait_for_interrupt, PanelContext};
use crate::models::ViewModel;
use crate::services::chart_service::ChartRenderer;
use crate::services::refresh_service::{RefreshConfig, RefreshController};
use crate::services::watchlist_service::{self, WatchlistTabs};
use crate::services::{history_service, quote_service};
use crate::utils::{format_fetch_error, Table};

// The terminal page runs much hotter than the dashboard
const INDEX_INTERVAL: Duration = Duration::from_secs(2);
const STOCKS_INTERVAL: Duration = Duration::from_secs(3);
const CHART_INTERVAL: Duration = Duration::from_secs(5);
const CHART_WIDTH: u32 = 1000;
const CHART_HEIGHT: u32 = 450;

/// Trader terminal: fast index ticker, live stock table and a candlestick
/// chart of the traded symbol. `args`: optional symbol to chart.
pub async fn run(ctx: PanelContext, args: &[String]) -> Result<(), String> {
    info!("🖥 Opening trader terminal against {}", ctx.client.base_url());

    // Pick the charted symbol up front: explicit argument, else the
    // strongest gainer of the day
    let selected = match args.first() {
        Some(symbol) => Some(symbol.trim().to_string()).filter(|s| !s.is_empty()),
        None => match ctx.client.get_market_movers().await {
            Ok(movers) => movers.gainers.first().map(|m| m.symbol.clone()),
            Err(err) => {
                warn!("could not seed terminal symbol: {}", err);
                None
            }
        },
    };

    let ticker = start_index_ticker(&ctx, INDEX_INTERVAL);

    let stocks = {
        let client = Arc::clone(&ctx.client);
        RefreshController::start(
            "terminal-stocks",
            RefreshConfig::every(STOCKS_INTERVAL).with_jitter(Duration::from_millis(300)),
            move || {
                let client = Arc::clone(&client);
                async move { client.get_market_movers().await }
            },
            |movers| {
                let tabs = watchlist_service::tabs_from_movers(&movers);
                println!("{}", heading("Live Stocks"));
                println!("{}", render_stocks(&tabs));
            },
            |err| println!("{}", format_fetch_error(&err)),
        )
    };

    let chart = selected.map(|symbol| {
        println!("Charting {}", symbol);
        let client = Arc::clone(&ctx.client);
        let renderer = ChartRenderer::new();
        let path = ctx.chart_dir.join(format!("terminal_{}.png", file_slug(&symbol)));
        let fetch_symbol = symbol.clone();
        RefreshController::start(
            "terminal-chart",
            RefreshConfig::every(CHART_INTERVAL).with_jitter(Duration::from_millis(500)),
            move || {
                let client = Arc::clone(&client);
                let symbol = fetch_symbol.clone();
                async move { history_service::get_symbol_candles(&client, &symbol).await }
            },
            move |series| {
                let view = ViewModel {
                    series,
                    width: CHART_WIDTH,
                    height: CHART_HEIGHT,
                };
                match renderer.render_to_file(&view, &path) {
                    Ok(()) => println!(
                        "{} chart updated: {} ({} candles)",
                        symbol,
                        path.display(),
                        view.series.len()
                    ),
                    Err(err) => warn!("chart render failed: {}", err),
                }
            },
            |err| println!("{}", format_fetch_error(&err)),
        )
    });

    wait_for_interrupt().await?;

    ticker.cancel();
    stocks.cancel();
    ticker.stopped().await;
    stocks.stopped().await;
    if let Some(chart) = chart {
        chart.cancel();
        chart.stopped().await;
    }
    Ok(())
}

/// The terminal's stock table mixes the day's gainers and losers
fn render_stocks(tabs: &WatchlistTabs) -> String {
    let rows = &tabs.nifty50;
    if rows.is_empty() {
        return "No live stocks".to_string();
    }

    let mut table = Table::new(vec!["Symbol", "Change", "Price"]).align_right(&[1, 2]);
    for entry in rows {
        let direction = if entry.is_positive() { "▲" } else { "▼" };
        table.add_row(vec![
            format!("{} {}", direction, entry.symbol),
            quote_service::format_change(entry.change_abs, entry.change_pct),
            format!("{:.2}", entry.last_price),
        ]);
    }
    table.render()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::dsfm::models::{MarketMovers, Mover};

    #[test]
    fn stock_table_mixes_gainers_and_losers() {
        let movers = MarketMovers {
            gainers: vec![Mover {
                symbol: "UPUP".to_string(),
                ltp: 110.0,
                pct_change: 10.0,
            }],
            losers: vec![Mover {
                symbol: "DOWN".to_string(),
                ltp: 90.0,
                pct_change: -10.0,
            }],
        };
        let tabs = watchlist_service::tabs_from_movers(&movers);
        let rendered = render_stocks(&tabs);
        assert!(rendered.contains("UPUP"));
        assert!(rendered.contains("DOWN"));
    }

    #[test]
    fn empty_market_is_stated_plainly() {
        let tabs = WatchlistTabs::default();
        assert_eq!(render_stocks(&tabs), "No live stocks");
    }
}
