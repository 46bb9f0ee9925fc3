use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{file_slug, heading, start_index_ticker, wait_for_interrupt, PanelContext};
use crate::fallback;
use crate::models::{ViewModel, WatchlistEntry, WatchlistTab};
use crate::services::chart_service::ChartRenderer;
use crate::services::refresh_service::{RefreshConfig, RefreshController};
use crate::services::watchlist_service::{self, WatchlistTabs};
use crate::services::{history_service, quote_service};
use crate::utils::{connection_banner, format_fetch_error, Table};

const INDEX_INTERVAL: Duration = Duration::from_secs(10);
const QUOTES_INTERVAL: Duration = Duration::from_secs(30);
const CHART_INTERVAL: Duration = Duration::from_secs(60);
const CHART_WIDTH: u32 = 800;
const CHART_HEIGHT: u32 = 400;

/// Watchlist page: tabbed symbol table with live quotes and a candlestick
/// chart of the selected symbol.
///
/// `args`: optional tab name (`mystocks`/`nifty50`) and search query. A
/// query of two or more characters also picks the charted symbol, matching
/// the page's search behavior.
pub async fn run(ctx: PanelContext, args: &[String]) -> Result<(), String> {
    let tab = args
        .first()
        .and_then(|a| WatchlistTab::parse(a))
        .unwrap_or(WatchlistTab::MyStocks);
    let query = args.get(1).cloned().unwrap_or_default();

    info!(
        "📋 Opening watchlist ({} tab) against {}",
        tab.as_str(),
        ctx.client.base_url()
    );

    let tabs = match ctx.client.get_market_movers().await {
        Ok(movers) => watchlist_service::tabs_from_movers(&movers),
        Err(err) if err.is_connection() => {
            println!("{}", connection_banner(ctx.client.base_url()));
            WatchlistTabs {
                mystocks: fallback::watchlist(),
                nifty50: fallback::watchlist(),
            }
        }
        Err(err) => return Err(format_fetch_error(&err)),
    };

    let entries = tabs.entries(tab).to_vec();
    println!("{}", heading(&format!("Watchlist ({})", tab.as_str())));
    println!("{}", render_watchlist(&entries, &query));

    let selected = select_symbol(&entries, &query);
    let symbols = tabs.symbols();

    let ticker = start_index_ticker(&ctx, INDEX_INTERVAL);

    let quotes = {
        let client = Arc::clone(&ctx.client);
        let tab_title = format!("Watchlist ({})", tab.as_str());
        let query = query.clone();
        RefreshController::start(
            "watchlist-quotes",
            RefreshConfig::every(QUOTES_INTERVAL).with_jitter(Duration::from_secs(1)),
            move || {
                let client = Arc::clone(&client);
                let symbols = symbols.clone();
                async move {
                    let mut quotes = Vec::with_capacity(symbols.len());
                    for symbol in &symbols {
                        match quote_service::get_stock_quote(&client, symbol).await {
                            Ok(quote) => quotes.push(quote),
                            // Losing the backend aborts the tick; a single
                            // unknown symbol does not
                            Err(err) if err.is_connection() => return Err(err),
                            Err(err) => debug!("quote refresh skipped {}: {}", symbol, err),
                        }
                    }
                    Ok(quotes)
                }
            },
            move |quotes| {
                let entries: Vec<WatchlistEntry> = quotes
                    .iter()
                    .map(watchlist_service::entry_from_quote)
                    .collect();
                println!("{}", heading(&tab_title));
                println!("{}", render_watchlist(&entries, &query));
            },
            |err| println!("{}", format_fetch_error(&err)),
        )
    };

    let chart = selected.map(|symbol| {
        println!("Charting {}", symbol);
        let client = Arc::clone(&ctx.client);
        let renderer = ChartRenderer::new();
        let path = ctx.chart_dir.join(format!("watchlist_{}.png", file_slug(&symbol)));
        let fetch_symbol = symbol.clone();
        RefreshController::start(
            "watchlist-chart",
            RefreshConfig::every(CHART_INTERVAL).with_jitter(Duration::from_secs(2)),
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
    quotes.cancel();
    ticker.stopped().await;
    quotes.stopped().await;
    if let Some(chart) = chart {
        chart.cancel();
        chart.stopped().await;
    }
    Ok(())
}

/// Watchlist rows as a text table, filtered by the search query
fn render_watchlist(entries: &[WatchlistEntry], query: &str) -> String {
    let rows = watchlist_service::filter_entries(entries, query);
    if rows.is_empty() {
        return "No stocks in this watchlist".to_string();
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

/// Pick the charted symbol: a search query of two or more characters wins,
/// otherwise the first row of the tab
fn select_symbol(entries: &[WatchlistEntry], query: &str) -> Option<String> {
    let query = query.trim();
    if query.len() >= 2 {
        let lower = query.to_lowercase();
        if let Some(hit) = entries
            .iter()
            .find(|e| e.symbol.to_lowercase().contains(&lower))
        {
            return Some(hit.symbol.clone());
        }
    }
    entries.first().map(|e| e.symbol.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(symbol: &str, price: f64, change: f64) -> WatchlistEntry {
        WatchlistEntry {
            symbol: symbol.to_string(),
            last_price: price,
            change_abs: change,
            change_pct: change / (price - change) * 100.0,
        }
    }

    #[test]
    fn empty_watchlist_shows_the_empty_state() {
        assert_eq!(render_watchlist(&[], ""), "No stocks in this watchlist");
        let entries = vec![entry("RELIANCE", 2940.0, 12.0)];
        assert_eq!(render_watchlist(&entries, "zzz"), "No stocks in this watchlist");
    }

    #[test]
    fn rows_carry_signed_change_and_price() {
        let entries = vec![entry("RELIANCE", 2940.0, 12.0), entry("WIPRO", 480.0, -3.0)];
        let rendered = render_watchlist(&entries, "");
        assert!(rendered.contains("RELIANCE"));
        assert!(rendered.contains("+12.00"));
        assert!(rendered.contains("-3.00"));
        assert!(rendered.contains("2940.00"));
    }

    #[test]
    fn search_query_picks_the_charted_symbol() {
        let entries = vec![entry("HDFCBANK", 1650.0, 5.0), entry("WIPRO", 480.0, -3.0)];
        assert_eq!(select_symbol(&entries, "wip"), Some("WIPRO".to_string()));
        // Short or missing queries fall back to the first row
        assert_eq!(select_symbol(&entries, "w"), Some("HDFCBANK".to_string()));
        assert_eq!(select_symbol(&entries, ""), Some("HDFCBANK".to_string()));
        assert_eq!(select_symbol(&[], ""), None);
    }
}
