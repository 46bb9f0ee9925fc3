use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use super::{heading, start_index_ticker, wait_for_interrupt, PanelContext};
use crate::fallback;
use crate::models::{HoldingRow, PortfolioSummary, ViewModel};
use crate::services::chart_service::ChartRenderer;
use crate::services::refresh_service::{RefreshConfig, RefreshController};
use crate::services::{history_service, portfolio_service};
use crate::utils::{format_fetch_error, Page, Table};

const INDEX_INTERVAL: Duration = Duration::from_secs(10);
const TABLE_INTERVAL: Duration = Duration::from_secs(30);
const CHART_INTERVAL: Duration = Duration::from_secs(60);
const HOLDINGS_PER_PAGE: usize = 20;
const CHART_WIDTH: u32 = 900;
const CHART_HEIGHT: u32 = 400;

/// Portfolio page: holdings table with totals plus the index performance
/// line chart
pub async fn run(ctx: PanelContext) -> Result<(), String> {
    info!("💼 Opening portfolio against {}", ctx.client.base_url());

    let ticker = start_index_ticker(&ctx, INDEX_INTERVAL);

    let holdings = {
        let client = Arc::clone(&ctx.client);
        RefreshController::start(
            "portfolio-holdings",
            RefreshConfig::every(TABLE_INTERVAL).with_jitter(Duration::from_secs(1)),
            move || {
                let client = Arc::clone(&client);
                async move { portfolio_service::get_portfolio(&client).await }
            },
            |(rows, summary)| {
                println!("{}", heading("Holdings"));
                println!("{}", render_holdings(&rows));
                println!("{}", render_summary(&summary));
            },
            |err| println!("{}", format_fetch_error(&err)),
        )
    };

    let chart = {
        let client = Arc::clone(&ctx.client);
        let renderer = ChartRenderer::new().with_fill(true);
        let path = ctx.chart_dir.join("portfolio_nifty.png");
        RefreshController::start(
            "portfolio-chart",
            RefreshConfig::every(CHART_INTERVAL).with_jitter(Duration::from_secs(2)),
            move || {
                let client = Arc::clone(&client);
                async move { history_service::get_index_history(&client).await }
            },
            move |series| {
                // The backend may legitimately return an empty history;
                // the renderer paints a blank frame for it
                let view = ViewModel {
                    series,
                    width: CHART_WIDTH,
                    height: CHART_HEIGHT,
                };
                match renderer.render_to_file(&view, &path) {
                    Ok(()) => println!(
                        "Performance chart updated: {} ({} points)",
                        path.display(),
                        view.series.len()
                    ),
                    Err(err) => warn!("chart render failed: {}", err),
                }
            },
            {
                let renderer = ChartRenderer::new().with_fill(true);
                let path = ctx.chart_dir.join("portfolio_nifty.png");
                move |err| {
                    if err.is_connection() {
                        let view = ViewModel {
                            series: fallback::history(),
                            width: CHART_WIDTH,
                            height: CHART_HEIGHT,
                        };
                        if renderer.render_to_file(&view, &path).is_ok() {
                            println!("Offline: fallback chart written to {}", path.display());
                        }
                    } else {
                        println!("{}", format_fetch_error(&err));
                    }
                }
            },
        )
    };

    wait_for_interrupt().await?;

    ticker.cancel();
    holdings.cancel();
    chart.cancel();
    ticker.stopped().await;
    holdings.stopped().await;
    chart.stopped().await;
    Ok(())
}

/// First page of the holdings table with a page note when it overflows
fn render_holdings(rows: &[HoldingRow]) -> String {
    if rows.is_empty() {
        return "No holdings".to_string();
    }

    let page = Page::new(rows.to_vec(), HOLDINGS_PER_PAGE);
    let mut table = Table::new(vec![
        "Symbol", "Qty", "Avg Cost", "LTP", "Invested", "Current", "P&L", "P&L %", "Today",
    ])
    .align_right(&[1, 2, 3, 4, 5, 6, 7, 8]);

    for row in page.current_rows() {
        table.add_row(vec![
            row.symbol.clone(),
            format!("{:.0}", row.quantity),
            format!("{:.2}", row.avg_cost),
            format!("{:.2}", row.ltp),
            format!("{:.2}", row.invested),
            format!("{:.2}", row.current_value),
            format!("{:+.2}", row.profit_loss),
            format!("{:+.2}%", row.profit_loss_pct),
            format!("{:+.2}", row.today_pl),
        ]);
    }

    let mut output = table.render();
    if page.total_pages() > 1 {
        output.push_str(&format!(
            "(showing page 1 of {}, {} holdings total)\n",
            page.total_pages(),
            rows.len()
        ));
    }
    output
}

fn render_summary(summary: &PortfolioSummary) -> String {
    format!(
        "Invested {:.2} | Current {:.2} | P&L {:+.2} | Today {:+.2}{}",
        summary.total_invested,
        summary.total_current_value,
        summary.total_profit_loss,
        summary.total_today_pl,
        summary
            .date
            .as_deref()
            .map(|d| format!(" | As of {}", d))
            .unwrap_or_default()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(symbol: &str) -> HoldingRow {
        HoldingRow {
            symbol: symbol.to_string(),
            quantity: 1.0,
            avg_cost: 100.0,
            ltp: 110.0,
            invested: 100.0,
            current_value: 110.0,
            profit_loss: 10.0,
            profit_loss_pct: 10.0,
            today_pl: 1.5,
        }
    }

    #[test]
    fn holdings_overflow_gets_a_page_note() {
        let rows: Vec<HoldingRow> = (0..25).map(|i| row(&format!("S{}", i))).collect();
        let rendered = render_holdings(&rows);
        assert!(rendered.contains("S0"));
        assert!(rendered.contains("S19"));
        assert!(!rendered.contains("S20 "));
        assert!(rendered.contains("page 1 of 2"));
    }

    #[test]
    fn summary_line_shows_all_totals() {
        let summary = PortfolioSummary {
            total_invested: 1000.0,
            total_current_value: 1100.0,
            total_profit_loss: 100.0,
            total_today_pl: -5.0,
            date: Some("01-08-2026".to_string()),
        };
        let rendered = render_summary(&summary);
        assert!(rendered.contains("Invested 1000.00"));
        assert!(rendered.contains("P&L +100.00"));
        assert!(rendered.contains("Today -5.00"));
        assert!(rendered.contains("As of 01-08-2026"));
    }

    #[test]
    fn empty_portfolio_is_stated_plainly() {
        assert_eq!(render_holdings(&[]), "No holdings");
    }
}
