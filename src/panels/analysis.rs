use tracing::{info, warn};

use super::{file_slug, heading, PanelContext};
use crate::api::dsfm::models::{DecisionResponse, ForecastResponse, SymbolInfo};
use crate::fallback;
use crate::models::{
    AnalysisSection, CombinedSummary, GarchSummary, LstmSummary, SentimentRow, ViewModel,
};
use crate::services::analysis_service;
use crate::services::chart_service::ChartRenderer;
use crate::utils::{connection_banner, format_fetch_error, Table};

const CHART_WIDTH: u32 = 800;
const CHART_HEIGHT: u32 = 360;

/// DSFM stock-analysis panel. Runs the whole suite once for one symbol:
/// combined, GARCH, LSTM (with a forecast chart) and the FinBERT sweep.
/// Without a symbol argument it lists what the backend can analyze.
pub async fn run(ctx: PanelContext, args: &[String]) -> Result<(), String> {
    info!("🧠 Opening DSFM analysis against {}", ctx.client.base_url());

    let symbols = match ctx.client.get_available_symbols().await {
        Ok(response) => response.symbols,
        Err(err) if err.is_connection() => {
            println!("{}", connection_banner(ctx.client.base_url()));
            println!("Using the fallback symbol list; analysis needs the backend running.");
            fallback::FALLBACK_SYMBOLS.clone()
        }
        Err(err) => return Err(format_fetch_error(&err)),
    };

    let symbol = match resolve_symbol(&symbols, args.first().map(String::as_str)) {
        Some(symbol) => symbol,
        None => {
            println!("{}", heading("Available Symbols"));
            println!("{}", render_symbols(&symbols));
            show_top_stocks(&ctx).await;
            println!("Run again with one of the symbols above to analyze it.");
            return Ok(());
        }
    };

    println!("{}", heading(&format!("DSFM Analysis - {}", symbol)));

    match ctx.client.get_decision(&symbol).await {
        Ok(decision) => println!("{}", render_decision(&decision)),
        Err(err) => println!("Decision: {}", format_fetch_error(&err)),
    }

    match ctx.client.get_forecast(&symbol).await {
        Ok(forecast) => println!("{}", render_forecast(&forecast)),
        Err(err) => println!("Forecast: {}", format_fetch_error(&err)),
    }

    match ctx.client.get_sentiment(&symbol).await {
        Ok(sentiment) => {
            let headlines = sentiment.news.as_array().map(|n| n.len()).unwrap_or(0);
            println!(
                "Headline sentiment: {} ({:+.3}) from {} stories",
                sentiment.label, sentiment.score, headlines
            );
        }
        Err(err) => println!("Sentiment: {}", format_fetch_error(&err)),
    }

    match analysis_service::combined_summary(&ctx.client, &symbol).await {
        Ok(summary) => println!("{}", render_combined(&summary)),
        Err(err) => println!("Combined analysis: {}", format_fetch_error(&err)),
    }

    match analysis_service::garch_summary(&ctx.client, &symbol).await {
        Ok(summary) => println!("{}", render_garch(&summary)),
        Err(err) => println!("GARCH: {}", format_fetch_error(&err)),
    }

    match analysis_service::lstm_summary(&ctx.client, &symbol).await {
        Ok(summary) => {
            println!("{}", render_lstm(&summary));
            let view = ViewModel {
                series: analysis_service::lstm_forecast_series(&summary),
                width: CHART_WIDTH,
                height: CHART_HEIGHT,
            };
            let path = ctx
                .chart_dir
                .join(format!("analysis_{}_lstm.png", file_slug(&symbol)));
            let renderer = ChartRenderer::new().with_fill(true);
            match renderer.render_to_file(&view, &path) {
                Ok(()) => println!("Forecast chart written to {}", path.display()),
                Err(err) => warn!("forecast chart failed: {}", err),
            }
        }
        Err(err) => println!("LSTM: {}", format_fetch_error(&err)),
    }

    match analysis_service::finbert_rows(&ctx.client).await {
        Ok((analysis_type, rows)) => {
            println!("{}", heading(&format!("News Sentiment ({})", analysis_type)));
            println!("{}", render_sentiment(&rows));
        }
        Err(err) => println!("Sentiment: {}", format_fetch_error(&err)),
    }

    Ok(())
}

/// One-shot risk ranking shown next to the symbol list
async fn show_top_stocks(ctx: &PanelContext) {
    match ctx.client.get_top_stocks().await {
        Ok(ranking) => {
            println!("{}", heading("DSFM Top Stocks"));
            for row in &ranking.top_5 {
                println!("  {}", row);
            }
            println!("  ({} symbols ranked in total)", ranking.all_ranked.len());
        }
        Err(err) => warn!("top stocks unavailable: {}", err),
    }
}

fn render_decision(decision: &DecisionResponse) -> String {
    format!(
        "Signal for {}: {} (forecast {}, sentiment {} {:+.2}) over {} history points",
        decision.symbol,
        decision.signal,
        decision.forecast_direction,
        decision.sentiment_label,
        decision.sentiment_score,
        decision.history.len()
    )
}

/// Horizon prices of the three forecast models
fn render_forecast(forecast: &ForecastResponse) -> String {
    let mut table = Table::new(vec!["Model", "Horizon Price"]).align_right(&[1]);
    for (model, path) in [
        ("ARIMA", &forecast.forecast_arima),
        ("SARIMA", &forecast.forecast_sarima),
        ("GARCH", &forecast.forecast_garch),
    ] {
        if let Some(last) = path.last() {
            table.add_row(vec![model.to_string(), format!("{:.2}", last.price)]);
        }
    }
    if table.is_empty() {
        return format!(
            "{} forecast direction: {}",
            forecast.symbol, forecast.forecast_direction
        );
    }
    format!(
        "{} forecast direction: {}\n{}",
        forecast.symbol,
        forecast.forecast_direction,
        table.render()
    )
}

/// Match the requested symbol against the backend's list: exact value,
/// exact display name, then substring, all case-insensitive
fn resolve_symbol(symbols: &[SymbolInfo], requested: Option<&str>) -> Option<String> {
    let requested = requested?.trim();
    if requested.is_empty() {
        return None;
    }
    let lower = requested.to_lowercase();

    symbols
        .iter()
        .find(|s| s.value.to_lowercase() == lower || s.display.to_lowercase() == lower)
        .or_else(|| {
            symbols.iter().find(|s| {
                s.value.to_lowercase().contains(&lower) || s.display.to_lowercase().contains(&lower)
            })
        })
        .map(|s| s.value.clone())
        // An unlisted symbol is still worth sending; the backend resolves
        // naming variants on its own
        .or_else(|| Some(requested.to_string()))
}

fn render_symbols(symbols: &[SymbolInfo]) -> String {
    if symbols.is_empty() {
        return "No symbols available".to_string();
    }
    let mut table = Table::new(vec!["Symbol", "Series"]);
    for s in symbols {
        table.add_row(vec![s.display.clone(), s.value.clone()]);
    }
    table.render()
}

fn render_combined(summary: &CombinedSummary) -> String {
    let mut output = String::new();
    output.push_str(&format!("Combined verdict for {}\n", summary.symbol));

    match &summary.garch {
        AnalysisSection::Ready(g) => output.push_str(&format!(
            "  {}: current volatility {:.4}, {} forecast points\n",
            g.model_type,
            g.current_volatility,
            g.forecast_volatility.len()
        )),
        AnalysisSection::Failed(message) => output.push_str(&format!("  GARCH failed: {}\n", message)),
    }

    match &summary.lstm {
        AnalysisSection::Ready(l) => output.push_str(&format!(
            "  LSTM: {:.2} now, {:.2} at horizon\n",
            l.current_price, l.forecast_price
        )),
        AnalysisSection::Failed(message) => output.push_str(&format!("  LSTM failed: {}\n", message)),
    }

    match &summary.sentiment {
        AnalysisSection::Ready(s) => output.push_str(&format!(
            "  Sentiment: {} ({:+.3}) from {} headlines\n",
            s.sentiment_label, s.avg_sentiment, s.headline_count
        )),
        AnalysisSection::Failed(message) => {
            output.push_str(&format!("  Sentiment failed: {}\n", message))
        }
    }

    if let Some(timestamp) = &summary.timestamp {
        output.push_str(&format!("  As of {}\n", timestamp));
    }
    output
}

fn render_garch(summary: &GarchSummary) -> String {
    let mut output = format!(
        "{} fit for {}\n  omega {:.6}  alpha {:.4}  beta {:.4}\n  current volatility {:.4}\n",
        summary.model_type, summary.symbol, summary.omega, summary.alpha, summary.beta,
        summary.current_volatility
    );
    if let (Some(aic), Some(bic)) = (summary.aic, summary.bic) {
        output.push_str(&format!("  AIC {:.1}  BIC {:.1}\n", aic, bic));
    }
    if let Some(points) = summary.data_points {
        output.push_str(&format!("  fitted on {} data points\n", points));
    }
    if let Some(next) = summary.forecast_volatility.first() {
        output.push_str(&format!("  next-step volatility forecast {:.4}\n", next));
    }
    output
}

fn render_lstm(summary: &LstmSummary) -> String {
    let mut output = format!(
        "LSTM forecast for {}\n  {:.2} now, {:.2} after {} steps",
        summary.symbol,
        summary.current_price,
        summary.forecast_price,
        summary.forecast.len()
    );
    if let Some(pct) = summary.expected_change_pct {
        output.push_str(&format!(" ({:+.2}%)", pct));
    }
    output.push('\n');
    if let (Some(mse), Some(mae), Some(rmse)) = (summary.mse, summary.mae, summary.rmse) {
        output.push_str(&format!("  training MSE {:.2}  MAE {:.2}  RMSE {:.2}\n", mse, mae, rmse));
    }
    output
}

fn render_sentiment(rows: &[SentimentRow]) -> String {
    if rows.is_empty() {
        return "No sentiment data available".to_string();
    }
    let mut table = Table::new(vec!["Symbol", "Label", "Score", "Headlines"]).align_right(&[2, 3]);
    for row in rows {
        table.add_row(vec![
            row.symbol.clone(),
            row.sentiment_label.clone(),
            format!("{:+.3}", row.avg_sentiment),
            row.headline_count.to_string(),
        ]);
    }
    table.render()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbols() -> Vec<SymbolInfo> {
        vec![
            SymbolInfo {
                value: "IT_WIPRO".to_string(),
                display: "WIPRO".to_string(),
            },
            SymbolInfo {
                value: "FIN_HDFCBANK".to_string(),
                display: "HDFCBANK".to_string(),
            },
        ]
    }

    #[test]
    fn symbols_resolve_by_display_value_or_substring() {
        let list = symbols();
        assert_eq!(resolve_symbol(&list, Some("wipro")), Some("IT_WIPRO".to_string()));
        assert_eq!(resolve_symbol(&list, Some("IT_WIPRO")), Some("IT_WIPRO".to_string()));
        assert_eq!(resolve_symbol(&list, Some("hdfc")), Some("FIN_HDFCBANK".to_string()));
        // Unknown symbols pass through for the backend to resolve
        assert_eq!(resolve_symbol(&list, Some("TCS")), Some("TCS".to_string()));
        assert_eq!(resolve_symbol(&list, None), None);
        assert_eq!(resolve_symbol(&list, Some("  ")), None);
    }

    #[test]
    fn failed_sections_render_their_messages() {
        let summary = CombinedSummary {
            symbol: "IT_WIPRO".to_string(),
            garch: AnalysisSection::Failed("Insufficient data".to_string()),
            lstm: AnalysisSection::Ready(LstmSummary {
                symbol: "IT_WIPRO".to_string(),
                forecast: vec![100.0, 101.0],
                forecast_dates: Vec::new(),
                current_price: 100.0,
                forecast_price: 101.0,
                expected_change_pct: None,
                mse: None,
                mae: None,
                rmse: None,
            }),
            sentiment: AnalysisSection::Failed("No sentiment data".to_string()),
            timestamp: Some("2026-08-05 10:00:00".to_string()),
        };
        let rendered = render_combined(&summary);
        assert!(rendered.contains("GARCH failed: Insufficient data"));
        assert!(rendered.contains("LSTM: 100.00 now, 101.00 at horizon"));
        assert!(rendered.contains("Sentiment failed"));
        assert!(rendered.contains("As of 2026-08-05"));
    }

    #[test]
    fn decision_line_folds_signal_and_inputs() {
        let decision = DecisionResponse {
            symbol: "IT_WIPRO".to_string(),
            signal: "BUY".to_string(),
            forecast_direction: "UP".to_string(),
            sentiment_label: "POSITIVE".to_string(),
            sentiment_score: 0.42,
            history: Vec::new(),
        };
        let rendered = render_decision(&decision);
        assert!(rendered.contains("Signal for IT_WIPRO: BUY"));
        assert!(rendered.contains("forecast UP"));
        assert!(rendered.contains("POSITIVE +0.42"));
    }

    #[test]
    fn forecast_table_shows_each_model_horizon() {
        use crate::api::dsfm::models::DatedPrice;
        let point = |price| DatedPrice {
            date: "2026-09-01".to_string(),
            price,
        };
        let forecast = ForecastResponse {
            symbol: "IT_WIPRO".to_string(),
            forecast_direction: "UP".to_string(),
            forecast_arima: vec![point(101.0), point(105.5)],
            forecast_sarima: vec![point(104.0)],
            forecast_garch: Vec::new(),
        };
        let rendered = render_forecast(&forecast);
        assert!(rendered.contains("IT_WIPRO forecast direction: UP"));
        assert!(rendered.contains("ARIMA"));
        assert!(rendered.contains("105.50"));
        assert!(rendered.contains("SARIMA"));
        // No GARCH row: that model returned an empty path
        assert!(!rendered.lines().any(|l| l.starts_with("GARCH")));
    }

    #[test]
    fn garch_rendering_includes_the_parameters() {
        let summary = GarchSummary {
            symbol: "IT_WIPRO".to_string(),
            model_type: "GARCH(1,1)".to_string(),
            omega: 0.000012,
            alpha: 0.08,
            beta: 0.9,
            current_volatility: 0.0123,
            forecast_volatility: vec![0.014, 0.015],
            aic: Some(-4200.0),
            bic: Some(-4180.0),
            data_points: Some(1200),
        };
        let rendered = render_garch(&summary);
        assert!(rendered.contains("GARCH(1,1)"));
        assert!(rendered.contains("alpha 0.0800"));
        assert!(rendered.contains("beta 0.9000"));
        assert!(rendered.contains("1200 data points"));
        assert!(rendered.contains("next-step volatility forecast 0.0140"));
    }
}
