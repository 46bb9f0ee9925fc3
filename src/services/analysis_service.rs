use chrono::{Duration, Utc};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::api::dsfm::models::{FinbertRow, GarchSection, LstmSection};
use crate::api::dsfm::{DsfmClient, FetchError};
use crate::models::{
    AnalysisSection, CombinedSummary, GarchSummary, LstmSummary, PricePoint, SentimentRow, Series,
};
use crate::services::history_service::parse_market_date;

/// Fetch and flatten the GARCH analysis for one symbol
pub async fn garch_summary(client: &DsfmClient, symbol: &str) -> Result<GarchSummary, FetchError> {
    let response = client.get_garch_analysis(symbol).await?;
    Ok(GarchSummary {
        symbol: response
            .actual_symbol
            .unwrap_or_else(|| response.symbol.clone()),
        model_type: response.model_type,
        omega: response.parameters.omega,
        alpha: response.parameters.alpha,
        beta: response.parameters.beta,
        current_volatility: response.current_volatility,
        forecast_volatility: volatility_vec(&response.forecast_volatility),
        aic: response.aic,
        bic: response.bic,
        data_points: response.data_points,
    })
}

/// Fetch and flatten the LSTM forecast for one symbol
pub async fn lstm_summary(client: &DsfmClient, symbol: &str) -> Result<LstmSummary, FetchError> {
    let response = client.get_lstm_analysis(symbol).await?;

    // The backend reports "TensorFlow unavailable" as a 200 with an error
    // field and a flat fallback forecast
    if let Some(error) = response.error {
        return Err(FetchError::Api {
            status: 200,
            message: response.message.unwrap_or(error),
            details: None,
        });
    }

    let current_price = response
        .current_price
        .or_else(|| response.forecast.first().copied())
        .ok_or_else(|| FetchError::DataShape("lstm response carries no prices".to_string()))?;
    let forecast_price = response
        .forecast_price
        .or_else(|| response.forecast.last().copied())
        .ok_or_else(|| FetchError::DataShape("lstm forecast is empty".to_string()))?;

    Ok(LstmSummary {
        symbol: response
            .actual_symbol
            .unwrap_or_else(|| response.symbol.clone()),
        forecast: response.forecast,
        forecast_dates: response.forecast_dates,
        current_price,
        forecast_price,
        expected_change_pct: response.expected_change_pct,
        mse: response.metrics.as_ref().map(|m| m.mse),
        mae: response.metrics.as_ref().map(|m| m.mae),
        rmse: response.metrics.as_ref().map(|m| m.rmse),
    })
}

/// Fetch the FinBERT sweep: analysis backend name plus per-symbol rows
pub async fn finbert_rows(
    client: &DsfmClient,
) -> Result<(String, Vec<SentimentRow>), FetchError> {
    let response = client.get_finbert_analysis().await?;
    let rows = response.results.iter().map(sentiment_row).collect();
    Ok((response.analysis_type, rows))
}

/// Fetch the combined run; each model section succeeds or fails on its own
pub async fn combined_summary(
    client: &DsfmClient,
    symbol: &str,
) -> Result<CombinedSummary, FetchError> {
    let response = client.get_combined_analysis(symbol).await?;
    let symbol_name = response
        .actual_symbol
        .clone()
        .unwrap_or_else(|| response.symbol.clone());

    let garch = section(&response.analyses.garch, |s: GarchSection| GarchSummary {
        symbol: symbol_name.clone(),
        model_type: s.model_type,
        omega: s.parameters.omega,
        alpha: s.parameters.alpha,
        beta: s.parameters.beta,
        current_volatility: s.current_volatility,
        forecast_volatility: volatility_vec(&s.forecast_volatility),
        aic: s.aic,
        bic: s.bic,
        data_points: None,
    });

    let lstm = section(&response.analyses.lstm, |s: LstmSection| LstmSummary {
        symbol: symbol_name.clone(),
        current_price: s.current_price,
        forecast_price: s.forecast_price,
        expected_change_pct: None,
        forecast: s.forecast,
        forecast_dates: Vec::new(),
        mse: None,
        mae: None,
        rmse: None,
    });

    let sentiment = section(&response.analyses.finbert, |row: FinbertRow| {
        sentiment_row(&row)
    });

    Ok(CombinedSummary {
        symbol: symbol_name,
        garch,
        lstm,
        sentiment,
        timestamp: response.timestamp,
    })
}

/// Build a plottable line series out of an LSTM forecast. Missing or
/// unparseable forecast dates fall back to consecutive days from today.
pub fn lstm_forecast_series(summary: &LstmSummary) -> Series {
    let start = Utc::now();
    let points = summary
        .forecast
        .iter()
        .enumerate()
        .map(|(i, &value)| PricePoint {
            timestamp: summary
                .forecast_dates
                .get(i)
                .and_then(|d| parse_market_date(d))
                .unwrap_or(start + Duration::days(i as i64 + 1)),
            value,
        })
        .collect();
    Series::Line(points)
}

fn sentiment_row(row: &FinbertRow) -> SentimentRow {
    SentimentRow {
        symbol: row.symbol.clone(),
        avg_sentiment: row.avg_sentiment,
        sentiment_label: row.sentiment_label.clone(),
        headline_count: row.headline_count,
    }
}

/// Decode one combined-run section, which is either the model payload or an
/// inline `{"error": ...}` object
fn section<S, T, F>(value: &serde_json::Value, build: F) -> AnalysisSection<T>
where
    S: DeserializeOwned,
    F: FnOnce(S) -> T,
{
    if let Some(error) = value.get("error").and_then(|e| e.as_str()) {
        return AnalysisSection::Failed(error.to_string());
    }
    match serde_json::from_value::<S>(value.clone()) {
        Ok(payload) => AnalysisSection::Ready(build(payload)),
        Err(e) => {
            debug!("combined section did not decode: {}", e);
            AnalysisSection::Failed(format!("unexpected section shape: {}", e))
        }
    }
}

/// The backend sends forecast volatility as either a scalar or an array
fn volatility_vec(value: &serde_json::Value) -> Vec<f64> {
    match value {
        serde_json::Value::Array(items) => items.iter().filter_map(|v| v.as_f64()).collect(),
        serde_json::Value::Number(n) => n.as_f64().map(|v| vec![v]).unwrap_or_default(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn volatility_accepts_scalar_and_array() {
        assert_eq!(volatility_vec(&json!([1.0, 2.0, "x"])), vec![1.0, 2.0]);
        assert_eq!(volatility_vec(&json!(0.5)), vec![0.5]);
        assert!(volatility_vec(&json!(null)).is_empty());
    }

    #[test]
    fn error_sections_surface_their_message() {
        let value = json!({"error": "GARCH fitting failed"});
        let decoded: AnalysisSection<GarchSummary> =
            section(&value, |_: GarchSection| unreachable!());
        match decoded {
            AnalysisSection::Failed(message) => assert_eq!(message, "GARCH fitting failed"),
            AnalysisSection::Ready(_) => panic!("expected a failed section"),
        }
    }

    #[test]
    fn well_formed_lstm_section_decodes() {
        let value = json!({
            "forecast": [101.0, 102.0],
            "current_price": 100.0,
            "forecast_price": 102.0
        });
        let decoded: AnalysisSection<(f64, f64)> =
            section(&value, |s: LstmSection| (s.current_price, s.forecast_price));
        match decoded {
            AnalysisSection::Ready((current, forecast)) => {
                assert_eq!(current, 100.0);
                assert_eq!(forecast, 102.0);
            }
            AnalysisSection::Failed(m) => panic!("expected success, got {}", m),
        }
    }

    #[test]
    fn forecast_series_spans_the_whole_forecast() {
        let summary = LstmSummary {
            symbol: "IT_WIPRO".to_string(),
            forecast: vec![100.0, 101.0, 99.5],
            forecast_dates: vec!["2024-05-01".to_string(), "2024-05-02".to_string()],
            current_price: 100.0,
            forecast_price: 99.5,
            expected_change_pct: Some(-0.5),
            mse: None,
            mae: None,
            rmse: None,
        };
        let series = lstm_forecast_series(&summary);
        assert_eq!(series.len(), 3);
    }
}
