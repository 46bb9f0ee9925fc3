//! DSFM analysis display models
//!
//! The backend runs the actual models (GARCH, LSTM, FinBERT); these structs
//! only carry the numbers the panel prints.

/// Outcome of one analysis section inside a combined run.
/// The backend reports per-model failures inline rather than failing the
/// whole request, so each section can independently be an error message.
#[derive(Debug, Clone)]
pub enum AnalysisSection<T> {
    Ready(T),
    Failed(String),
}

/// GARCH(1,1) fit summary
#[derive(Debug, Clone)]
pub struct GarchSummary {
    pub symbol: String,
    pub model_type: String,
    pub omega: f64,
    pub alpha: f64,
    pub beta: f64,
    pub current_volatility: f64,
    pub forecast_volatility: Vec<f64>,
    pub aic: Option<f64>,
    pub bic: Option<f64>,
    pub data_points: Option<u64>,
}

/// LSTM forecast summary
#[derive(Debug, Clone)]
pub struct LstmSummary {
    pub symbol: String,
    pub forecast: Vec<f64>,
    pub forecast_dates: Vec<String>,
    pub current_price: f64,
    pub forecast_price: f64,
    pub expected_change_pct: Option<f64>,
    pub mse: Option<f64>,
    pub mae: Option<f64>,
    pub rmse: Option<f64>,
}

/// Per-symbol sentiment row from the FinBERT sweep
#[derive(Debug, Clone)]
pub struct SentimentRow {
    pub symbol: String,
    pub avg_sentiment: f64,
    pub sentiment_label: String,
    pub headline_count: u64,
}

/// Combined analysis: each model section succeeds or fails on its own
#[derive(Debug, Clone)]
pub struct CombinedSummary {
    pub symbol: String,
    pub garch: AnalysisSection<GarchSummary>,
    pub lstm: AnalysisSection<LstmSummary>,
    pub sentiment: AnalysisSection<SentimentRow>,
    pub timestamp: Option<String>,
}
