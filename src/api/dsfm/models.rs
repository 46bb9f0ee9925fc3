use serde::Deserialize;
use thiserror::Error;

/// Error taxonomy for every backend fetch.
///
/// Classification is structural (reqwest predicates and HTTP status), never
/// based on matching error message text.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The endpoint is unreachable at the network level
    #[error("backend unreachable: {0}")]
    Connection(String),
    /// The endpoint responded with a non-success status
    #[error("api error ({status}): {message}")]
    Api {
        status: u16,
        message: String,
        details: Option<serde_json::Value>,
    },
    /// The response parsed, but expected fields are missing or mistyped
    #[error("unexpected response shape: {0}")]
    DataShape(String),
}

impl FetchError {
    /// Classify a transport-layer error from reqwest
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_decode() {
            FetchError::DataShape(err.to_string())
        } else {
            // Connect failures, timeouts and request build errors all mean
            // the backend could not be reached
            FetchError::Connection(err.to_string())
        }
    }

    pub fn is_connection(&self) -> bool {
        matches!(self, FetchError::Connection(_))
    }
}

/// Error body the backend attaches to non-2xx responses
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub error: Option<String>,
    pub message: Option<String>,
    pub details: Option<serde_json::Value>,
}

/// Response from GET /api/nifty
#[derive(Debug, Clone, Deserialize)]
pub struct IndexSnapshot {
    pub nifty_value: f64,
    pub change_pct: f64,
}

/// Response from GET /api/stock/{symbol}
#[derive(Debug, Clone, Deserialize)]
pub struct StockSnapshot {
    pub symbol: String,
    pub latest_value: f64,
    pub change: f64,
    pub change_pct: f64,
}

/// One gainer/loser row
#[derive(Debug, Clone, Deserialize)]
pub struct Mover {
    pub symbol: String,
    pub ltp: f64,
    pub pct_change: f64,
}

/// Response from GET /api/market-movers
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MarketMovers {
    #[serde(default)]
    pub gainers: Vec<Mover>,
    #[serde(default)]
    pub losers: Vec<Mover>,
}

/// One holding row from GET /api/portfolio
#[derive(Debug, Clone, Deserialize)]
pub struct HoldingEntry {
    pub symbol: String,
    pub quantity: f64,
    pub avg_cost: f64,
    pub ltp: f64,
    pub invested: f64,
    pub current_value: f64,
    pub profit_loss: f64,
    pub profit_loss_pct: f64,
    pub today_pl: f64,
}

/// Portfolio totals block; the backend sends `{}` when it has no data,
/// so every field is optional
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PortfolioTotals {
    pub total_invested: Option<f64>,
    pub total_current_value: Option<f64>,
    pub total_profit_loss: Option<f64>,
    pub total_today_pl: Option<f64>,
    pub date: Option<String>,
}

/// Response from GET /api/portfolio
#[derive(Debug, Clone, Deserialize)]
pub struct PortfolioResponse {
    #[serde(default)]
    pub holdings: Vec<HoldingEntry>,
    #[serde(default)]
    pub totals: PortfolioTotals,
}

/// One row of GET /api/nifty/history
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryRow {
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "NIFTY")]
    pub nifty: f64,
}

/// One dated forecast/history price from the DSFM endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct DatedPrice {
    pub date: String,
    pub price: f64,
}

/// Response from GET /api/dsfm/forecast/{symbol}
#[derive(Debug, Clone, Deserialize)]
pub struct ForecastResponse {
    pub symbol: String,
    pub forecast_direction: String,
    #[serde(default)]
    pub forecast_arima: Vec<DatedPrice>,
    #[serde(default)]
    pub forecast_sarima: Vec<DatedPrice>,
    #[serde(default)]
    pub forecast_garch: Vec<DatedPrice>,
}

/// Response from GET /api/dsfm/sentiment/{symbol}
#[derive(Debug, Clone, Deserialize)]
pub struct SentimentResponse {
    pub label: String,
    pub score: f64,
    #[serde(default)]
    pub news: serde_json::Value,
}

/// Response from GET /api/dsfm/decision/{symbol}
#[derive(Debug, Clone, Deserialize)]
pub struct DecisionResponse {
    pub symbol: String,
    pub signal: String,
    pub forecast_direction: String,
    pub sentiment_label: String,
    pub sentiment_score: f64,
    #[serde(default)]
    pub history: Vec<DatedPrice>,
}

/// Response from GET /api/dsfm/top-stocks; ranking rows are model-specific
/// blobs rendered verbatim
#[derive(Debug, Clone, Deserialize)]
pub struct TopStocksResponse {
    #[serde(default)]
    pub top_5: Vec<serde_json::Value>,
    #[serde(default)]
    pub all_ranked: Vec<serde_json::Value>,
}

/// Response from GET /api/most-bought
#[derive(Debug, Clone, Deserialize)]
pub struct MostBoughtResponse {
    pub most_bought: Option<serde_json::Value>,
}

/// GARCH parameter block; the backend names the keys after the arch package
#[derive(Debug, Clone, Deserialize)]
pub struct GarchParameters {
    pub omega: f64,
    #[serde(rename = "alpha[1]")]
    pub alpha: f64,
    #[serde(rename = "beta[1]")]
    pub beta: f64,
}

/// Response from GET /api/dsfm/garch-analysis/{symbol}
#[derive(Debug, Clone, Deserialize)]
pub struct GarchAnalysisResponse {
    pub symbol: String,
    pub actual_symbol: Option<String>,
    pub model_type: String,
    pub parameters: GarchParameters,
    pub current_volatility: f64,
    /// Scalar or array depending on the backend's forecast path
    #[serde(default)]
    pub forecast_volatility: serde_json::Value,
    pub aic: Option<f64>,
    pub bic: Option<f64>,
    pub data_points: Option<u64>,
}

/// One per-symbol row of the FinBERT sweep
#[derive(Debug, Clone, Deserialize)]
pub struct FinbertRow {
    pub symbol: String,
    pub avg_sentiment: f64,
    pub sentiment_label: String,
    pub headline_count: u64,
}

/// Response from GET /api/dsfm/finbert-analysis
#[derive(Debug, Clone, Deserialize)]
pub struct FinbertAnalysisResponse {
    pub analysis_type: String,
    #[serde(default)]
    pub results: Vec<FinbertRow>,
}

/// LSTM training metrics
#[derive(Debug, Clone, Deserialize)]
pub struct LstmMetrics {
    pub mse: f64,
    pub mae: f64,
    pub rmse: f64,
}

/// Response from GET /api/dsfm/lstm-analysis/{symbol}.
/// When TensorFlow is unavailable the backend still answers 200 with an
/// `error` field and a flat fallback forecast.
#[derive(Debug, Clone, Deserialize)]
pub struct LstmAnalysisResponse {
    pub symbol: String,
    pub actual_symbol: Option<String>,
    #[serde(default)]
    pub forecast: Vec<f64>,
    #[serde(default)]
    pub forecast_dates: Vec<String>,
    pub metrics: Option<LstmMetrics>,
    pub current_price: Option<f64>,
    pub forecast_price: Option<f64>,
    pub expected_change_pct: Option<f64>,
    pub error: Option<String>,
    pub message: Option<String>,
}

/// GARCH block inside a combined run (no symbol fields of its own)
#[derive(Debug, Clone, Deserialize)]
pub struct GarchSection {
    pub model_type: String,
    pub current_volatility: f64,
    #[serde(default)]
    pub forecast_volatility: serde_json::Value,
    pub parameters: GarchParameters,
    pub aic: Option<f64>,
    pub bic: Option<f64>,
}

/// LSTM block inside a combined run
#[derive(Debug, Clone, Deserialize)]
pub struct LstmSection {
    #[serde(default)]
    pub forecast: Vec<f64>,
    pub current_price: f64,
    pub forecast_price: f64,
}

/// Per-model sections of the combined run; each may itself carry an
/// `{"error": ...}` object, so they stay untyped until display
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CombinedAnalyses {
    #[serde(default)]
    pub garch: serde_json::Value,
    #[serde(default)]
    pub lstm: serde_json::Value,
    #[serde(default)]
    pub finbert: serde_json::Value,
}

/// Response from GET /api/dsfm/combined-analysis/{symbol}
#[derive(Debug, Clone, Deserialize)]
pub struct CombinedAnalysisResponse {
    pub symbol: String,
    pub actual_symbol: Option<String>,
    #[serde(default)]
    pub analyses: CombinedAnalyses,
    pub timestamp: Option<String>,
}

/// One selectable symbol from GET /api/dsfm/available-symbols
#[derive(Debug, Clone, Deserialize)]
pub struct SymbolInfo {
    pub value: String,
    pub display: String,
}

/// Response from GET /api/dsfm/available-symbols
#[derive(Debug, Clone, Deserialize)]
pub struct AvailableSymbolsResponse {
    #[serde(default)]
    pub symbols: Vec<SymbolInfo>,
}
