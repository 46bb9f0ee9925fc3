use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::models::{
    AvailableSymbolsResponse, CombinedAnalysisResponse, DecisionResponse, ErrorBody, FetchError,
    FinbertAnalysisResponse, ForecastResponse, GarchAnalysisResponse, HistoryRow, IndexSnapshot,
    LstmAnalysisResponse, MarketMovers, MostBoughtResponse, PortfolioResponse, SentimentResponse,
    StockSnapshot, TopStocksResponse,
};

/// DSFM backend API client. All endpoints are read-only GETs returning JSON.
pub struct DsfmClient {
    http_client: HttpClient,
    base_url: String,
}

impl DsfmClient {
    const DEFAULT_BASE_URL: &'static str = "http://localhost:8000";

    /// Create a client against the default localhost backend
    pub fn new() -> Self {
        Self::with_base_url(Self::DEFAULT_BASE_URL.to_string())
    }

    /// Create a client with a custom base URL
    pub fn with_base_url(base_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            base_url,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Turn a non-success response into a FetchError, pulling the message out
    /// of the backend's `{"error": ...}` body when it has one
    async fn handle_error_response(
        status: reqwest::StatusCode,
        response: reqwest::Response,
    ) -> FetchError {
        let status_code = status.as_u16();
        let body_text = response.text().await.unwrap_or_default();

        match serde_json::from_str::<ErrorBody>(&body_text) {
            Ok(body) => {
                if let Some(details) = &body.details {
                    debug!("error details from backend: {}", details);
                }
                let message = body
                    .error
                    .or(body.message)
                    .unwrap_or_else(|| format!("{} {}", status_code, status.canonical_reason().unwrap_or("")));
                FetchError::Api {
                    status: status_code,
                    message,
                    details: body.details,
                }
            }
            Err(_) => FetchError::Api {
                status: status_code,
                message: if body_text.is_empty() {
                    status.canonical_reason().unwrap_or("unknown error").to_string()
                } else {
                    body_text
                },
                details: None,
            },
        }
    }

    /// GET an endpoint and decode its JSON body
    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, FetchError> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!("GET {}", url);

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(FetchError::from_reqwest)?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(Self::handle_error_response(status, response).await);
        }

        response
            .json::<T>()
            .await
            .map_err(|e| FetchError::DataShape(format!("Failed to parse response: {}", e)))
    }

    /// GET /api/nifty - latest index level and day change
    pub async fn get_nifty(&self) -> Result<IndexSnapshot, FetchError> {
        self.get_json("/api/nifty").await
    }

    /// GET /api/stock/{symbol} - latest traded price for one symbol
    pub async fn get_stock(&self, symbol: &str) -> Result<StockSnapshot, FetchError> {
        self.get_json(&format!("/api/stock/{}", symbol)).await
    }

    /// GET /api/market-movers - top gainers and losers
    pub async fn get_market_movers(&self) -> Result<MarketMovers, FetchError> {
        self.get_json("/api/market-movers").await
    }

    /// GET /api/portfolio - holdings and totals
    pub async fn get_portfolio(&self) -> Result<PortfolioResponse, FetchError> {
        self.get_json("/api/portfolio").await
    }

    /// GET /api/nifty/history - index history for the performance chart
    pub async fn get_nifty_history(&self) -> Result<Vec<HistoryRow>, FetchError> {
        self.get_json("/api/nifty/history").await
    }

    /// GET /api/dsfm/top-stocks - risk-ranked stock lists
    pub async fn get_top_stocks(&self) -> Result<TopStocksResponse, FetchError> {
        self.get_json("/api/dsfm/top-stocks").await
    }

    /// GET /api/dsfm/forecast/{symbol} - ARIMA/SARIMA/GARCH price paths
    pub async fn get_forecast(&self, symbol: &str) -> Result<ForecastResponse, FetchError> {
        self.get_json(&format!("/api/dsfm/forecast/{}", symbol)).await
    }

    /// GET /api/dsfm/sentiment/{symbol} - headline sentiment for one symbol
    pub async fn get_sentiment(&self, symbol: &str) -> Result<SentimentResponse, FetchError> {
        self.get_json(&format!("/api/dsfm/sentiment/{}", symbol)).await
    }

    /// GET /api/dsfm/decision/{symbol} - trade signal plus price history
    pub async fn get_decision(&self, symbol: &str) -> Result<DecisionResponse, FetchError> {
        self.get_json(&format!("/api/dsfm/decision/{}", symbol)).await
    }

    /// GET /api/most-bought - most bought stock of the day
    pub async fn get_most_bought(&self) -> Result<MostBoughtResponse, FetchError> {
        self.get_json("/api/most-bought").await
    }

    /// GET /api/market-insights - opaque insight blob, rendered verbatim
    pub async fn get_market_insights(&self) -> Result<serde_json::Value, FetchError> {
        self.get_json("/api/market-insights").await
    }

    /// GET /api/dsfm/garch-analysis/{symbol}
    pub async fn get_garch_analysis(&self, symbol: &str) -> Result<GarchAnalysisResponse, FetchError> {
        self.get_json(&format!("/api/dsfm/garch-analysis/{}", symbol)).await
    }

    /// GET /api/dsfm/finbert-analysis - sentiment sweep over all symbols
    pub async fn get_finbert_analysis(&self) -> Result<FinbertAnalysisResponse, FetchError> {
        self.get_json("/api/dsfm/finbert-analysis").await
    }

    /// GET /api/dsfm/lstm-analysis/{symbol}
    pub async fn get_lstm_analysis(&self, symbol: &str) -> Result<LstmAnalysisResponse, FetchError> {
        self.get_json(&format!("/api/dsfm/lstm-analysis/{}", symbol)).await
    }

    /// GET /api/dsfm/combined-analysis/{symbol} - GARCH + LSTM + FinBERT
    pub async fn get_combined_analysis(
        &self,
        symbol: &str,
    ) -> Result<CombinedAnalysisResponse, FetchError> {
        self.get_json(&format!("/api/dsfm/combined-analysis/{}", symbol)).await
    }

    /// GET /api/dsfm/available-symbols - symbols the analysis suite accepts
    pub async fn get_available_symbols(&self) -> Result<AvailableSymbolsResponse, FetchError> {
        self.get_json("/api/dsfm/available-symbols").await
    }
}

impl Default for DsfmClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_base_url_points_at_localhost() {
        let client = DsfmClient::new();
        assert_eq!(client.base_url(), "http://localhost:8000");
    }

    #[tokio::test]
    async fn unreachable_backend_classifies_as_connection_error() {
        // Nothing listens on this port; the error must be Connection, not Api
        let client = DsfmClient::with_base_url("http://127.0.0.1:1".to_string());
        let err = client.get_nifty().await.unwrap_err();
        assert!(err.is_connection(), "expected Connection, got {:?}", err);
    }
}
