//! Static fallback dataset shown while the backend is unreachable.
//!
//! Panels switch to these values under a `Connection` error and keep
//! polling; the next successful tick replaces them with live data.

use chrono::{Duration, Utc};
use lazy_static::lazy_static;

use crate::api::dsfm::models::SymbolInfo;
use crate::models::{IndexQuote, PricePoint, Series, WatchlistEntry};

lazy_static! {
    /// Symbols the analysis panel offers when the backend symbol list
    /// cannot be fetched; mirrors the market-data CSV naming
    pub static ref FALLBACK_SYMBOLS: Vec<SymbolInfo> = vec![
        symbol("CDUR_ASIANPAINT", "ASIANPAINT"),
        symbol("FIN_HDFCBANK", "HDFCBANK"),
        symbol("PWR_NTPC", "NTPC"),
        symbol("AUTO_MARUTI", "MARUTI"),
        symbol("IT_WIPRO", "WIPRO"),
        symbol("HLTH_SUNPHARMA", "SUNPHARMA"),
        symbol("CONST_ULTRACEMCO", "ULTRACEMCO"),
        symbol("IT_TECHM", "TECHM"),
        symbol("FMCG_HINDUNILVR", "HINDUNILVR"),
        symbol("AUTO_BAJAJ-AUTO", "BAJAJAUTO"),
        symbol("AUTO_M&M", "MM"),
        symbol("CONST_LT", "LT"),
    ];
}

fn symbol(value: &str, display: &str) -> SymbolInfo {
    SymbolInfo {
        value: value.to_string(),
        display: display.to_string(),
    }
}

/// Flat index quote used while the backend is down
pub fn index_quote() -> IndexQuote {
    IndexQuote {
        name: "NIFTY".to_string(),
        value: 25910.05,
        change_pct: 0.0,
    }
}

/// A handful of placeholder watchlist rows
pub fn watchlist() -> Vec<WatchlistEntry> {
    FALLBACK_SYMBOLS
        .iter()
        .take(5)
        .enumerate()
        .map(|(i, s)| WatchlistEntry {
            symbol: s.display.clone(),
            last_price: 1000.0 + i as f64 * 250.0,
            change_abs: 0.0,
            change_pct: 0.0,
        })
        .collect()
}

/// Deterministic 30-point history so the chart region is not empty while
/// offline
pub fn history() -> Series {
    let start = Utc::now() - Duration::days(30);
    let points = (0..30)
        .map(|i| PricePoint {
            timestamp: start + Duration::days(i),
            value: 25000.0 + 400.0 * (i as f64 * 0.4).sin() + i as f64 * 10.0,
        })
        .collect();
    Series::Line(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_history_is_plottable() {
        let series = history();
        assert_eq!(series.len(), 30);
        match series {
            Series::Line(points) => {
                assert!(points.iter().all(|p| p.value.is_finite()));
                assert!(points.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
            }
            Series::Candles(_) => panic!("expected a line series"),
        }
    }

    #[test]
    fn fallback_symbols_are_available_offline() {
        assert!(!FALLBACK_SYMBOLS.is_empty());
        assert!(!watchlist().is_empty());
    }
}
