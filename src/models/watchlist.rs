//! Watchlist models

/// One row of a watchlist, derived fresh on every refresh
#[derive(Debug, Clone)]
pub struct WatchlistEntry {
    pub symbol: String,
    pub last_price: f64,
    pub change_abs: f64,
    pub change_pct: f64,
}

impl WatchlistEntry {
    pub fn is_positive(&self) -> bool {
        self.change_abs >= 0.0
    }
}

/// The watchlist tabs offered by the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchlistTab {
    MyStocks,
    Nifty50,
}

impl WatchlistTab {
    pub fn as_str(&self) -> &'static str {
        match self {
            WatchlistTab::MyStocks => "mystocks",
            WatchlistTab::Nifty50 => "nifty50",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "mystocks" => Some(WatchlistTab::MyStocks),
            "nifty50" => Some(WatchlistTab::Nifty50),
            _ => None,
        }
    }
}
