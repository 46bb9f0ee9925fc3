use crate::api::dsfm::models::{MarketMovers, Mover};
use crate::models::{StockQuote, WatchlistEntry, WatchlistTab};

/// How many rows each tab holds
const TAB_LIMIT: usize = 10;

/// Both watchlist tabs, seeded from one market-movers payload
#[derive(Debug, Clone, Default)]
pub struct WatchlistTabs {
    pub mystocks: Vec<WatchlistEntry>,
    pub nifty50: Vec<WatchlistEntry>,
}

impl WatchlistTabs {
    pub fn entries(&self, tab: WatchlistTab) -> &[WatchlistEntry] {
        match tab {
            WatchlistTab::MyStocks => &self.mystocks,
            WatchlistTab::Nifty50 => &self.nifty50,
        }
    }

    /// Unique symbols across both tabs, in first-seen order; this is the
    /// set the quote poller refreshes
    pub fn symbols(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for entry in self.mystocks.iter().chain(self.nifty50.iter()) {
            if !seen.contains(&entry.symbol) {
                seen.push(entry.symbol.clone());
            }
        }
        seen
    }
}

/// Seed the tabs: `mystocks` takes the top gainers, `nifty50` mixes top
/// gainers and losers
pub fn tabs_from_movers(movers: &MarketMovers) -> WatchlistTabs {
    let mystocks = movers
        .gainers
        .iter()
        .take(TAB_LIMIT)
        .map(entry_from_mover)
        .collect();

    let nifty50 = movers
        .gainers
        .iter()
        .chain(movers.losers.iter())
        .take(TAB_LIMIT)
        .map(entry_from_mover)
        .collect();

    WatchlistTabs { mystocks, nifty50 }
}

/// Derive a watchlist row from a mover. The payload carries only LTP and
/// percent change, so the absolute change is backed out of the two.
pub fn entry_from_mover(mover: &Mover) -> WatchlistEntry {
    let prev = if (100.0 + mover.pct_change).abs() > f64::EPSILON {
        mover.ltp * 100.0 / (100.0 + mover.pct_change)
    } else {
        mover.ltp
    };
    WatchlistEntry {
        symbol: mover.symbol.clone(),
        last_price: mover.ltp,
        change_abs: mover.ltp - prev,
        change_pct: mover.pct_change,
    }
}

/// Rebuild a watchlist row from a fresh per-symbol quote
pub fn entry_from_quote(quote: &StockQuote) -> WatchlistEntry {
    WatchlistEntry {
        symbol: quote.symbol.clone(),
        last_price: quote.last_price,
        change_abs: quote.change_abs,
        change_pct: quote.change_pct,
    }
}

/// Case-insensitive symbol search over a tab's rows
pub fn filter_entries<'a>(entries: &'a [WatchlistEntry], query: &str) -> Vec<&'a WatchlistEntry> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return entries.iter().collect();
    }
    entries
        .iter()
        .filter(|e| e.symbol.to_lowercase().contains(&query))
        .collect()
}
