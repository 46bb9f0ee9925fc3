//! Data models for marketdeck panels and services
//!
//! This module organizes the view structs shared across panels and services.
//! Every entity here is rebuilt wholesale on each fetch/render cycle; nothing
//! is mutated incrementally or persisted.

pub mod chart;
pub mod quote;
pub mod watchlist;
pub mod portfolio;
pub mod analysis;

// Re-export commonly used types for convenience
pub use chart::{Candle, PricePoint, Series, ViewModel};
pub use quote::{IndexQuote, StockQuote};
pub use watchlist::{WatchlistEntry, WatchlistTab};
pub use portfolio::{HoldingRow, PortfolioSummary};
pub use analysis::{AnalysisSection, CombinedSummary, GarchSummary, LstmSummary, SentimentRow};
