pub mod client;
pub mod models;

pub use client::DsfmClient;
pub use models::{FetchError, IndexSnapshot, MarketMovers, PortfolioResponse};
