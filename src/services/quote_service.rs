use crate::api::dsfm::{DsfmClient, FetchError};
use crate::models::{IndexQuote, StockQuote};

/// Fetch the latest index level
pub async fn get_index_quote(client: &DsfmClient) -> Result<IndexQuote, FetchError> {
    let snapshot = client.get_nifty().await?;
    Ok(IndexQuote {
        name: "NIFTY".to_string(),
        value: snapshot.nifty_value,
        change_pct: snapshot.change_pct,
    })
}

/// Fetch the latest traded price for one symbol
pub async fn get_stock_quote(client: &DsfmClient, symbol: &str) -> Result<StockQuote, FetchError> {
    let symbol = symbol.trim();
    if symbol.is_empty() {
        return Err(FetchError::DataShape("symbol cannot be empty".to_string()));
    }

    let snapshot = client.get_stock(symbol).await?;
    Ok(StockQuote {
        symbol: snapshot.symbol,
        last_price: snapshot.latest_value,
        change_abs: snapshot.change,
        change_pct: snapshot.change_pct,
    })
}

/// One-line ticker text, e.g. `NIFTY 25910.05  +0.42%`
pub fn format_ticker_line(quote: &IndexQuote) -> String {
    format!(
        "{} {:.2}  {}{:.2}%",
        quote.name,
        quote.value,
        if quote.is_positive() { "+" } else { "" },
        quote.change_pct
    )
}

/// Signed change text, e.g. `+12.34 (+0.56%)`
pub fn format_change(change_abs: f64, change_pct: f64) -> String {
    let sign = if change_abs >= 0.0 { "+" } else { "" };
    format!("{}{:.2} ({}{:.2}%)", sign, change_abs, sign, change_pct)
}
