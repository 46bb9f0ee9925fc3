use crate::api::dsfm::models::PortfolioResponse;
use crate::api::dsfm::{DsfmClient, FetchError};
use crate::models::{HoldingRow, PortfolioSummary};

/// Fetch holdings and totals in display form
pub async fn get_portfolio(
    client: &DsfmClient,
) -> Result<(Vec<HoldingRow>, PortfolioSummary), FetchError> {
    let response = client.get_portfolio().await?;
    let rows = rows_from_response(&response);
    let summary = summary_from_response(&response);
    Ok((rows, summary))
}

pub fn rows_from_response(response: &PortfolioResponse) -> Vec<HoldingRow> {
    response
        .holdings
        .iter()
        .map(|h| HoldingRow {
            symbol: h.symbol.clone(),
            quantity: h.quantity,
            avg_cost: h.avg_cost,
            ltp: h.ltp,
            invested: h.invested,
            current_value: h.current_value,
            profit_loss: h.profit_loss,
            profit_loss_pct: h.profit_loss_pct,
            today_pl: h.today_pl,
        })
        .collect()
}

/// Build the totals block. The backend sends `totals: {}` when it has no
/// data, so any missing figure is recomputed from the holdings.
pub fn summary_from_response(response: &PortfolioResponse) -> PortfolioSummary {
    let totals = &response.totals;
    let holdings = &response.holdings;

    PortfolioSummary {
        total_invested: totals
            .total_invested
            .unwrap_or_else(|| holdings.iter().map(|h| h.invested).sum()),
        total_current_value: totals
            .total_current_value
            .unwrap_or_else(|| holdings.iter().map(|h| h.current_value).sum()),
        total_profit_loss: totals
            .total_profit_loss
            .unwrap_or_else(|| holdings.iter().map(|h| h.profit_loss).sum()),
        total_today_pl: totals
            .total_today_pl
            .unwrap_or_else(|| holdings.iter().map(|h| h.today_pl).sum()),
        date: totals.date.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::dsfm::models::{HoldingEntry, PortfolioTotals};

    fn holding(symbol: &str, invested: f64, current: f64) -> HoldingEntry {
        HoldingEntry {
            symbol: symbol.to_string(),
            quantity: 1.0,
            avg_cost: invested,
            ltp: current,
            invested,
            current_value: current,
            profit_loss: current - invested,
            profit_loss_pct: (current - invested) / invested * 100.0,
            today_pl: 1.0,
        }
    }

    #[test]
    fn empty_totals_are_recomputed_from_holdings() {
        let response = PortfolioResponse {
            holdings: vec![holding("A", 100.0, 110.0), holding("B", 200.0, 190.0)],
            totals: PortfolioTotals::default(),
        };
        let summary = summary_from_response(&response);
        assert!((summary.total_invested - 300.0).abs() < 1e-9);
        assert!((summary.total_current_value - 300.0).abs() < 1e-9);
        assert!((summary.total_profit_loss - 0.0).abs() < 1e-9);
        assert!((summary.total_today_pl - 2.0).abs() < 1e-9);
    }

    #[test]
    fn backend_totals_win_over_recomputation() {
        let response = PortfolioResponse {
            holdings: vec![holding("A", 100.0, 110.0)],
            totals: PortfolioTotals {
                total_invested: Some(999.0),
                total_current_value: None,
                total_profit_loss: Some(1.0),
                total_today_pl: None,
                date: Some("01-01-2024".to_string()),
            },
        };
        let summary = summary_from_response(&response);
        assert_eq!(summary.total_invested, 999.0);
        assert!((summary.total_current_value - 110.0).abs() < 1e-9);
        assert_eq!(summary.total_profit_loss, 1.0);
        assert_eq!(summary.date.as_deref(), Some("01-01-2024"));
    }
}
