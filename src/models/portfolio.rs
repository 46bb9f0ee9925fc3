//! Portfolio view models

/// One holding row as shown in the portfolio table
#[derive(Debug, Clone)]
pub struct HoldingRow {
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

/// Portfolio-wide totals
#[derive(Debug, Clone)]
pub struct PortfolioSummary {
    pub total_invested: f64,
    pub total_current_value: f64,
    pub total_profit_loss: f64,
    pub total_today_pl: f64,
    pub date: Option<String>,
}
