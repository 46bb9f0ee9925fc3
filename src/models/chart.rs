//! Chart series models

use chrono::{DateTime, Utc};

/// A single data point on a line chart
#[derive(Debug, Clone)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// One OHLC interval on a candlestick chart
#[derive(Debug, Clone)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Candle {
    /// Build a candle, widening high/low so that
    /// low <= min(open, close) <= max(open, close) <= high always holds.
    pub fn new(timestamp: DateTime<Utc>, open: f64, high: f64, low: f64, close: f64) -> Self {
        let body_high = open.max(close);
        let body_low = open.min(close);
        Candle {
            timestamp,
            open,
            high: high.max(body_high),
            low: low.min(body_low),
            close,
        }
    }

    /// A zero-movement candle counts as rising
    pub fn is_rising(&self) -> bool {
        self.close >= self.open
    }
}

/// An ordered series of plottable points, non-decreasing by timestamp.
/// May be empty.
#[derive(Debug, Clone)]
pub enum Series {
    Line(Vec<PricePoint>),
    Candles(Vec<Candle>),
}

impl Series {
    pub fn len(&self) -> usize {
        match self {
            Series::Line(points) => points.len(),
            Series::Candles(candles) => candles.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Everything one chart instance needs for a draw pass.
/// Rebuilt on every refresh or resize, never mutated in place.
#[derive(Debug, Clone)]
pub struct ViewModel {
    pub series: Series,
    pub width: u32,
    pub height: u32,
}
