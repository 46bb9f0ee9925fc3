use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tracing::debug;

use crate::api::dsfm::models::{DatedPrice, HistoryRow};
use crate::api::dsfm::{DsfmClient, FetchError};
use crate::models::{Candle, PricePoint, Series};

/// How much decision history feeds the candlestick chart
const CANDLE_TAIL: usize = 200;
/// Closes per synthesized candle
const CANDLE_BUCKET: usize = 4;

/// Parse the date formats the backend emits (pandas timestamps serialized
/// by Flask, plain ISO dates, and the dd-mm-YYYY snapshot dates)
pub fn parse_market_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc));
    }
    for format in ["%Y-%m-%d", "%d-%m-%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            let naive = date.and_hms_opt(0, 0, 0)?;
            return Some(DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc));
        }
    }
    None
}

/// Index history rows into a line series, dropping rows with unparseable
/// dates and keeping timestamp order
pub fn line_series_from_history(rows: &[HistoryRow]) -> Series {
    let mut points: Vec<PricePoint> = rows
        .iter()
        .filter_map(|row| {
            let timestamp = parse_market_date(&row.date);
            if timestamp.is_none() {
                debug!("skipping history row with bad date: {}", row.date);
            }
            timestamp.map(|timestamp| PricePoint {
                timestamp,
                value: row.nifty,
            })
        })
        .collect();
    points.sort_by_key(|p| p.timestamp);
    Series::Line(points)
}

/// Dated prices (decision history, forecasts) as ordered points
pub fn points_from_dated(prices: &[DatedPrice]) -> Vec<PricePoint> {
    let mut points: Vec<PricePoint> = prices
        .iter()
        .filter_map(|p| {
            parse_market_date(&p.date).map(|timestamp| PricePoint {
                timestamp,
                value: p.price,
            })
        })
        .collect();
    points.sort_by_key(|p| p.timestamp);
    points
}

/// Bucket an ordered close series into OHLC candles.
///
/// Each candle covers `bucket` consecutive closes: open is the previous
/// bucket's last close (first close for the opening candle), close is the
/// bucket's last value, high/low are the bucket extremes widened to the
/// open. Derivation is deterministic, so redraws of the same history are
/// identical.
pub fn candles_from_closes(points: &[PricePoint], bucket: usize) -> Series {
    let bucket = bucket.max(1);
    let mut candles = Vec::with_capacity(points.len() / bucket + 1);
    let mut prev_close: Option<f64> = None;

    for chunk in points.chunks(bucket) {
        let close = chunk[chunk.len() - 1].value;
        let open = prev_close.unwrap_or(chunk[0].value);
        let high = chunk.iter().map(|p| p.value).fold(f64::NEG_INFINITY, f64::max);
        let low = chunk.iter().map(|p| p.value).fold(f64::INFINITY, f64::min);
        candles.push(Candle::new(chunk[0].timestamp, open, high, low, close));
        prev_close = Some(close);
    }

    Series::Candles(candles)
}

/// Fetch the index history line series for the performance chart
pub async fn get_index_history(client: &DsfmClient) -> Result<Series, FetchError> {
    let rows = client.get_nifty_history().await?;
    Ok(line_series_from_history(&rows))
}

/// Fetch a symbol's price history and synthesize candles from it
pub async fn get_symbol_candles(client: &DsfmClient, symbol: &str) -> Result<Series, FetchError> {
    let decision = client.get_decision(symbol).await?;
    let points = points_from_dated(&decision.history);
    let tail_start = points.len().saturating_sub(CANDLE_TAIL);
    Ok(candles_from_closes(&points[tail_start..], CANDLE_BUCKET))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn point(day: u32, value: f64) -> PricePoint {
        PricePoint {
            timestamp: Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap(),
            value,
        }
    }

    #[test]
    fn parses_every_backend_date_format() {
        assert!(parse_market_date("2024-03-01").is_some());
        assert!(parse_market_date("01-03-2024").is_some());
        assert!(parse_market_date("2024-03-01 15:30:00").is_some());
        assert!(parse_market_date("Fri, 01 Mar 2024 00:00:00 GMT").is_some());
        assert!(parse_market_date("not a date").is_none());
    }

    #[test]
    fn bad_dates_are_dropped_and_order_restored() {
        let rows = vec![
            HistoryRow {
                date: "2024-01-03".to_string(),
                nifty: 3.0,
            },
            HistoryRow {
                date: "garbage".to_string(),
                nifty: 0.0,
            },
            HistoryRow {
                date: "2024-01-01".to_string(),
                nifty: 1.0,
            },
        ];
        let series = line_series_from_history(&rows);
        match series {
            Series::Line(points) => {
                assert_eq!(points.len(), 2);
                assert_eq!(points[0].value, 1.0);
                assert_eq!(points[1].value, 3.0);
            }
            Series::Candles(_) => panic!("expected a line series"),
        }
    }

    #[test]
    fn synthesized_candles_chain_opens_to_previous_closes() {
        let points: Vec<PricePoint> = (1..=8)
            .map(|i| point(i, 100.0 + i as f64 * if i % 2 == 0 { -1.0 } else { 1.0 }))
            .collect();
        let series = candles_from_closes(&points, 4);
        let candles = match series {
            Series::Candles(candles) => candles,
            Series::Line(_) => panic!("expected candles"),
        };
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].open, points[0].value);
        assert_eq!(candles[1].open, candles[0].close);
        for c in &candles {
            assert!(c.low <= c.open.min(c.close));
            assert!(c.high >= c.open.max(c.close));
        }
    }

    #[test]
    fn partial_trailing_bucket_still_becomes_a_candle() {
        let points: Vec<PricePoint> = (1..=5).map(|i| point(i, 100.0 + i as f64)).collect();
        let series = candles_from_closes(&points, 4);
        assert_eq!(series.len(), 2);
    }
}
