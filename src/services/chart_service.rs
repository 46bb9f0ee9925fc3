use plotters::prelude::*;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tracing::debug;

use crate::models::{Series, ViewModel};

// Fixed frame geometry shared by every chart in the app
const MARGIN_LEFT: f64 = 50.0;
const MARGIN_RIGHT: f64 = 10.0;
const MARGIN_TOP: f64 = 20.0;
const MARGIN_BOTTOM: f64 = 20.0;
const GRIDLINES: u32 = 5;

const BACKGROUND: RGBColor = RGBColor(255, 255, 255);
const GRID: RGBColor = RGBColor(224, 224, 224);
const LINE: RGBColor = RGBColor(0, 102, 204);
const CANDLE_UP: RGBColor = RGBColor(0, 204, 102);
const CANDLE_UP_EDGE: RGBColor = RGBColor(0, 179, 89);
const CANDLE_DOWN: RGBColor = RGBColor(255, 51, 51);
const CANDLE_DOWN_EDGE: RGBColor = RGBColor(230, 46, 46);

static RENDER_SEQ: AtomicU64 = AtomicU64::new(0);

/// Chart rendering errors
#[derive(Debug, Error)]
pub enum ChartError {
    #[error("failed to paint chart: {0}")]
    Draw(String),
    #[error("chart image I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Pixel frame of one chart: canvas size minus the fixed margins
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotFrame {
    pub width: u32,
    pub height: u32,
}

impl PlotFrame {
    pub fn new(width: u32, height: u32) -> Self {
        PlotFrame { width, height }
    }

    /// Horizontal extent of the plot region
    pub fn plot_width(&self) -> f64 {
        (self.width as f64 - MARGIN_LEFT - MARGIN_RIGHT).max(1.0)
    }

    /// Vertical extent of the plot region
    pub fn plot_height(&self) -> f64 {
        (self.height as f64 - MARGIN_TOP - MARGIN_BOTTOM).max(1.0)
    }

    /// Pixel y of the plot baseline (bottom edge of the plot region)
    pub fn baseline(&self) -> f64 {
        self.height as f64 - MARGIN_BOTTOM
    }

    pub fn left(&self) -> f64 {
        MARGIN_LEFT
    }

    pub fn right_edge(&self) -> f64 {
        self.width as f64 - MARGIN_RIGHT
    }
}

/// Value range of a series across all plotted fields (high/low for candles,
/// value for line points)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    pub fn of(series: &Series) -> ValueRange {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        match series {
            Series::Line(points) => {
                for p in points {
                    min = min.min(p.value);
                    max = max.max(p.value);
                }
            }
            Series::Candles(candles) => {
                for c in candles {
                    min = min.min(c.low);
                    max = max.max(c.high);
                }
            }
        }
        ValueRange { min, max }
    }

    /// Spread of the range; a flat series falls back to 1 unit so the
    /// normalization never divides by zero
    pub fn span(&self) -> f64 {
        let span = self.max - self.min;
        if span > 0.0 {
            span
        } else {
            1.0
        }
    }

    /// Symmetric padding keeping points off the chart edge
    pub fn padding(&self) -> f64 {
        self.span() * 0.1
    }
}

/// Pixel x of the point at `index` in a series of `len` points
pub fn x_at(index: usize, len: usize, frame: &PlotFrame) -> f64 {
    let divisor = if len > 1 { (len - 1) as f64 } else { 1.0 };
    frame.left() + index as f64 * (frame.plot_width() / divisor)
}

/// Center x and body width of the candle at `index` when `len` candles
/// share the plot; bodies take 70% of their slot
pub fn candle_slot(index: usize, len: usize, frame: &PlotFrame) -> (f64, f64) {
    let spacing = frame.plot_width() / len.max(1) as f64;
    let center = frame.left() + index as f64 * spacing + spacing / 2.0;
    (center, spacing * 0.7)
}

/// Pixel y of `value` under the padded normalization
pub fn y_at(value: f64, range: &ValueRange, frame: &PlotFrame) -> f64 {
    let padding = range.padding();
    let normalized = (value - range.min + padding) / (range.span() + 2.0 * padding);
    frame.baseline() - normalized * frame.plot_height()
}

/// Top edge and height of a candle body between the mapped open/close ys.
/// Height is floored at 2 px so zero-movement candles stay visible.
pub fn candle_body(open_y: f64, close_y: f64) -> (f64, f64) {
    let top = open_y.min(close_y);
    let height = (open_y - close_y).abs().max(2.0);
    (top, height)
}

/// Paints line or candlestick charts into PNG images.
///
/// The renderer is stateless given its inputs: every call repaints the whole
/// frame from the series, so a resize is just a second call with the new
/// canvas size. Empty series paint a blank background. Points are assumed
/// finite; filtering bad values is the caller's job.
pub struct ChartRenderer {
    fill_under_line: bool,
}

impl ChartRenderer {
    pub fn new() -> Self {
        ChartRenderer {
            fill_under_line: false,
        }
    }

    /// Shade the area between a line and the baseline
    pub fn with_fill(mut self, fill: bool) -> Self {
        self.fill_under_line = fill;
        self
    }

    /// Render a full view model
    pub fn draw(&self, view: &ViewModel) -> Result<Vec<u8>, ChartError> {
        self.render(&view.series, view.width, view.height)
    }

    /// Render `series` onto a `width` x `height` canvas and return PNG bytes
    pub fn render(&self, series: &Series, width: u32, height: u32) -> Result<Vec<u8>, ChartError> {
        let seq = RENDER_SEQ.fetch_add(1, Ordering::Relaxed);
        let temp_file = std::env::temp_dir().join(format!("marketdeck_chart_{}.png", seq));

        {
            let backend = BitMapBackend::new(&temp_file, (width, height));
            let root = backend.into_drawing_area();
            root.fill(&BACKGROUND)
                .map_err(|e| ChartError::Draw(format!("Failed to fill canvas: {}", e)))?;

            if !series.is_empty() {
                let frame = PlotFrame::new(width, height);
                let range = ValueRange::of(series);

                Self::draw_grid(&root, &frame)?;
                match series {
                    Series::Line(_) => self.draw_line(&root, series, &range, &frame)?,
                    Series::Candles(_) => Self::draw_candles(&root, series, &range, &frame)?,
                }
            }

            root.present()
                .map_err(|e| ChartError::Draw(format!("Failed to render chart: {}", e)))?;
        }

        let image_data = std::fs::read(&temp_file)?;
        let _ = std::fs::remove_file(&temp_file);

        debug!(
            "rendered {}x{} chart ({} points, {} bytes)",
            width,
            height,
            series.len(),
            image_data.len()
        );
        Ok(image_data)
    }

    /// Render a full view model and write the PNG to `path`
    pub fn render_to_file(&self, view: &ViewModel, path: &Path) -> Result<(), ChartError> {
        let image_data = self.draw(view)?;
        std::fs::write(path, image_data)?;
        Ok(())
    }

    /// Horizontal gridlines, evenly spaced in pixel space
    fn draw_grid(
        root: &DrawingArea<BitMapBackend, plotters::coord::Shift>,
        frame: &PlotFrame,
    ) -> Result<(), ChartError> {
        for i in 0..=GRIDLINES {
            let y = (MARGIN_TOP + frame.plot_height() / GRIDLINES as f64 * i as f64).round() as i32;
            root.draw(&PathElement::new(
                vec![
                    (frame.left().round() as i32, y),
                    (frame.right_edge().round() as i32, y),
                ],
                &GRID,
            ))
            .map_err(|e| ChartError::Draw(format!("Failed to draw grid: {}", e)))?;
        }
        Ok(())
    }

    fn draw_line(
        &self,
        root: &DrawingArea<BitMapBackend, plotters::coord::Shift>,
        series: &Series,
        range: &ValueRange,
        frame: &PlotFrame,
    ) -> Result<(), ChartError> {
        let points = match series {
            Series::Line(points) => points,
            Series::Candles(_) => return Ok(()),
        };

        let mapped: Vec<(i32, i32)> = points
            .iter()
            .enumerate()
            .map(|(i, p)| {
                (
                    x_at(i, points.len(), frame).round() as i32,
                    y_at(p.value, range, frame).round() as i32,
                )
            })
            .collect();

        if self.fill_under_line {
            let baseline = frame.baseline().round() as i32;
            let mut area = Vec::with_capacity(mapped.len() + 2);
            area.push((frame.left().round() as i32, baseline));
            area.extend(mapped.iter().copied());
            area.push((frame.right_edge().round() as i32, baseline));
            root.draw(&Polygon::new(area, &LINE.mix(0.1)))
                .map_err(|e| ChartError::Draw(format!("Failed to fill area: {}", e)))?;
        }

        root.draw(&PathElement::new(
            mapped,
            ShapeStyle {
                color: LINE.to_rgba(),
                filled: false,
                stroke_width: 2,
            },
        ))
        .map_err(|e| ChartError::Draw(format!("Failed to draw line: {}", e)))?;

        Ok(())
    }

    fn draw_candles(
        root: &DrawingArea<BitMapBackend, plotters::coord::Shift>,
        series: &Series,
        range: &ValueRange,
        frame: &PlotFrame,
    ) -> Result<(), ChartError> {
        let candles = match series {
            Series::Candles(candles) => candles,
            Series::Line(_) => return Ok(()),
        };

        for (i, candle) in candles.iter().enumerate() {
            let (center, body_width) = candle_slot(i, candles.len(), frame);
            let open_y = y_at(candle.open, range, frame);
            let close_y = y_at(candle.close, range, frame);
            let high_y = y_at(candle.high, range, frame);
            let low_y = y_at(candle.low, range, frame);

            let (fill, edge) = if candle.is_rising() {
                (CANDLE_UP, CANDLE_UP_EDGE)
            } else {
                (CANDLE_DOWN, CANDLE_DOWN_EDGE)
            };

            let x = center.round() as i32;
            root.draw(&PathElement::new(
                vec![(x, high_y.round() as i32), (x, low_y.round() as i32)],
                &fill,
            ))
            .map_err(|e| ChartError::Draw(format!("Failed to draw wick: {}", e)))?;

            let (body_top, body_height) = candle_body(open_y, close_y);
            let half = body_width / 2.0;
            let upper_left = ((center - half).round() as i32, body_top.round() as i32);
            let lower_right = (
                (center + half).round() as i32,
                (body_top + body_height).round() as i32,
            );

            root.draw(&Rectangle::new([upper_left, lower_right], fill.filled()))
                .map_err(|e| ChartError::Draw(format!("Failed to draw body: {}", e)))?;
            root.draw(&Rectangle::new([upper_left, lower_right], &edge))
                .map_err(|e| ChartError::Draw(format!("Failed to draw body edge: {}", e)))?;
        }

        Ok(())
    }
}

impl Default for ChartRenderer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Candle, PricePoint};
    use chrono::{TimeZone, Utc};

    fn ts(day: u32) -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap()
    }

    fn line_series(values: &[f64]) -> Series {
        Series::Line(
            values
                .iter()
                .enumerate()
                .map(|(i, &v)| PricePoint {
                    timestamp: ts(i as u32 + 1),
                    value: v,
                })
                .collect(),
        )
    }

    #[test]
    fn value_range_spans_candle_wicks() {
        let series = Series::Candles(vec![Candle::new(ts(1), 100.0, 110.0, 95.0, 105.0)]);
        let range = ValueRange::of(&series);
        assert_eq!(range.min, 95.0);
        assert_eq!(range.max, 110.0);
        assert_eq!(range.span(), 15.0);
        assert!((range.padding() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn pixel_mapping_matches_reference_formula() {
        let series = Series::Candles(vec![Candle::new(ts(1), 100.0, 110.0, 95.0, 105.0)]);
        let range = ValueRange::of(&series);
        let frame = PlotFrame::new(860, 240);

        // plot height 200, baseline 220, padded span 18
        let expect = |v: f64| 220.0 - ((v - 95.0 + 1.5) / 18.0) * 200.0;
        for v in [95.0, 100.0, 105.0, 110.0] {
            assert!(
                (y_at(v, &range, &frame) - expect(v)).abs() < 0.5,
                "y mapping diverged at {}",
                v
            );
        }
        // Padding keeps the extremes off the frame edges
        assert!(y_at(110.0, &range, &frame) > MARGIN_TOP);
        assert!(y_at(95.0, &range, &frame) < frame.baseline());
    }

    #[test]
    fn flat_series_uses_one_unit_fallback_span() {
        let series = line_series(&[42.0, 42.0, 42.0]);
        let range = ValueRange::of(&series);
        assert_eq!(range.span(), 1.0);

        let frame = PlotFrame::new(400, 200);
        let y = y_at(42.0, &range, &frame);
        assert!(y.is_finite());

        // Full render of a flat line must also succeed
        let png = ChartRenderer::new().render(&series, 400, 200).unwrap();
        assert!(!png.is_empty());
    }

    #[test]
    fn candle_body_height_is_floored_at_two_pixels() {
        // Zero movement maps open and close to the same y
        let (_, height) = candle_body(120.0, 120.0);
        assert_eq!(height, 2.0);
        let (_, height) = candle_body(120.0, 120.4);
        assert_eq!(height, 2.0);
        let (top, height) = candle_body(140.0, 120.0);
        assert_eq!(top, 120.0);
        assert_eq!(height, 20.0);
    }

    #[test]
    fn empty_series_renders_blank_background() {
        let png = ChartRenderer::new()
            .render(&Series::Line(Vec::new()), 320, 160)
            .unwrap();
        assert!(!png.is_empty());
    }

    #[test]
    fn resize_reflows_pixels_without_touching_value_range() {
        let series = line_series(&[10.0, 20.0, 30.0]);
        let range = ValueRange::of(&series);

        let narrow = PlotFrame::new(400, 200);
        let wide = PlotFrame::new(800, 200);

        assert_eq!(ValueRange::of(&series), range);
        assert!(x_at(2, 3, &wide) > x_at(2, 3, &narrow));
        // x positions stay inside the plot region at both sizes
        for frame in [&narrow, &wide] {
            assert!(x_at(0, 3, frame) >= frame.left());
            assert!(x_at(2, 3, frame) <= frame.right_edge() + 0.5);
        }
    }

    #[test]
    fn candlestick_render_succeeds() {
        let series = Series::Candles(vec![
            Candle::new(ts(1), 100.0, 110.0, 95.0, 105.0),
            Candle::new(ts(2), 105.0, 108.0, 99.0, 100.0),
            Candle::new(ts(3), 100.0, 100.0, 100.0, 100.0),
        ]);
        let png = ChartRenderer::new().render(&series, 640, 320).unwrap();
        assert!(!png.is_empty());
    }
}
