// src/connectors/chart.rs
use crate::connectors::traits::{ChartRenderer, ChartRequest};
use crate::types::Bar;
use anyhow::Result;
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder};
use plotters::prelude::*;
use rust_decimal::prelude::ToPrimitive;
use tracing::debug;

const BACKGROUND: RGBColor = RGBColor(21, 25, 36);
const UP: RGBColor = RGBColor(0x2e, 0xbd, 0x85);
const DOWN: RGBColor = RGBColor(0xf6, 0x46, 0x5d);
const BUY_LINE: RGBColor = RGBColor(0, 255, 255);
const TP_LINE: RGBColor = RGBColor(50, 205, 50);
const SL_LINE: RGBColor = RGBColor(255, 0, 0);

/// Candlestick PNG with a volume pane and the buy / TP / SL levels drawn
/// across the price pane. Text stays in the message caption, so no font
/// backend is needed.
#[derive(Debug, Clone, Copy)]
pub struct CandleChart {
    pub width: u32,
    pub height: u32,
}

impl Default for CandleChart {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 600,
        }
    }
}

impl ChartRenderer for CandleChart {
    fn render(&self, request: &ChartRequest<'_>) -> Result<Option<Vec<u8>>> {
        if request.bars.is_empty() || self.width == 0 || self.height == 0 {
            return Ok(None);
        }
        debug!(title = %request.title, bars = request.bars.len(), "Rendering chart");

        let levels: Vec<(f64, RGBColor)> = [
            (request.buy, BUY_LINE),
            (request.take_profit, TP_LINE),
            (request.stop_loss, SL_LINE),
        ]
        .into_iter()
        .filter_map(|(price, color)| price.to_f64().map(|p| (p, color)))
        .collect();

        let mut pixels = vec![0u8; self.width as usize * self.height as usize * 3];
        self.draw(&mut pixels, request.bars, &levels)?;

        let mut png = Vec::new();
        PngEncoder::new(&mut png).write_image(&pixels, self.width, self.height, ColorType::Rgb8)?;
        Ok(Some(png))
    }
}

impl CandleChart {
    fn draw(&self, pixels: &mut [u8], bars: &[Bar], levels: &[(f64, RGBColor)]) -> Result<()> {
        let root = BitMapBackend::with_buffer(pixels, (self.width, self.height)).into_drawing_area();
        root.fill(&BACKGROUND)?;
        let (upper, lower) = root.split_vertically((self.height * 3 / 4) as i32);

        let n = bars.len() as f64;
        let x_range = -0.5..n - 0.5;
        let (low, high) = price_bounds(bars, levels);

        let candle_px = (f64::from(self.width) / n * 0.6).max(1.0) as u32;
        let mut price = ChartBuilder::on(&upper)
            .margin(10)
            .build_cartesian_2d(x_range.clone(), low..high)?;
        price.draw_series(bars.iter().enumerate().map(|(i, bar)| {
            CandleStick::new(
                i as f64,
                bar.open,
                bar.high,
                bar.low,
                bar.close,
                UP.filled(),
                DOWN.filled(),
                candle_px,
            )
        }))?;
        for &(level, color) in levels {
            price.draw_series(LineSeries::new(
                [(x_range.start, level), (x_range.end, level)],
                color.stroke_width(2),
            ))?;
        }

        let max_volume = bars.iter().map(|b| b.volume).fold(0.0, f64::max).max(1.0);
        let mut volume = ChartBuilder::on(&lower)
            .margin(10)
            .build_cartesian_2d(x_range, 0.0..max_volume)?;
        volume.draw_series(bars.iter().enumerate().map(|(i, bar)| {
            let color = if bar.close >= bar.open { UP } else { DOWN };
            let x = i as f64;
            Rectangle::new([(x - 0.3, 0.0), (x + 0.3, bar.volume)], color.filled())
        }))?;

        root.present()?;
        Ok(())
    }
}

/// Vertical range covering every candle and level, padded by 5%.
fn price_bounds(bars: &[Bar], levels: &[(f64, RGBColor)]) -> (f64, f64) {
    let lows = bars.iter().map(|b| b.low);
    let highs = bars.iter().map(|b| b.high);
    let marks = levels.iter().map(|(p, _)| *p);

    let low = lows.chain(marks.clone()).fold(f64::INFINITY, f64::min);
    let high = highs.chain(marks).fold(f64::NEG_INFINITY, f64::max);
    let pad = if high > low { (high - low) * 0.05 } else { 1.0 };
    (low - pad, high + pad)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use image::GenericImageView;
    use rust_decimal::Decimal;

    fn bars(n: usize) -> Vec<Bar> {
        (0..n)
            .map(|i| {
                let close = 100.0 + (i % 7) as f64 - 3.0;
                let open = if i % 2 == 0 { close - 1.0 } else { close + 1.0 };
                Bar {
                    date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Duration::days(i as i64),
                    open,
                    high: open.max(close) + 0.5,
                    low: open.min(close) - 0.5,
                    close,
                    volume: 1_000_000.0 * (1 + i % 5) as f64,
                }
            })
            .collect()
    }

    fn request(bars: &[Bar]) -> ChartRequest<'_> {
        ChartRequest {
            title: "BBRI - BSJP PREMIUM".to_string(),
            bars,
            buy: Decimal::from(105),
            take_profit: Decimal::from(108),
            stop_loss: Decimal::from(102),
        }
    }

    #[test]
    fn renders_png_of_configured_size() {
        let bars = bars(60);
        let png = CandleChart::default()
            .render(&request(&bars))
            .unwrap()
            .expect("chart bytes");

        assert_eq!(&png[..4], &[0x89, b'P', b'N', b'G']);
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (1000, 600));
    }

    #[test]
    fn flat_single_bar_still_renders() {
        let bar = Bar {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            open: 105.0,
            high: 105.0,
            low: 105.0,
            close: 105.0,
            volume: 0.0,
        };
        let chart = CandleChart {
            width: 200,
            height: 120,
        };
        assert!(chart.render(&request(&[bar])).unwrap().is_some());
    }

    #[test]
    fn no_bars_means_no_image() {
        assert!(CandleChart::default().render(&request(&[])).unwrap().is_none());
    }

    #[test]
    fn bounds_include_levels_outside_candles() {
        let (low, high) = price_bounds(&bars(10), &[(150.0, TP_LINE), (50.0, SL_LINE)]);
        assert!(low < 50.0 && high > 150.0);
    }
}
