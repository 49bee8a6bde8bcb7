//! Chart rendering.
//!
//! Draws the combined agent share per date as a filled area chart into a
//! PNG file.

use crate::analysis::DailyShare;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use plotters::prelude::*;
use plotters::style::{register_font, FontStyle};
use std::path::Path;
use tracing::{debug, warn};

/// Canvas size in pixels.
pub const CHART_SIZE: (u32, u32) = (1100, 450);

const FONT_FAMILY: &str = "sans-serif";

const LINE_COLOR: RGBColor = RGBColor(217, 119, 87);

/// DejaVu Sans, used when no font is configured.
const BUNDLED_FONT: &[u8] = include_bytes!("../../assets/DejaVuSans.ttf");

const WATERMARK_SIZE: u32 = 28;

/// Blank glyphs kept between repetitions of the watermark.
const WATERMARK_GAP: &str = "     ";

/// Points of the chart: one per usable date, ascending.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub points: Vec<(NaiveDate, f64)>,
}

impl ChartSeries {
    /// Combined share per date.
    pub fn combined(shares: &[DailyShare]) -> Self {
        let mut points: Vec<(NaiveDate, f64)> =
            shares.iter().map(|s| (s.date, s.combined)).collect();
        points.sort_by_key(|(date, _)| *date);
        Self { points }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    fn max_value(&self) -> f64 {
        self.points.iter().map(|(_, v)| *v).fold(0.0, f64::max)
    }
}

/// Text options of the chart.
#[derive(Debug, Clone)]
pub struct ChartStyle {
    pub title: String,
    pub watermark: String,
    /// Whether a font is registered; without one no text is drawn.
    pub with_text: bool,
}

/// Register a font for chart text.
///
/// Uses `configured` if it can be loaded, otherwise the bundled font.
/// Returns `false` only when no font could be registered.
pub fn prepare_font(configured: Option<&Path>) -> bool {
    if let Some(path) = configured {
        match std::fs::read(path) {
            Ok(bytes) => {
                // plotters keeps registered fonts for the life of the process.
                let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
                if register_font(FONT_FAMILY, FontStyle::Normal, bytes).is_ok() {
                    debug!("Using chart font {}", path.display());
                    return true;
                }
                warn!("Ignoring unusable font {}", path.display());
            }
            Err(e) => warn!("Cannot read font {}: {}", path.display(), e),
        }
    }

    match register_font(FONT_FAMILY, FontStyle::Normal, BUNDLED_FONT) {
        Ok(()) => true,
        Err(_) => {
            warn!("Bundled font is unusable; the chart is drawn without text");
            false
        }
    }
}

fn draw_error<E: std::fmt::Display>(e: E) -> anyhow::Error {
    anyhow::anyhow!("Failed to draw chart: {}", e)
}

/// Render the series as an area chart into a PNG at `path`.
pub fn render_chart(series: &ChartSeries, style: &ChartStyle, path: &Path) -> Result<()> {
    if series.is_empty() {
        anyhow::bail!("Cannot render a chart without data points");
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(draw_error)?;

    let x_max = (series.points.len().max(2) - 1) as f64;
    let y_max = (series.max_value() * 1.15).max(0.1);

    let mut builder = ChartBuilder::on(&root);
    builder.margin(20);
    if style.with_text {
        builder
            .caption(&style.title, (FONT_FAMILY, 22))
            .x_label_area_size(40)
            .y_label_area_size(60);
    }

    let mut chart = builder
        .build_cartesian_2d(0f64..x_max, 0f64..y_max)
        .map_err(draw_error)?;

    if style.with_text {
        let label_for = |x: &f64| {
            let idx = x.round();
            if (x - idx).abs() > 1e-6 || idx < 0.0 {
                return String::new();
            }
            series
                .points
                .get(idx as usize)
                .map(|(date, _)| date.format("%Y-%m-%d").to_string())
                .unwrap_or_default()
        };
        let percent = |y: &f64| format!("{:.1}%", y);

        chart
            .configure_mesh()
            .light_line_style(BLACK.mix(0.05))
            .bold_line_style(BLACK.mix(0.1))
            .x_labels(series.points.len().min(8))
            .x_label_formatter(&label_for)
            .y_label_formatter(&percent)
            .draw()
            .map_err(draw_error)?;
    }

    let points: Vec<(f64, f64)> = series
        .points
        .iter()
        .enumerate()
        .map(|(i, (_, v))| (i as f64, *v))
        .collect();

    chart
        .draw_series(AreaSeries::new(points.iter().copied(), 0.0, LINE_COLOR.mix(0.25)))
        .map_err(draw_error)?;
    chart
        .draw_series(LineSeries::new(
            points.iter().copied(),
            LINE_COLOR.stroke_width(2),
        ))
        .map_err(draw_error)?;

    if style.with_text && !style.watermark.is_empty() {
        draw_watermark(&root, &style.watermark)?;
    }

    root.present().map_err(draw_error)?;
    debug!("Chart written to {}", path.display());
    Ok(())
}

/// Write the watermark as a run of glyphs along the bottom-left to
/// top-right diagonal, repeated until the diagonal is covered.
fn draw_watermark<DB: DrawingBackend>(
    root: &DrawingArea<DB, plotters::coord::Shift>,
    text: &str,
) -> Result<()> {
    if text.trim().is_empty() {
        return Ok(());
    }

    let style = (FONT_FAMILY, WATERMARK_SIZE).into_font().color(&BLACK.mix(0.08));
    let (width, height) = root.dim_in_pixel();
    let (width, height) = (width as f64, height as f64);
    let diagonal = width.hypot(height);
    let (cos, sin) = (width / diagonal, height / diagonal);

    let min_advance = (WATERMARK_SIZE / 3) as f64;
    let run = format!("{}{}", text, WATERMARK_GAP);
    let mut offset = 0.0;

    for ch in run.chars().cycle() {
        if offset >= diagonal {
            break;
        }

        let glyph = ch.to_string();
        let (glyph_width, _) = root.estimate_text_size(&glyph, &style).map_err(draw_error)?;

        let x = (offset * cos) as i32;
        let y = (height - offset * sin) as i32 - WATERMARK_SIZE as i32;
        if !ch.is_whitespace() {
            root.draw_text(&glyph, &style, (x, y)).map_err(draw_error)?;
        }

        offset += (glyph_width as f64).max(min_advance) + 2.0;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn share(d: &str, combined: f64) -> DailyShare {
        DailyShare {
            date: date(d),
            total: 1000,
            by_agent: vec![],
            combined,
        }
    }

    #[test]
    fn test_series_is_chronological() {
        let series = ChartSeries::combined(&[share("2026-02-15", 2.0), share("2026-02-14", 1.0)]);
        assert_eq!(
            series.points,
            vec![(date("2026-02-14"), 1.0), (date("2026-02-15"), 2.0)]
        );
        assert_eq!(series.max_value(), 2.0);
    }

    #[test]
    fn test_render_without_text() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("out").join("chart.png");
        let series = ChartSeries::combined(&[
            share("2026-02-14", 1.0),
            share("2026-02-15", 2.0),
            share("2026-02-16", 1.5),
        ]);
        let style = ChartStyle {
            title: "test".to_string(),
            watermark: "test".to_string(),
            with_text: false,
        };

        render_chart(&series, &style, &path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"\x89PNG"));
    }

    #[test]
    fn test_single_point_renders() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("chart.png");
        let series = ChartSeries::combined(&[share("2026-02-14", 0.0)]);
        let style = ChartStyle {
            title: String::new(),
            watermark: String::new(),
            with_text: false,
        };

        render_chart(&series, &style, &path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_empty_series_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let series = ChartSeries { points: vec![] };
        let style = ChartStyle {
            title: String::new(),
            watermark: String::new(),
            with_text: false,
        };
        assert!(render_chart(&series, &style, &tmp.path().join("c.png")).is_err());
    }

    #[test]
    fn test_missing_font_falls_back_to_bundled() {
        assert!(prepare_font(Some(Path::new("/definitely/not/a/font.ttf"))));
        assert!(prepare_font(None));
    }

    #[test]
    fn test_render_with_text_and_watermark() {
        let tmp = TempDir::new().unwrap();
        let series = ChartSeries::combined(&[
            share("2026-01-30", 0.8),
            share("2026-02-14", 1.0),
            share("2026-02-15", 2.0),
        ]);
        assert!(prepare_font(None));

        let plain = tmp.path().join("plain.png");
        render_chart(
            &series,
            &ChartStyle {
                title: "Agent share".to_string(),
                watermark: String::new(),
                with_text: true,
            },
            &plain,
        )
        .unwrap();

        let marked = tmp.path().join("marked.png");
        render_chart(
            &series,
            &ChartStyle {
                title: "Agent share".to_string(),
                watermark: "agentcommits".to_string(),
                with_text: true,
            },
            &marked,
        )
        .unwrap();

        let plain = std::fs::read(&plain).unwrap();
        let marked = std::fs::read(&marked).unwrap();
        assert!(plain.starts_with(b"\x89PNG"));
        assert!(marked.starts_with(b"\x89PNG"));
        assert_ne!(plain, marked);
    }

    #[test]
    fn test_watermark_covers_the_diagonal() {
        assert!(prepare_font(None));
        let mut buffer = vec![255u8; (CHART_SIZE.0 * CHART_SIZE.1 * 3) as usize];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, CHART_SIZE).into_drawing_area();
            draw_watermark(&root, "agentcommits").unwrap();
            root.present().unwrap();
        }

        let (width, height) = (CHART_SIZE.0 as usize, CHART_SIZE.1 as usize);
        let inked = |x0: usize, x1: usize, y0: usize, y1: usize| {
            (y0..y1).any(|y| (x0..x1).any(|x| buffer[(y * width + x) * 3] < 255))
        };

        // Lower left and upper right quadrants both carry glyphs
        assert!(inked(0, width / 2, height / 2, height));
        assert!(inked(width / 2, width, 0, height / 2));
        // The opposite corners stay clean
        assert!(!inked(width * 3 / 4, width, height * 3 / 4, height));
        assert!(!inked(0, width / 4, 0, height / 4));
    }
}
