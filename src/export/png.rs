//! PNG chart renderer for the published visualizations.
//!
//! Three fixed charts are rendered from the transform outputs:
//! - a grouped bar chart of per-diet mean macronutrients
//! - an annotated heatmap of the same means
//! - a scatter plot of the top-protein records by cuisine
//!
//! Charts are drawn with `plotters` into an in-memory RGB buffer, which is then
//! encoded as PNG. Each chart owns its buffer and drawing area, and both are
//! dropped before the next chart starts, so nothing bleeds between figures.
//! Text is laid out with the system `sans-serif` font.

mod bar;
mod heatmap;
mod palette;
mod scatter;

use image::ImageEncoder;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use super::ExportError;
use crate::transform::{AggregateByDiet, TopProteinByDiet};

pub(crate) const FONT: &str = "sans-serif";

pub(crate) type Canvas<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

/// Pixel dimensions of one chart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartSize {
    pub width: u32,
    pub height: u32,
}

impl ChartSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    fn buffer_len(self) -> usize {
        self.width as usize * self.height as usize * 3
    }
}

/// Renderer for the three published charts.
pub struct ChartRenderer {
    bar: ChartSize,
    heatmap: ChartSize,
    scatter: ChartSize,
}

impl ChartRenderer {
    /// Create a renderer with the standard figure sizes (10x6, 8x6 and 10x6 at 100 dpi).
    pub fn new() -> Self {
        Self {
            bar: ChartSize::new(1000, 600),
            heatmap: ChartSize::new(800, 600),
            scatter: ChartSize::new(1000, 600),
        }
    }

    /// Grouped bar chart: one group per diet, one bar per macronutrient
    pub fn bar_chart(&self, aggregate: &AggregateByDiet) -> Result<Vec<u8>, ExportError> {
        render_png(self.bar, |canvas| bar::render(canvas, aggregate))
    }

    /// Heatmap of the per-diet means with two-decimal annotations
    pub fn heatmap(&self, aggregate: &AggregateByDiet) -> Result<Vec<u8>, ExportError> {
        render_png(self.heatmap, |canvas| heatmap::render(canvas, aggregate))
    }

    /// Scatter of top-protein records: cuisine on x, protein on y, colour by diet
    pub fn scatter(&self, top: &TopProteinByDiet) -> Result<Vec<u8>, ExportError> {
        render_png(self.scatter, |canvas| scatter::render(canvas, top))
    }
}

impl Default for ChartRenderer {
    fn default() -> Self {
        Self::new()
    }
}

fn render_png<F>(size: ChartSize, draw: F) -> Result<Vec<u8>, ExportError>
where
    F: FnOnce(&Canvas<'_>) -> Result<(), ExportError>,
{
    let mut pixels = vec![0u8; size.buffer_len()];
    {
        let canvas =
            BitMapBackend::with_buffer(&mut pixels, (size.width, size.height)).into_drawing_area();
        canvas.fill(&WHITE)?;
        draw(&canvas)?;
        canvas.present()?;
    }
    encode_png(&pixels, size)
}

fn encode_png(pixels: &[u8], size: ChartSize) -> Result<Vec<u8>, ExportError> {
    let mut buffer = Vec::new();
    {
        let encoder = image::codecs::png::PngEncoder::new(&mut buffer);
        encoder.write_image(pixels, size.width, size.height, image::ColorType::Rgb8)?;
    }
    Ok(buffer)
}

/// Upper bound of a value axis that starts at zero, with a little headroom
pub(crate) fn axis_max(values: impl Iterator<Item = f64>) -> f64 {
    let max = values.filter(|v| v.is_finite()).fold(0.0, f64::max);
    if max > 0.0 { max * 1.05 } else { 1.0 }
}

/// Label of the category whose slot is centred on `x`
pub(crate) fn slot_label(labels: &[&str], x: f64) -> String {
    if x < 0.0 {
        return String::new();
    }
    labels
        .get(x.floor() as usize)
        .map(|label| label.to_string())
        .unwrap_or_default()
}

/// Slot centres `0.5, 1.5, ...` for `count` categories
pub(crate) fn slot_centres(count: usize) -> Vec<f64> {
    (0..count).map(|i| i as f64 + 0.5).collect()
}

pub(crate) fn draw_no_data(canvas: &Canvas<'_>) -> Result<(), ExportError> {
    let (width, height) = canvas.dim_in_pixel();
    let style = (FONT, 28)
        .into_font()
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Center));
    canvas.draw(&Text::new(
        "No data",
        (width as i32 / 2, height as i32 / 2),
        style,
    ))?;
    Ok(())
}
