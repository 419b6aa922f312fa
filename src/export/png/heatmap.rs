use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use super::palette::{luminance, sequential};
use super::{Canvas, FONT, draw_no_data, slot_centres, slot_label};
use crate::dataset::Field;
use crate::export::ExportError;
use crate::transform::AggregateByDiet;

const COLORBAR_WIDTH: u32 = 110;
const COLORBAR_STEPS: usize = 128;

/// Value range over all finite cells
fn value_range(aggregate: &AggregateByDiet) -> Option<(f64, f64)> {
    aggregate
        .groups
        .values()
        .flat_map(|means| means.values())
        .filter(|v| v.is_finite())
        .fold(None, |range, v| match range {
            None => Some((v, v)),
            Some((lo, hi)) => Some((f64::min(lo, v), f64::max(hi, v))),
        })
}

fn normalize(value: f64, (lo, hi): (f64, f64)) -> f64 {
    if hi > lo { (value - lo) / (hi - lo) } else { 0.5 }
}

pub(super) fn render(canvas: &Canvas<'_>, aggregate: &AggregateByDiet) -> Result<(), ExportError> {
    let Some(range) = value_range(aggregate) else {
        return draw_no_data(canvas);
    };

    let (width, _) = canvas.dim_in_pixel();
    let (grid_area, colorbar_area) = canvas.split_horizontally(width.saturating_sub(COLORBAR_WIDTH));

    // First diet on the top row
    let diets: Vec<&str> = aggregate.groups.keys().rev().map(String::as_str).collect();
    let macros: Vec<&str> = Field::MACROS.iter().map(|field| field.header()).collect();
    let rows = diets.len();

    let mut chart = ChartBuilder::on(&grid_area)
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(110)
        .build_cartesian_2d(
            (0f64..macros.len() as f64).with_key_points(slot_centres(macros.len())),
            (0f64..rows as f64).with_key_points(slot_centres(rows)),
        )?;

    let macro_label = |x: &f64| slot_label(&macros, *x);
    let diet_label = |y: &f64| slot_label(&diets, *y);
    chart
        .configure_mesh()
        .disable_mesh()
        .x_label_formatter(&macro_label)
        .y_label_formatter(&diet_label)
        .y_desc("Diet_type")
        .label_style((FONT, 14))
        .axis_desc_style((FONT, 16))
        .draw()?;

    let cells: Vec<(f64, f64, f64)> = aggregate
        .groups
        .values()
        .enumerate()
        .flat_map(|(i, means)| {
            let row = (rows - 1 - i) as f64;
            means
                .values()
                .into_iter()
                .enumerate()
                .map(move |(col, value)| (col as f64, row, value))
        })
        .collect();

    chart.draw_series(cells.iter().map(|&(x, y, value)| {
        let color = if value.is_finite() {
            sequential(normalize(value, range))
        } else {
            WHITE
        };
        Rectangle::new([(x, y), (x + 1.0, y + 1.0)], color.filled())
    }))?;

    chart.draw_series(cells.iter().filter(|(_, _, value)| value.is_finite()).map(
        |&(x, y, value)| {
            let fill = sequential(normalize(value, range));
            let ink = if luminance(fill) > 0.408 { BLACK } else { WHITE };
            let style = (FONT, 18)
                .into_font()
                .color(&ink)
                .pos(Pos::new(HPos::Center, VPos::Center));
            Text::new(format!("{value:.2}"), (x + 0.5, y + 0.5), style)
        },
    ))?;

    draw_colorbar(&colorbar_area, range)
}

fn draw_colorbar(area: &Canvas<'_>, (lo, hi): (f64, f64)) -> Result<(), ExportError> {
    let (bottom, top) = if hi > lo { (lo, hi) } else { (lo - 0.5, hi + 0.5) };

    let mut chart = ChartBuilder::on(area)
        .margin_top(20)
        .margin_bottom(70)
        .margin_right(10)
        .right_y_label_area_size(60)
        .build_cartesian_2d(0f64..1f64, bottom..top)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .disable_x_axis()
        .y_label_formatter(&|v: &f64| format!("{v:.1}"))
        .label_style((FONT, 12))
        .draw()?;

    let step = (top - bottom) / COLORBAR_STEPS as f64;
    chart.draw_series((0..COLORBAR_STEPS).map(|k| {
        let from = bottom + k as f64 * step;
        let t = (k as f64 + 0.5) / COLORBAR_STEPS as f64;
        Rectangle::new([(0.0, from), (1.0, from + step)], sequential(t).filled())
    }))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::png::tests::count_pixels;
    use crate::export::png::{ChartSize, render_png};
    use crate::transform::MacroMeans;

    fn aggregate(values: &[(&str, [f64; 3])]) -> AggregateByDiet {
        let mut aggregate = AggregateByDiet::default();
        for (diet, [protein, carbs, fat]) in values {
            aggregate.groups.insert(
                diet.to_string(),
                MacroMeans {
                    protein: *protein,
                    carbs: *carbs,
                    fat: *fat,
                },
            );
        }
        aggregate
    }

    fn draw(data: &AggregateByDiet) -> Vec<u8> {
        render_png(ChartSize::new(800, 600), |canvas| render(canvas, data)).unwrap()
    }

    #[test]
    fn test_value_range_skips_nan() {
        let data = aggregate(&[("Keto", [5.0, f64::NAN, 20.0]), ("Vegan", [1.0, 2.0, 3.0])]);
        assert_eq!(value_range(&data), Some((1.0, 20.0)));
    }

    #[test]
    fn test_constant_range_normalizes_to_middle() {
        assert_eq!(normalize(4.0, (4.0, 4.0)), 0.5);
        assert_eq!(normalize(3.0, (1.0, 5.0)), 0.5);
    }

    #[test]
    fn test_cells_span_the_scale() {
        let png = draw(&aggregate(&[("Paleo", [40.0, 0.0, 10.0])]));

        // One row of three cells; the colorbar holds only a thin band of each end
        assert!(count_pixels(&png, sequential(1.0)) > 20_000);
        assert!(count_pixels(&png, sequential(0.0)) > 20_000);
    }

    #[test]
    fn test_constant_values_render() {
        let png = draw(&aggregate(&[("Keto", [7.0, 7.0, 7.0])]));
        assert!(count_pixels(&png, sequential(0.5)) > 20_000);
    }

    #[test]
    fn test_unknown_mean_leaves_cell_blank() {
        let png = draw(&aggregate(&[("Keto", [5.0, f64::NAN, 20.0])]));
        assert!(count_pixels(&png, sequential(1.0)) > 20_000);
        assert!(count_pixels(&png, sequential(0.0)) > 20_000);
    }
}
