use plotters::prelude::*;

use super::palette::categorical;
use super::{Canvas, FONT, axis_max, draw_no_data, slot_centres, slot_label};
use crate::export::ExportError;
use crate::transform::TopProteinByDiet;

const MARKER_OPACITY: f64 = 0.7;
const MIN_AREA: f64 = 50.0;
const MAX_AREA: f64 = 300.0;

/// Distinct values in order of first appearance
fn categories<'a>(values: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen = Vec::new();
    for value in values {
        if !seen.contains(&value) {
            seen.push(value);
        }
    }
    seen
}

/// Marker radius in pixels; area scales linearly with protein between 50 and 300 pt²
fn marker_radius(protein: f64, (lo, hi): (f64, f64)) -> i32 {
    let area = if hi > lo {
        MIN_AREA + (protein - lo) / (hi - lo) * (MAX_AREA - MIN_AREA)
    } else {
        (MIN_AREA + MAX_AREA) / 2.0
    };
    let radius_pt = (area / std::f64::consts::PI).sqrt();
    (radius_pt * 100.0 / 72.0).round().max(1.0) as i32
}

pub(super) fn render(canvas: &Canvas<'_>, top: &TopProteinByDiet) -> Result<(), ExportError> {
    let points: Vec<(&str, &str, f64)> = top
        .records
        .iter()
        .filter_map(|r| {
            r.protein_g
                .filter(|p| p.is_finite())
                .map(|p| (r.cuisine_type.as_str(), r.diet_type.as_str(), p))
        })
        .collect();

    let cuisines = categories(points.iter().map(|(cuisine, _, _)| *cuisine));
    let diets = categories(points.iter().map(|(_, diet, _)| *diet));
    let range = points
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), (_, _, p)| {
            (lo.min(*p), hi.max(*p))
        });

    let mut chart = ChartBuilder::on(canvas)
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(60)
        .build_cartesian_2d(
            (0f64..cuisines.len().max(1) as f64).with_key_points(slot_centres(cuisines.len())),
            0f64..axis_max(points.iter().map(|(_, _, p)| *p)),
        )?;

    let cuisine_label = |x: &f64| slot_label(&cuisines, *x);
    chart
        .configure_mesh()
        .x_label_formatter(&cuisine_label)
        .x_desc("Cuisine_type")
        .y_desc("Protein(g)")
        .label_style((FONT, 14))
        .axis_desc_style((FONT, 16))
        .draw()?;

    if points.is_empty() {
        return draw_no_data(canvas);
    }

    for (hue, diet) in diets.iter().enumerate() {
        let color = categorical(hue);
        let markers = points
            .iter()
            .filter(|(_, point_diet, _)| point_diet == diet)
            .map(|(cuisine, _, protein)| {
                let slot = cuisines.iter().position(|c| c == cuisine).unwrap_or(0);
                Circle::new(
                    (slot as f64 + 0.5, *protein),
                    marker_radius(*protein, range),
                    color.mix(MARKER_OPACITY).filled(),
                )
            });

        chart
            .draw_series(markers)?
            .label(*diet)
            .legend(move |(x, y)| Circle::new((x + 6, y), 5, color.filled()));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .label_font((FONT, 14))
        .draw()?;

    Ok(())
}
