use plotters::prelude::*;

use super::palette::categorical;
use super::{Canvas, FONT, axis_max, draw_no_data, slot_centres, slot_label};
use crate::dataset::Field;
use crate::export::ExportError;
use crate::transform::AggregateByDiet;

const TITLE: &str = "Average Macronutrient Content by Diet Type";
/// Share of each diet slot covered by its bars
const GROUP_WIDTH: f64 = 0.8;

pub(super) fn render(canvas: &Canvas<'_>, aggregate: &AggregateByDiet) -> Result<(), ExportError> {
    let diets: Vec<&str> = aggregate.groups.keys().map(String::as_str).collect();
    let y_max = axis_max(aggregate.groups.values().flat_map(|means| means.values()));

    let mut chart = ChartBuilder::on(canvas)
        .caption(TITLE, (FONT, 24))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(
            (0f64..diets.len().max(1) as f64).with_key_points(slot_centres(diets.len())),
            0f64..y_max,
        )?;

    let diet_label = |x: &f64| slot_label(&diets, *x);
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_label_formatter(&diet_label)
        .x_desc("Diet_type")
        .label_style((FONT, 14))
        .axis_desc_style((FONT, 16))
        .draw()?;

    if aggregate.is_empty() {
        return draw_no_data(canvas);
    }

    let bar_width = GROUP_WIDTH / Field::MACROS.len() as f64;
    let offset = (1.0 - GROUP_WIDTH) / 2.0;

    for (j, field) in Field::MACROS.iter().enumerate() {
        let color = categorical(j);
        let bars = aggregate
            .groups
            .values()
            .enumerate()
            .filter_map(|(i, means)| {
                let value = means.values()[j];
                let left = i as f64 + offset + j as f64 * bar_width;
                value
                    .is_finite()
                    .then(|| Rectangle::new([(left, 0.0), (left + bar_width, value)], color.filled()))
            });

        chart
            .draw_series(bars)?
            .label(field.header())
            .legend(move |(x, y)| Rectangle::new([(x, y - 6), (x + 14, y + 6)], color.filled()));
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
