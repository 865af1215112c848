use super::{format_timestamp, padded_range, Series, VisualizeError, FLAT_TIME_PAD};
use plotters::prelude::*;
use std::path::Path;

/// Static line plot of a single metric over time
pub(super) fn render(
    series: &Series,
    path: &Path,
    size: (u32, u32),
) -> Result<(), VisualizeError> {
    let root = SVGBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;

    let x_range = padded_range(series.points().map(|(x, _)| x), Some(FLAT_TIME_PAD));
    let y_range = padded_range(series.points().map(|(_, y)| y), None);

    let mut chart = ChartBuilder::on(&root)
        .caption(format!("Trend for {}", series.name), ("sans-serif", 24))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(x_range, y_range)?;

    chart
        .configure_mesh()
        .x_desc("Timestamp")
        .y_desc("Value")
        .x_labels(5)
        .x_label_formatter(&format_timestamp)
        .draw()?;

    chart.draw_series(LineSeries::new(series.points(), BLUE.stroke_width(2)))?;
    chart.draw_series(
        series
            .points()
            .map(|point| Circle::new(point, 4, BLUE.filled())),
    )?;

    root.present()?;

    Ok(())
}
