use super::{format_timestamp, padded_range, Series, VisualizeError, FLAT_TIME_PAD};
use plotters::prelude::*;

const TITLE: &str = "Benchmark Trends";

/// a hover target placed over a plotted point after rendering
struct Marker {
    x: i32,
    y: i32,
    color: RGBAColor,
    tooltip: String,
}

/// Render every series into one self-contained HTML document
///
/// The chart is inline SVG, hover details are native `<title>` tooltips so no script is needed.
pub(super) fn render(
    series: &[Series],
    total: usize,
    size: (u32, u32),
) -> Result<String, VisualizeError> {
    let mut svg = String::new();
    let mut markers = Vec::with_capacity(total);

    {
        let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
        root.fill(&WHITE)?;

        let x_range = padded_range(
            series.iter().flat_map(|metric| metric.points()).map(|(x, _)| x),
            Some(FLAT_TIME_PAD),
        );
        let y_range = padded_range(
            series.iter().flat_map(|metric| metric.points()).map(|(_, y)| y),
            None,
        );

        let mut chart = ChartBuilder::on(&root)
            .caption(TITLE, ("sans-serif", 28))
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(70)
            .build_cartesian_2d(x_range, y_range)?;

        chart
            .configure_mesh()
            .x_desc("Timestamp")
            .y_desc("Value")
            .x_labels(6)
            .x_label_formatter(&format_timestamp)
            .draw()?;

        for (index, metric) in series.iter().enumerate() {
            let color = Palette99::pick(index).to_rgba();

            chart
                .draw_series(LineSeries::new(metric.points(), color.stroke_width(2)))?
                .label(metric.name)
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                });
            chart.draw_series(
                metric
                    .points()
                    .map(|point| Circle::new(point, 3, color.filled())),
            )?;

            for (record, point) in metric.records.iter().zip(metric.points()) {
                let (x, y) = chart.backend_coord(&point);

                markers.push(Marker {
                    x,
                    y,
                    color,
                    tooltip: format!(
                        "metric: {}\nvalue: {}\ntimestamp: {}\ncommit: {}\nbranch: {}",
                        record.metric_name,
                        record.value,
                        record.timestamp.format("%Y-%m-%d %H:%M:%S"),
                        record.commit_sha,
                        record.branch
                    ),
                });
            }
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;

        root.present()?;
    }

    let mut layer = String::from("<g class=\"points\">");
    for marker in markers.iter() {
        let (r, g, b) = marker.color.rgb();
        layer.push_str(&format!(
            "<circle class=\"point\" cx=\"{}\" cy=\"{}\" r=\"6\" fill=\"rgb({r},{g},{b})\" \
             fill-opacity=\"0\"><title>{}</title></circle>",
            marker.x,
            marker.y,
            escape(&marker.tooltip)
        ));
    }
    layer.push_str("</g>");

    match svg.rfind("</svg>") {
        Some(end) => svg.insert_str(end, &layer),
        None => svg.push_str(&layer),
    }

    Ok(document(&svg, total, series.len()))
}

fn document(svg: &str, total: usize, metrics: usize) -> String {
    format!(
        "<!DOCTYPE html>
<html lang=\"en\">
<head>
<meta charset=\"utf-8\">
<title>{TITLE}</title>
<style>
body {{ font-family: sans-serif; margin: 2em; }}
.point:hover {{ fill-opacity: 1; stroke: black; stroke-width: 1; }}
</style>
</head>
<body>
<h1>{TITLE}</h1>
<p>{total} records across {metrics} metrics. Hover a point for details.</p>
{svg}
</body>
</html>
"
    )
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());

    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }

    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{testing::record, visualize::group_series};

    #[test]
    fn tooltips_are_escaped() {
        let records = [record(1, "c<1>", "feat/a&b", "m", 1.0)];
        let series = group_series(&records);

        let html = render(&series, records.len(), (800, 400)).unwrap();

        assert!(html.contains("commit: c&lt;1&gt;"));
        assert!(html.contains("branch: feat/a&amp;b"));
        assert!(!html.contains("c<1>"));
    }

    #[test]
    fn markers_are_inside_the_svg() {
        let records = [
            record(1, "c1", "main", "m", 1.0),
            record(2, "c2", "main", "m", 2.0),
        ];
        let series = group_series(&records);

        let html = render(&series, records.len(), (800, 400)).unwrap();
        let layer = html.find("<g class=\"points\">").unwrap();

        assert!(layer < html.rfind("</svg>").unwrap());
        assert_eq!(html.matches("</svg>").count(), 1);
    }
}
