use crate::analysis::UserSummary;
use crate::plotting::BarChartSpec;
use chrono::{DateTime, Local};
use maud::{Markup, html};
use plotters::prelude::*;
use std::path::Path;

/// Write an HTML report of per-user totals.
///
/// When `chart` is given it is rendered to a PNG next to the report and
/// embedded. A failed chart render is logged and the report is still written.
pub fn export_html_report<P: AsRef<Path>>(
    path: P,
    summaries: &[UserSummary],
    chart: Option<&BarChartSpec>,
) -> std::io::Result<()> {
    let path = path.as_ref();
    let chart_file = match chart {
        Some(spec) => {
            let chart_path = path.with_extension("png");
            match draw_bar_chart(spec, &chart_path) {
                Ok(()) => chart_path
                    .file_name()
                    .map(|f| f.to_string_lossy().to_string()),
                Err(e) => {
                    log::error!("Failed to generate chart: {e}");
                    None
                }
            }
        }
        None => None,
    };
    let markup = build_html(summaries, chart, chart_file.as_deref(), Local::now());
    std::fs::write(path, markup.into_string())
}

fn draw_bar_chart(spec: &BarChartSpec, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let root = BitMapBackend::new(path, (800, 400)).into_drawing_area();
    root.fill(&WHITE)?;
    if spec.values.is_empty() {
        root.present()?;
        return Ok(());
    }
    let max = spec.max_value().max(1.0) * 1.1;
    let labels = spec.labels.clone();
    let mut chart = ChartBuilder::on(&root)
        .caption(&spec.title, ("sans-serif", 25))
        .margin(5)
        .x_label_area_size(30)
        .y_label_area_size(40)
        .build_cartesian_2d(0f64..spec.values.len() as f64, 0f64..max)?;
    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(spec.values.len())
        .x_label_formatter(&|x| {
            labels
                .get(x.floor() as usize)
                .cloned()
                .unwrap_or_default()
        })
        .y_desc(spec.style.dataset_label.as_str())
        .draw()?;

    let [r, g, b, a] = spec.style.fill.to_srgba_unmultiplied();
    let fill = RGBAColor(r, g, b, f64::from(a) / 255.0);
    let [r, g, b, _] = spec.style.stroke.to_srgba_unmultiplied();
    let stroke = RGBColor(r, g, b);
    let stroke_width = spec.style.stroke_width.round() as u32;

    chart.draw_series(spec.values.iter().enumerate().map(|(i, v)| {
        let x = i as f64;
        Rectangle::new([(x + 0.2, 0.0), (x + 0.8, *v)], fill.filled())
    }))?;
    chart.draw_series(spec.values.iter().enumerate().map(|(i, v)| {
        let x = i as f64;
        Rectangle::new(
            [(x + 0.2, 0.0), (x + 0.8, *v)],
            stroke.stroke_width(stroke_width),
        )
    }))?;
    root.present()?;
    Ok(())
}

fn build_html(
    summaries: &[UserSummary],
    chart: Option<&BarChartSpec>,
    chart_file: Option<&str>,
    generated: DateTime<Local>,
) -> Markup {
    html! {
        html {
            head { meta charset="utf-8"; title { "Health Challenge Report" } }
            body {
                h1 { "Health Challenge Report" }
                p { "Generated " (generated.format("%Y-%m-%d %H:%M")) }
                table border="1" {
                    tr { th { "Name" } th { "Number of Workouts" } th { "Total Workout Minutes" } }
                    @for row in summaries {
                        tr {
                            td { (row.user_name) }
                            td { (row.workouts) }
                            td { (row.total_minutes) }
                        }
                    }
                }
                @if let Some(spec) = chart {
                    h2 { (spec.title) }
                    @match chart_file {
                        Some(file) => { img src=(file); }
                        None => { p { "Chart unavailable" } }
                    }
                }
            }
        }
    }
}
