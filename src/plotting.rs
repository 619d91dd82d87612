use egui::{Color32, Stroke};
use egui_plot::{Bar, BarChart, Legend, Plot};

use crate::workout::WorkoutType;

/// Colors and axis behaviour for a bar chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartStyle {
    pub dataset_label: String,
    pub fill: Color32,
    pub stroke: Color32,
    pub stroke_width: f32,
    pub begin_at_zero: bool,
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            dataset_label: "Workout Minutes".to_owned(),
            fill: Color32::from_rgba_unmultiplied(54, 162, 235, 128),
            stroke: Color32::from_rgb(54, 162, 235),
            stroke_width: 3.0,
            begin_at_zero: true,
        }
    }
}

/// Everything needed to draw one bar chart.
#[derive(Debug, Clone, PartialEq)]
pub struct BarChartSpec {
    pub title: String,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    pub style: ChartStyle,
}

impl BarChartSpec {
    /// Chart of a user's minutes per workout type.
    pub fn minutes_by_type(user_name: &str, aggregate: &[(WorkoutType, u64)]) -> Self {
        Self {
            title: format!("{user_name}'s workout progress"),
            labels: aggregate.iter().map(|(t, _)| t.label().to_owned()).collect(),
            values: aggregate.iter().map(|(_, m)| *m as f64).collect(),
            style: ChartStyle::default(),
        }
    }

    pub fn max_value(&self) -> f64 {
        self.values.iter().copied().fold(0.0, f64::max)
    }
}

/// Something that can display a single bar chart at a time.
///
/// Callers must [`destroy`](ChartRenderer::destroy) the previous chart before
/// rendering a new one.
pub trait ChartRenderer {
    fn destroy(&mut self);
    fn render(&mut self, chart: BarChartSpec);
}

/// Build the egui_plot bars for a chart spec, one bar per label.
pub fn bars_for(spec: &BarChartSpec) -> Vec<Bar> {
    let stroke = Stroke::new(spec.style.stroke_width, spec.style.stroke);
    spec.labels
        .iter()
        .zip(&spec.values)
        .enumerate()
        .map(|(idx, (label, value))| {
            Bar::new(idx as f64, *value)
                .name(label)
                .width(0.6)
                .fill(spec.style.fill)
                .stroke(stroke)
        })
        .collect()
}

/// Bar chart drawn with egui_plot.
#[derive(Debug, Default)]
pub struct PlotChart {
    current: Option<BarChartSpec>,
    generation: u64,
}

impl ChartRenderer for PlotChart {
    fn destroy(&mut self) {
        if self.current.take().is_some() {
            // A new plot id drops the bounds egui remembered for the old chart.
            self.generation += 1;
        }
    }

    fn render(&mut self, chart: BarChartSpec) {
        log::info!("Rendering chart '{}' with {} bars", chart.title, chart.labels.len());
        self.current = Some(chart);
    }
}

impl PlotChart {
    pub fn current(&self) -> Option<&BarChartSpec> {
        self.current.as_ref()
    }

    pub fn show(&self, ui: &mut egui::Ui, height: f32) {
        let Some(spec) = &self.current else {
            return;
        };
        let labels = spec.labels.clone();
        let mut plot = Plot::new(("minutes_by_type", self.generation))
            .height(height)
            .legend(Legend::default())
            .allow_drag(false)
            .allow_scroll(false)
            .allow_zoom(false)
            .x_axis_formatter(move |mark, _chars, _| {
                let idx = mark.value.round();
                if (mark.value - idx).abs() > 1e-6 || idx < 0.0 {
                    return String::new();
                }
                labels.get(idx as usize).cloned().unwrap_or_default()
            });
        if spec.style.begin_at_zero {
            plot = plot.include_y(0.0);
        }
        let chart = BarChart::new(bars_for(spec))
            .name(&spec.style.dataset_label)
            .color(spec.style.stroke);
        plot.show(ui, |plot_ui| plot_ui.bar_chart(chart));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn john_spec() -> BarChartSpec {
        BarChartSpec::minutes_by_type(
            "John Doe",
            &[(WorkoutType::Running, 30), (WorkoutType::Cycling, 45)],
        )
    }

    #[test]
    fn spec_from_aggregate() {
        let spec = john_spec();
        assert_eq!(spec.title, "John Doe's workout progress");
        assert_eq!(spec.labels, vec!["Running", "Cycling"]);
        assert_eq!(spec.values, vec![30.0, 45.0]);
        assert_eq!(spec.max_value(), 45.0);
        assert_eq!(spec.style, ChartStyle::default());
    }

    #[test]
    fn bars_follow_label_order() {
        let bars = bars_for(&john_spec());
        let got: Vec<(f64, f64, &str)> = bars
            .iter()
            .map(|b| (b.argument, b.value, b.name.as_str()))
            .collect();
        assert_eq!(got, vec![(0.0, 30.0, "Running"), (1.0, 45.0, "Cycling")]);
        assert!(bars.iter().all(|b| b.stroke.width == 3.0));
    }

    #[test]
    fn destroy_then_render_replaces_chart() {
        let mut chart = PlotChart::default();
        chart.destroy();
        assert_eq!(chart.generation, 0);
        chart.render(john_spec());
        assert_eq!(chart.current(), Some(&john_spec()));

        chart.destroy();
        assert!(chart.current().is_none());
        assert_eq!(chart.generation, 1);
    }

    #[test]
    fn empty_spec_has_zero_max() {
        let spec = BarChartSpec::minutes_by_type("Nobody", &[]);
        assert!(bars_for(&spec).is_empty());
        assert_eq!(spec.max_value(), 0.0);
    }
}
