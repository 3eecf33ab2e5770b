//! Bar-chart planning and rendering.
//!
//! A [`BarPlan`] fixes everything about the picture (labels, values,
//! colors, axis text) before anything is drawn; [`render::render_png`]
//! turns it into a PNG on disk.

pub mod render;

use crate::color::{bar_colors, BarColor, StyleMode};
use crate::data::model::{Sample, SAMPLE_CAP};

pub use render::render_png;

/// Largest magnitude the value axis reaches; keeps `hi - lo` finite.
pub const AXIS_LIMIT: f64 = f64::MAX / 4.0;

/// Axis text and coloring for one chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartSpec {
    pub style: StyleMode,
    pub x_label: String,
    pub y_label: String,
    pub title: Option<String>,
}

impl ChartSpec {
    pub fn new(style: StyleMode, x_label: impl Into<String>, y_label: impl Into<String>) -> Self {
        ChartSpec {
            style,
            x_label: x_label.into(),
            y_label: y_label.into(),
            title: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// One bar of the chart.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub label: String,
    pub value: f64,
    pub color: BarColor,
}

/// Everything needed to draw the chart.
#[derive(Debug, Clone, PartialEq)]
pub struct BarPlan {
    pub bars: Vec<Bar>,
    pub x_label: String,
    pub y_label: String,
    pub title: Option<String>,
}

impl BarPlan {
    /// Colors the first [`SAMPLE_CAP`] records of `sample` under `spec.style`.
    pub fn build(sample: &Sample, spec: &ChartSpec) -> Self {
        let records = &sample.records()[..sample.len().min(SAMPLE_CAP)];
        let values: Vec<f64> = records.iter().map(|r| r.value).collect();
        let colors = bar_colors(spec.style, &values);

        let bars = records
            .iter()
            .zip(colors)
            .map(|(r, color)| Bar {
                label: r.label.clone(),
                value: r.value,
                color,
            })
            .collect();

        BarPlan {
            bars,
            x_label: spec.x_label.clone(),
            y_label: spec.y_label.clone(),
            title: spec.title.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Value axis bounds: always includes zero, with a little headroom,
    /// and never wider than `±AXIS_LIMIT`.
    pub fn value_range(&self) -> (f64, f64) {
        let min = self.bars.iter().map(|b| b.value).fold(0.0, f64::min);
        let max = self.bars.iter().map(|b| b.value).fold(0.0, f64::max);
        let half_span = max / 2.0 - min / 2.0;
        let pad = if half_span > 0.0 { half_span * 0.1 } else { 0.05 };
        let lo = if min < 0.0 { min - pad } else { 0.0 };
        let hi = if max > 0.0 || min >= 0.0 { max + pad } else { 0.0 };
        let (lo, hi) = (lo.max(-AXIS_LIMIT), hi.min(AXIS_LIMIT));
        (lo, if hi > lo { hi } else { lo + 1.0 })
    }
}
