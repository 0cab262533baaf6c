//! Renderer-agnostic plot descriptors.
//!
//! A [`PlotDescriptor`] says what to draw, never how: no colours, sizes or
//! bin widths. Histograms carry raw observations and leave binning to the
//! renderer.
//!
//! | Method | Kind | Series |
//! |---|---|---|
//! | `t_test`, `anova` | [`PlotKind::Histogram`] | one per group |
//! | `regression` | [`PlotKind::Scatter`] | observed points, fitted line |
//! | `correlation` | [`PlotKind::Scatter`] | observed points |
//! | `time_series` | [`PlotKind::Line`] | values against row index |
//! | `chi_square` | [`PlotKind::StackedBar`] | one per secondary label |
//!
//! The other methods produce no plot.

use crate::config::GroupPolicy;
use crate::dataset::DatasetView;
use crate::hypothesis::ContingencyTable;
use crate::registry::Method;
use crate::request::AnalysisRequest;
use crate::result::ResultRecord;
use crate::validate::{validate_with, Prepared, Sample};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlotKind {
    Histogram,
    Scatter,
    Line,
    StackedBar,
}

/// How a series is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesMode {
    Markers,
    Line,
    Bars,
    /// Raw observations to be binned by the renderer.
    Bins,
}

/// One named data series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub name: String,
    /// Group label for multi-series kinds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    pub mode: SeriesMode,
    /// Absent for histograms and bar charts, whose x positions are the
    /// observations themselves or the descriptor's categories.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<Vec<f64>>,
    pub y: Vec<f64>,
}

/// Structural description of a plot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotDescriptor {
    pub kind: PlotKind,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    /// Category axis of bar charts, empty otherwise.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    pub series: Vec<Series>,
}

impl PlotDescriptor {
    /// Total number of plotted values across all series.
    pub fn point_count(&self) -> usize {
        self.series.iter().map(|s| s.y.len()).sum()
    }
}

/// Builds the plot for a finished analysis.
///
/// Returns `None` when the method has no plot or when `request` does not
/// validate against `dataset`.
///
/// # Examples
/// ```
/// use u_analysis::dataset::DatasetView;
/// use u_analysis::engine::Engine;
/// use u_analysis::plot::{build, PlotKind};
/// use u_analysis::request::AnalysisRequest;
///
/// let ds = DatasetView::from_text_columns(vec![("X", vec!["3", "1", "2"])]).unwrap();
/// let req = AnalysisRequest::new("time_series", "X");
/// let record = Engine::default().analyze(&ds, &req).unwrap();
/// let plot = build(&ds, &req, &record).unwrap();
/// assert_eq!(plot.kind, PlotKind::Line);
/// assert_eq!(plot.series[0].y, vec![3.0, 1.0, 2.0]);
/// ```
pub fn build(
    dataset: &DatasetView,
    request: &AnalysisRequest,
    result: &ResultRecord,
) -> Option<PlotDescriptor> {
    if !result.method().spec().produces_plot {
        return None;
    }
    // Exactly-two-group methods with a plot were either run under the
    // first-two policy or had exactly two groups.
    let prepared = match validate_with(dataset, request, GroupPolicy::FirstTwo) {
        Ok(prepared) => prepared,
        Err(err) => {
            debug!(method = result.method().id(), error = %err, "no plot: request does not validate");
            return None;
        }
    };
    from_prepared(&prepared, result)
}

/// Builds the plot from an already validated request.
pub fn from_prepared(prepared: &Prepared, result: &ResultRecord) -> Option<PlotDescriptor> {
    let method = prepared.method();
    if method != result.method() {
        debug!(
            request = method.id(),
            result = result.method().id(),
            "no plot: request and result name different methods"
        );
        return None;
    }
    if !method.spec().produces_plot {
        return None;
    }
    let primary = prepared.primary();
    let secondary = prepared.secondary().unwrap_or_default();

    let plot = match (method, prepared.sample()) {
        (Method::TTest | Method::Anova, Sample::Groups(groups)) => PlotDescriptor {
            kind: PlotKind::Histogram,
            title: format!("{}: {secondary} by {primary}", method.display_name()),
            x_label: secondary.to_string(),
            y_label: "Frequency".to_string(),
            categories: Vec::new(),
            series: groups
                .iter()
                .map(|g| Series {
                    name: g.label.clone(),
                    group: Some(g.label.clone()),
                    mode: SeriesMode::Bins,
                    x: None,
                    y: g.values.clone(),
                })
                .collect(),
        },
        (Method::Regression | Method::Correlation, Sample::Paired { x, y }) => {
            let mut series = vec![Series {
                name: "observed".to_string(),
                group: None,
                mode: SeriesMode::Markers,
                x: Some(x.clone()),
                y: y.clone(),
            }];
            if let Some(fit) = result.fit().filter(|_| method == Method::Regression) {
                let mut xs = x.clone();
                xs.sort_by(f64::total_cmp);
                let ys = xs.iter().map(|&v| fit.predict(v)).collect();
                series.push(Series {
                    name: "fitted".to_string(),
                    group: None,
                    mode: SeriesMode::Line,
                    x: Some(xs),
                    y: ys,
                });
            }
            PlotDescriptor {
                kind: PlotKind::Scatter,
                title: format!("{}: {secondary} vs {primary}", method.display_name()),
                x_label: primary.to_string(),
                y_label: secondary.to_string(),
                categories: Vec::new(),
                series,
            }
        }
        (Method::TimeSeries, Sample::Series { rows, values }) => PlotDescriptor {
            kind: PlotKind::Line,
            title: format!("{}: {primary}", method.display_name()),
            x_label: "Row".to_string(),
            y_label: primary.to_string(),
            categories: Vec::new(),
            series: vec![Series {
                name: primary.to_string(),
                group: None,
                mode: SeriesMode::Line,
                x: Some(rows.iter().map(|&i| i as f64).collect()),
                y: values.clone(),
            }],
        },
        (Method::ChiSquare, Sample::Labels { rows, cols }) => {
            let table = ContingencyTable::from_pairs(rows.as_slice(), cols.as_slice()).ok()?;
            let series = table
                .col_labels
                .iter()
                .enumerate()
                .map(|(j, label)| Series {
                    name: label.clone(),
                    group: Some(label.clone()),
                    mode: SeriesMode::Bars,
                    x: None,
                    y: table.counts.iter().map(|row| row[j]).collect(),
                })
                .collect();
            PlotDescriptor {
                kind: PlotKind::StackedBar,
                title: format!("{}: {primary} by {secondary}", method.display_name()),
                x_label: primary.to_string(),
                y_label: "Count".to_string(),
                categories: table.row_labels,
                series,
            }
        }
        (method, _) => {
            debug!(method = method.id(), "no plot for sample shape");
            return None;
        }
    };
    debug!(
        method = method.id(),
        kind = ?plot.kind,
        series = plot.series.len(),
        "plot descriptor built"
    );
    Some(plot)
}
