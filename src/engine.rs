//! Facade over validation, dispatch and plot building.

use crate::config::EngineConfig;
use crate::dataset::DatasetView;
use crate::dispatch;
use crate::error::Result;
use crate::plot;
use crate::request::AnalysisRequest;
use crate::result::ResultRecord;
use crate::validate::{validate_with, Prepared};
use tracing::debug;

/// Stateless analysis engine.
///
/// Holds only its configuration; every call receives its dataset and
/// request and shares nothing with other calls, so one engine can serve
/// concurrent requests.
///
/// # Examples
/// ```
/// use u_analysis::dataset::DatasetView;
/// use u_analysis::engine::Engine;
/// use u_analysis::plot::PlotKind;
/// use u_analysis::request::AnalysisRequest;
/// use u_analysis::result::Decision;
///
/// let ds = DatasetView::from_text_columns(vec![
///     ("Group", vec!["A", "A", "B", "B"]),
///     ("Value", vec!["1", "2", "10", "11"]),
/// ])
/// .unwrap();
/// let record = Engine::default()
///     .analyze(&ds, &AnalysisRequest::pair("t_test", "Group", "Value"))
///     .unwrap();
/// assert_eq!(record.decision(), &Decision::RejectNull);
/// assert_eq!(record.plot().unwrap().kind, PlotKind::Histogram);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Checks `request` against `dataset` under the configured group policy.
    pub fn validate(&self, dataset: &DatasetView, request: &AnalysisRequest) -> Result<Prepared> {
        validate_with(dataset, request, self.config.group_policy)
    }

    /// Runs a validated request, attaching a plot when configured.
    pub fn run(&self, prepared: Prepared) -> Result<ResultRecord> {
        let mut record = dispatch::run(&prepared)?;
        if self.config.build_plots {
            record.attach_plot(plot::from_prepared(&prepared, &record));
        }
        Ok(record)
    }

    /// Validates and runs `request` in one step.
    pub fn analyze(&self, dataset: &DatasetView, request: &AnalysisRequest) -> Result<ResultRecord> {
        let prepared = self.validate(dataset, request)?;
        let record = self.run(prepared)?;
        debug!(
            method = record.method().id(),
            decision = %record.decision(),
            plot = record.plot().is_some(),
            "analysis complete"
        );
        Ok(record)
    }
}
