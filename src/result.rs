//! Uniform output record shared by every method.

use crate::plot::PlotDescriptor;
use crate::registry::Method;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed significance level.
pub const ALPHA: f64 = 0.05;

/// Decimal places kept for a reported statistic.
pub const STATISTIC_DECIMALS: i32 = 3;

/// Decimal places kept for a reported p-value.
pub const P_VALUE_DECIMALS: i32 = 4;

/// Rounds half away from zero to `decimals` places; `-0.0` becomes `0.0`.
///
/// # Examples
/// ```
/// use u_analysis::result::round_to;
/// assert_eq!(round_to(0.049_96, 4), 0.05);
/// assert_eq!(round_to(-12.72792, 3), -12.728);
/// assert!(round_to(-0.0001, 3).is_sign_positive());
/// ```
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale + 0.0
}

/// Outcome label of an analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    RejectNull,
    FailToRejectNull,
    /// No hypothesis is tested.
    NotApplicable,
    Significant,
    NotSignificant,
    /// Fitted equation, e.g. `y = 0.0 + 2.0x`.
    Equation(String),
}

impl Decision {
    /// Reject/fail-to-reject label for an already rounded p-value.
    ///
    /// # Examples
    /// ```
    /// use u_analysis::result::Decision;
    /// assert_eq!(Decision::from_p_value(0.0499), Decision::RejectNull);
    /// assert_eq!(Decision::from_p_value(0.0500), Decision::FailToRejectNull);
    /// ```
    pub fn from_p_value(p_value: f64) -> Self {
        if p_value < ALPHA {
            Decision::RejectNull
        } else {
            Decision::FailToRejectNull
        }
    }

    /// Significant/not-significant label for an association measure.
    pub fn significance(p_value: f64) -> Self {
        if p_value < ALPHA {
            Decision::Significant
        } else {
            Decision::NotSignificant
        }
    }

    /// `y = <intercept> + <slope>x` with shortest round-trip formatting.
    pub fn equation(intercept: f64, slope: f64) -> Self {
        Decision::Equation(format!("y = {intercept:?} + {slope:?}x"))
    }

    pub fn is_rejection(&self) -> bool {
        matches!(self, Decision::RejectNull | Decision::Significant)
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::RejectNull => f.write_str("reject null hypothesis"),
            Decision::FailToRejectNull => f.write_str("fail to reject null hypothesis"),
            Decision::NotApplicable => f.write_str("not applicable"),
            Decision::Significant => f.write_str("significant"),
            Decision::NotSignificant => f.write_str("not significant"),
            Decision::Equation(text) => f.write_str(text),
        }
    }
}

/// Rounded coefficients of a fitted line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    /// Also reported in the record's p-value slot.
    pub r_squared: f64,
    /// Two-sided p-value of the slope.
    pub slope_p_value: f64,
}

impl LinearFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

/// One analysis result.
///
/// `statistic` and `p_value` are either both present or both absent; the
/// constructors are the only way to set them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    method: Method,
    statistic: Option<f64>,
    p_value: Option<f64>,
    decision: Decision,
    interpretation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fit: Option<LinearFit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    plot: Option<PlotDescriptor>,
}

impl ResultRecord {
    /// Record for a test. `statistic` and `p_value` are stored as given and
    /// must already be rounded to [`STATISTIC_DECIMALS`] and
    /// [`P_VALUE_DECIMALS`]; the decision was taken on that same p-value.
    pub fn tested(
        method: Method,
        statistic: f64,
        p_value: f64,
        decision: Decision,
        interpretation: String,
    ) -> Self {
        Self {
            method,
            statistic: Some(statistic),
            p_value: Some(p_value),
            decision,
            interpretation,
            fit: None,
            plot: None,
        }
    }

    /// Record with no statistic and no p-value.
    pub fn descriptive(method: Method, decision: Decision, interpretation: String) -> Self {
        Self {
            method,
            statistic: None,
            p_value: None,
            decision,
            interpretation,
            fit: None,
            plot: None,
        }
    }

    pub(crate) fn with_fit(mut self, fit: LinearFit) -> Self {
        self.fit = Some(fit);
        self
    }

    pub(crate) fn attach_plot(&mut self, plot: Option<PlotDescriptor>) {
        self.plot = plot;
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn statistic(&self) -> Option<f64> {
        self.statistic
    }

    pub fn p_value(&self) -> Option<f64> {
        self.p_value
    }

    pub fn decision(&self) -> &Decision {
        &self.decision
    }

    pub fn interpretation(&self) -> &str {
        &self.interpretation
    }

    pub fn fit(&self) -> Option<&LinearFit> {
        self.fit.as_ref()
    }

    pub fn plot(&self) -> Option<&PlotDescriptor> {
        self.plot.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_half_away_from_zero() {
        assert_eq!(round_to(2.5, 0), 3.0);
        assert_eq!(round_to(-2.5, 0), -3.0);
        assert_eq!(round_to(1.23456, 3), 1.235);
        assert_eq!(round_to(0.000_04, 4), 0.0);
    }

    #[test]
    fn test_negative_zero_normalized() {
        let r = round_to(-0.000_01, 3);
        assert_eq!(r, 0.0);
        assert!(r.is_sign_positive());
    }

    #[test]
    fn test_threshold_boundary() {
        assert_eq!(Decision::from_p_value(round_to(0.05, 4)), Decision::FailToRejectNull);
        assert_eq!(Decision::from_p_value(round_to(0.0499, 4)), Decision::RejectNull);
        // 0.049_96 reports as 0.0500, and the decision follows the report
        assert_eq!(
            Decision::from_p_value(round_to(0.049_96, 4)),
            Decision::FailToRejectNull
        );
        assert_eq!(Decision::significance(0.0499), Decision::Significant);
        assert_eq!(Decision::significance(0.05), Decision::NotSignificant);
    }

    #[test]
    fn test_equation_text() {
        assert_eq!(
            Decision::equation(0.0, 2.0),
            Decision::Equation("y = 0.0 + 2.0x".into())
        );
        assert_eq!(Decision::equation(-1.5, 0.25).to_string(), "y = -1.5 + 0.25x");
    }

    #[test]
    fn test_tested_record_keeps_reported_values() {
        let statistic = round_to(-12.727_922, STATISTIC_DECIMALS);
        let p_value = round_to(0.006_116_7, P_VALUE_DECIMALS);
        let rec = ResultRecord::tested(
            Method::TTest,
            statistic,
            p_value,
            Decision::from_p_value(p_value),
            format!("p = {p_value}"),
        );
        assert_eq!(rec.statistic(), Some(-12.728));
        assert_eq!(rec.p_value(), Some(0.0061));
        assert_eq!(rec.interpretation(), "p = 0.0061");

        // a reported 0.0500 stays 0.0500 and keeps its decision
        let rec = ResultRecord::tested(
            Method::TTest,
            1.0,
            0.05,
            Decision::from_p_value(0.05),
            String::new(),
        );
        assert_eq!(rec.p_value(), Some(0.05));
        assert_eq!(rec.decision(), &Decision::FailToRejectNull);
    }

    #[test]
    fn test_descriptive_record_has_neither() {
        let rec = ResultRecord::descriptive(Method::TimeSeries, Decision::NotApplicable, "x".into());
        assert!(rec.statistic().is_none() && rec.p_value().is_none());
        assert_eq!(rec.decision(), &Decision::NotApplicable);
    }

    #[test]
    fn test_json_shape() {
        let rec = ResultRecord::descriptive(Method::TimeSeries, Decision::NotApplicable, "x".into());
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["method"], "time_series");
        assert!(json["statistic"].is_null());
        assert!(json["p_value"].is_null());
        assert_eq!(json["decision"], "NotApplicable");
        assert!(json.get("plot").is_none());
    }

    #[test]
    fn test_fit_predict() {
        let fit = LinearFit {
            slope: 2.0,
            intercept: 1.0,
            r_squared: 1.0,
            slope_p_value: 0.0,
        };
        assert_eq!(fit.predict(3.0), 7.0);
    }
}
