//! Routes a validated request to its statistical procedure and packages the
//! outcome as a [`ResultRecord`].
//!
//! One arm per [`Method`]; adding a method without a procedure is a compile
//! error. Statistics are rounded to 3 decimals and p-values to 4 before the
//! decision is taken, so the reported p-value and the decision never
//! disagree.

use crate::error::{AnalysisError, Result};
use crate::hypothesis::{
    chi_square_independence, f_oneway, kruskal, linear_regression, pearson, rank_sum,
    ttest_one_sample, ttest_pooled, wilcoxon_signed_rank, ContingencyTable, TestOutcome,
};
use crate::registry::Method;
use crate::result::{
    round_to, Decision, LinearFit, ResultRecord, P_VALUE_DECIMALS, STATISTIC_DECIMALS,
};
use crate::stats::mean;
use crate::validate::{Group, Prepared, Sample};
use tracing::debug;

/// Reference mean of the one-sample t-test.
pub const ONE_SAMPLE_REFERENCE: f64 = 0.0;

/// Runs the procedure for `prepared` and returns its result record, without
/// a plot.
///
/// # Errors
/// `DegenerateInput`, `InsufficientData` or `ComputationFailure` from the
/// procedure. Nothing is retained between calls.
///
/// # Examples
/// ```
/// use u_analysis::dataset::DatasetView;
/// use u_analysis::dispatch::run;
/// use u_analysis::request::AnalysisRequest;
/// use u_analysis::result::Decision;
/// use u_analysis::validate::validate;
///
/// let ds = DatasetView::from_text_columns(vec![
///     ("X", vec!["1", "2", "3"]),
///     ("Y", vec!["2", "4", "6"]),
/// ])
/// .unwrap();
/// let prepared = validate(&ds, &AnalysisRequest::pair("regression", "X", "Y")).unwrap();
/// let record = run(&prepared).unwrap();
/// assert_eq!(record.decision(), &Decision::Equation("y = 0.0 + 2.0x".into()));
/// ```
pub fn run(prepared: &Prepared) -> Result<ResultRecord> {
    let method = prepared.method();
    let primary = prepared.primary();
    let secondary = prepared.secondary().unwrap_or_default();
    debug!(method = method.id(), observations = prepared.sample().len(), "dispatching");

    match method {
        Method::OneSampleT => {
            let values = series(prepared)?;
            let out = ttest_one_sample(values, ONE_SAMPLE_REFERENCE)?;
            let centre = describe_mean(values);
            Ok(hypothesis(method, out, Decision::from_p_value, |reject, t, p| {
                let verdict = if reject {
                    "differs significantly"
                } else {
                    "does not differ significantly"
                };
                format!(
                    "The mean of '{primary}' ({centre}) {verdict} from {ONE_SAMPLE_REFERENCE:?} (t = {t}, p = {p})."
                )
            }))
        }
        Method::TTest => {
            let (a, b) = two_groups(prepared)?;
            let out = ttest_pooled(&a.values, &b.values)?;
            Ok(hypothesis(method, out, Decision::from_p_value, |reject, t, p| {
                format!(
                    "'{secondary}' {} between '{}' (mean {}) and '{}' (mean {}) of '{primary}' (t = {t}, p = {p}).",
                    differs(reject),
                    a.label,
                    describe_mean(&a.values),
                    b.label,
                    describe_mean(&b.values)
                )
            }))
        }
        Method::Anova => {
            let groups = groups(prepared)?;
            let out = f_oneway(&slices(groups))?;
            Ok(hypothesis(method, out, Decision::from_p_value, |reject, f, p| {
                format!(
                    "Means of '{secondary}' across the {} groups of '{primary}' {} (F = {f}, p = {p}).",
                    groups.len(),
                    if reject { "differ significantly" } else { "do not differ significantly" }
                )
            }))
        }
        Method::KruskalWallis => {
            let groups = groups(prepared)?;
            let out = kruskal(&slices(groups))?;
            Ok(hypothesis(method, out, Decision::from_p_value, |reject, h, p| {
                format!(
                    "Distributions of '{secondary}' across the {} groups of '{primary}' {} (H = {h}, p = {p}).",
                    groups.len(),
                    if reject { "differ significantly" } else { "do not differ significantly" }
                )
            }))
        }
        Method::Wilcoxon => match prepared.sample() {
            Sample::Paired { x, y } => {
                debug!(pairs = x.len(), "wilcoxon: paired signed-rank");
                let out = wilcoxon_signed_rank(x, y)?;
                Ok(hypothesis(method, out, Decision::from_p_value, |reject, w, p| {
                    format!(
                        "Paired values of '{primary}' and '{secondary}' {} (W = {w}, p = {p}).",
                        if reject { "differ significantly" } else { "do not differ significantly" }
                    )
                }))
            }
            _ => {
                debug!("wilcoxon: two-sample rank-sum");
                let (a, b) = two_groups(prepared)?;
                let out = rank_sum(&a.values, &b.values)?;
                Ok(hypothesis(method, out, Decision::from_p_value, |reject, z, p| {
                    format!(
                        "'{secondary}' {} between '{}' and '{}' of '{primary}' (z = {z}, p = {p}).",
                        differs(reject),
                        a.label,
                        b.label
                    )
                }))
            }
        },
        Method::Correlation => {
            let (x, y) = paired(prepared)?;
            let out = pearson(x, y)?;
            Ok(hypothesis(method, out, Decision::significance, |reject, r, p| {
                format!(
                    "'{primary}' and '{secondary}' are {} (r = {r}, p = {p}).",
                    if reject {
                        "significantly correlated"
                    } else {
                        "not significantly correlated"
                    }
                )
            }))
        }
        Method::Regression => {
            let (x, y) = paired(prepared)?;
            let raw = linear_regression(x, y)?;
            let fit = LinearFit {
                slope: round_to(raw.slope, STATISTIC_DECIMALS),
                intercept: round_to(raw.intercept, STATISTIC_DECIMALS),
                r_squared: round_to(raw.r_squared, P_VALUE_DECIMALS),
                slope_p_value: round_to(raw.p_value, P_VALUE_DECIMALS),
            };
            debug!(r_squared = fit.r_squared, slope_p = fit.slope_p_value, "regression fitted");
            let interpretation = format!(
                "'{secondary}' = {:?} + {:?} × '{primary}' (R² = {:?}, slope p = {:?}).",
                fit.intercept, fit.slope, fit.r_squared, fit.slope_p_value
            );
            // The p-value slot carries R².
            Ok(ResultRecord::tested(
                method,
                fit.slope,
                fit.r_squared,
                Decision::equation(fit.intercept, fit.slope),
                interpretation,
            )
            .with_fit(fit))
        }
        Method::ChiSquare => {
            let (rows, cols) = labels(prepared)?;
            let table = ContingencyTable::from_pairs(rows.as_slice(), cols.as_slice())?;
            debug!(
                rows = table.row_labels.len(),
                cols = table.col_labels.len(),
                "chi-square: contingency table built"
            );
            let df = (table.row_labels.len() - 1) * (table.col_labels.len() - 1);
            let out = chi_square_independence(&table)?;
            Ok(hypothesis(method, out, Decision::from_p_value, |reject, chi2, p| {
                format!(
                    "'{primary}' and '{secondary}' are {} (χ² = {chi2}, df = {df}, p = {p}).",
                    if reject { "associated" } else { "not significantly associated" }
                )
            }))
        }
        Method::TimeSeries => {
            let values = series(prepared)?;
            Ok(ResultRecord::descriptive(
                method,
                Decision::NotApplicable,
                format!("{} observations of '{primary}' in row order.", values.len()),
            ))
        }
    }
}

/// Rounds the outcome, takes the decision on the rounded p-value and
/// builds the interpretation from the reported numbers.
fn hypothesis(
    method: Method,
    out: TestOutcome,
    rule: fn(f64) -> Decision,
    describe: impl FnOnce(bool, f64, f64) -> String,
) -> ResultRecord {
    let statistic = round_to(out.statistic, STATISTIC_DECIMALS);
    let p_value = round_to(out.p_value, P_VALUE_DECIMALS);
    let decision = rule(p_value);
    debug!(method = method.id(), statistic, p_value, %decision, "procedure finished");
    let interpretation = describe(decision.is_rejection(), statistic, p_value);
    ResultRecord::tested(method, statistic, p_value, decision, interpretation)
}

fn differs(reject: bool) -> &'static str {
    if reject {
        "differs significantly"
    } else {
        "does not differ significantly"
    }
}

fn describe_mean(values: &[f64]) -> String {
    match mean(values) {
        Some(m) => format!("{:?}", round_to(m, STATISTIC_DECIMALS)),
        None => "n/a".to_string(),
    }
}

fn slices(groups: &[Group]) -> Vec<&[f64]> {
    groups.iter().map(|g| g.values.as_slice()).collect()
}

fn shape_mismatch(prepared: &Prepared, expected: &str) -> AnalysisError {
    AnalysisError::ComputationFailure(format!(
        "{} expects a {expected} sample",
        prepared.method().id()
    ))
}

fn series(prepared: &Prepared) -> Result<&[f64]> {
    match prepared.sample() {
        Sample::Series { values, .. } => Ok(values.as_slice()),
        _ => Err(shape_mismatch(prepared, "single-column")),
    }
}

fn paired(prepared: &Prepared) -> Result<(&[f64], &[f64])> {
    match prepared.sample() {
        Sample::Paired { x, y } => Ok((x.as_slice(), y.as_slice())),
        _ => Err(shape_mismatch(prepared, "paired numeric")),
    }
}

fn groups(prepared: &Prepared) -> Result<&[Group]> {
    match prepared.sample() {
        Sample::Groups(groups) => Ok(groups.as_slice()),
        _ => Err(shape_mismatch(prepared, "grouped")),
    }
}

fn two_groups(prepared: &Prepared) -> Result<(&Group, &Group)> {
    match groups(prepared)? {
        [a, b] => Ok((a, b)),
        other => Err(AnalysisError::ComputationFailure(format!(
            "{} compares two groups, got {}",
            prepared.method().id(),
            other.len()
        ))),
    }
}

fn labels(prepared: &Prepared) -> Result<(&Vec<String>, &Vec<String>)> {
    match prepared.sample() {
        Sample::Labels { rows, cols } => Ok((rows, cols)),
        _ => Err(shape_mismatch(prepared, "label pair")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::DatasetView;
    use crate::error::ErrorKind;
    use crate::request::AnalysisRequest;
    use crate::validate::validate;

    fn analyze(columns: Vec<(&str, Vec<&str>)>, request: AnalysisRequest) -> Result<ResultRecord> {
        let ds = DatasetView::from_text_columns(columns).unwrap();
        run(&validate(&ds, &request)?)
    }

    #[test]
    fn test_t_test_scenario() {
        let rec = analyze(
            vec![
                ("Group", vec!["A", "A", "B", "B"]),
                ("Value", vec!["1", "2", "10", "11"]),
            ],
            AnalysisRequest::pair("t_test", "Group", "Value"),
        )
        .unwrap();
        assert_eq!(rec.statistic(), Some(-12.728));
        assert!(rec.p_value().unwrap() < 0.01);
        assert_eq!(rec.decision(), &Decision::RejectNull);
        assert!(rec.interpretation().contains("'A'"));
        assert!(rec.interpretation().contains("'B'"));
    }

    #[test]
    fn test_reported_numbers_are_rounded_once() {
        let rec = analyze(
            vec![
                ("Group", vec!["A", "A", "B", "B"]),
                ("Value", vec!["1", "2", "10", "11"]),
            ],
            AnalysisRequest::pair("t_test", "Group", "Value"),
        )
        .unwrap();
        let (t, p) = (rec.statistic().unwrap(), rec.p_value().unwrap());
        assert_eq!(p, 0.0061);
        assert_eq!(round_to(t, STATISTIC_DECIMALS), t);
        assert_eq!(round_to(p, P_VALUE_DECIMALS), p);
        assert!(
            rec.interpretation().contains(&format!("t = {t}, p = {p}")),
            "{}",
            rec.interpretation()
        );
    }

    #[test]
    fn test_t_test_zero_variance_is_degenerate() {
        let err = analyze(
            vec![
                ("Group", vec!["A", "A", "B", "B"]),
                ("Value", vec!["1", "1", "2", "2"]),
            ],
            AnalysisRequest::pair("t_test", "Group", "Value"),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DegenerateInput);
    }

    #[test]
    fn test_one_sample_against_zero() {
        let rec = analyze(
            vec![("X", vec!["1", "2", "3", "4", "5"])],
            AnalysisRequest::new("one_sample_t", "X"),
        )
        .unwrap();
        assert_eq!(rec.statistic(), Some(4.243));
        assert_eq!(rec.decision(), &Decision::RejectNull);
        assert!(rec.plot().is_none());
    }

    #[test]
    fn test_anova_statistic() {
        let rec = analyze(
            vec![
                ("G", vec!["a", "a", "a", "b", "b", "b"]),
                ("V", vec!["1", "2", "3", "4", "5", "6"]),
            ],
            AnalysisRequest::pair("anova", "G", "V"),
        )
        .unwrap();
        assert_eq!(rec.statistic(), Some(13.5));
        assert_eq!(rec.decision(), &Decision::RejectNull);
    }

    #[test]
    fn test_kruskal_statistic() {
        let rec = analyze(
            vec![
                ("G", vec!["a", "a", "a", "b", "b", "b"]),
                ("V", vec!["1", "2", "3", "4", "5", "6"]),
            ],
            AnalysisRequest::pair("kruskal_wallis", "G", "V"),
        )
        .unwrap();
        assert_eq!(rec.statistic(), Some(3.857));
        let p = rec.p_value().unwrap();
        assert!(p > 0.04 && p < 0.06, "p = {p}");
    }

    #[test]
    fn test_wilcoxon_paired_exact() {
        let rec = analyze(
            vec![
                ("Before", vec!["10", "20", "30", "40", "50", "60", "70", "80"]),
                ("After", vec!["9", "18", "27", "36", "45", "54", "63", "72"]),
            ],
            AnalysisRequest::pair("wilcoxon", "Before", "After"),
        )
        .unwrap();
        assert_eq!(rec.statistic(), Some(0.0));
        assert_eq!(rec.p_value(), Some(0.0078));
        assert_eq!(rec.decision(), &Decision::RejectNull);
    }

    #[test]
    fn test_wilcoxon_grouped_rank_sum() {
        let rec = analyze(
            vec![
                ("G", vec!["a", "a", "a", "b", "b", "b"]),
                ("V", vec!["1", "2", "3", "4", "5", "6"]),
            ],
            AnalysisRequest::pair("wilcoxon", "G", "V"),
        )
        .unwrap();
        assert!(rec.statistic().unwrap() < 0.0);
        let p = rec.p_value().unwrap();
        assert_eq!(rec.decision(), &Decision::from_p_value(p));
    }

    #[test]
    fn test_correlation_labels() {
        let rec = analyze(
            vec![
                ("X", vec!["1", "2", "3", "4", "5"]),
                ("Y", vec!["2", "4", "5", "4", "5"]),
            ],
            AnalysisRequest::pair("correlation", "X", "Y"),
        )
        .unwrap();
        assert_eq!(rec.statistic(), Some(0.775));
        assert_eq!(rec.decision(), &Decision::NotSignificant);
    }

    #[test]
    fn test_correlation_needs_three_pairs() {
        let err = analyze(
            vec![("X", vec!["1", "2"]), ("Y", vec!["2", "5"])],
            AnalysisRequest::pair("correlation", "X", "Y"),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientData);
    }

    #[test]
    fn test_regression_scenario() {
        let rec = analyze(
            vec![("X", vec!["1", "2", "3"]), ("Y", vec!["2", "4", "6"])],
            AnalysisRequest::pair("regression", "X", "Y"),
        )
        .unwrap();
        assert_eq!(rec.decision(), &Decision::Equation("y = 0.0 + 2.0x".into()));
        assert_eq!(rec.statistic(), Some(2.0));
        let fit = rec.fit().unwrap();
        assert_eq!(fit.slope, 2.0);
        assert_eq!(fit.intercept, 0.0);
        assert_eq!(fit.r_squared, 1.0);
        assert_eq!(rec.p_value(), Some(fit.r_squared));
    }

    #[test]
    fn test_regression_reports_r_squared_in_p_value() {
        let rec = analyze(
            vec![
                ("X", vec!["1", "2", "3", "4", "5"]),
                ("Y", vec!["2", "4", "5", "4", "5"]),
            ],
            AnalysisRequest::pair("regression", "X", "Y"),
        )
        .unwrap();
        assert_eq!(rec.statistic(), Some(0.6));
        assert_eq!(rec.p_value(), Some(0.6));
        assert_eq!(rec.decision(), &Decision::Equation("y = 2.2 + 0.6x".into()));
        let fit = rec.fit().unwrap();
        assert_eq!(fit.r_squared, 0.6);
        // slope t = 0.6 / sqrt(0.8 / 10) on 3 df
        assert!((fit.slope_p_value - 0.1240).abs() < 5e-4, "{}", fit.slope_p_value);
    }

    #[test]
    fn test_regression_constant_x_is_degenerate() {
        let err = analyze(
            vec![("X", vec!["1", "1", "1"]), ("Y", vec!["2", "4", "6"])],
            AnalysisRequest::pair("regression", "X", "Y"),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DegenerateInput);
    }

    #[test]
    fn test_chi_square_scenario() {
        let rec = analyze(
            vec![("A", vec!["1", "1", "2", "2"]), ("B", vec!["1", "1", "2", "2"])],
            AnalysisRequest::pair("chi_square", "A", "B"),
        )
        .unwrap();
        assert_eq!(rec.statistic(), Some(4.0));
        assert_eq!(rec.p_value(), Some(0.0455));
        assert_eq!(rec.decision(), &Decision::RejectNull);
        assert!(rec.interpretation().contains("df = 1"));
    }

    #[test]
    fn test_chi_square_single_category_is_degenerate() {
        let err = analyze(
            vec![("A", vec!["x", "x", "x"]), ("B", vec!["u", "v", "u"])],
            AnalysisRequest::pair("chi_square", "A", "B"),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DegenerateInput);
    }

    #[test]
    fn test_time_series_is_descriptive() {
        let rec = analyze(
            vec![("X", vec!["1", "2", "3", "4", "5"])],
            AnalysisRequest::new("time_series", "X"),
        )
        .unwrap();
        assert_eq!(rec.statistic(), None);
        assert_eq!(rec.p_value(), None);
        assert_eq!(rec.decision(), &Decision::NotApplicable);
    }
}
