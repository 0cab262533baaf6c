//! Precondition checks run before any computation.
//!
//! [`validate`] checks a request against the dataset and the registry, in
//! this order, stopping at the first failure:
//!
//! 1. the method is known (`UnknownMethod`);
//! 2. the primary column exists (`MissingColumn`);
//! 3. the secondary column is given and exists when the method needs one
//!    (`MissingColumn`);
//! 4. column kinds match the registry (`ColumnTypeMismatch`);
//! 5. a grouping column has enough distinct non-missing values
//!    (`InsufficientGroups`, or `TooManyGroups` under [`GroupPolicy::Strict`]);
//! 6. after dropping incomplete rows, every group or column still has an
//!    observation (`InsufficientData`).
//!
//! On success it returns a [`Prepared`] request that owns the extracted,
//! missing-free sample. Validation only reads its inputs.

use crate::config::GroupPolicy;
use crate::dataset::{Column, DatasetView};
use crate::error::{AnalysisError, Result};
use crate::registry::{ColumnRole, GroupRequirement, Method, MethodSpec};
use crate::request::AnalysisRequest;
use tracing::{debug, warn};

/// Observations of one group, in row order.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub label: String,
    pub values: Vec<f64>,
}

/// Missing-free sample extracted for a method.
#[derive(Debug, Clone, PartialEq)]
pub enum Sample {
    /// One numeric column with the dataset row index of each value.
    Series { rows: Vec<usize>, values: Vec<f64> },
    /// Two row-aligned numeric columns.
    Paired { x: Vec<f64>, y: Vec<f64> },
    /// A numeric column partitioned by a grouping column, groups in
    /// first-seen order.
    Groups(Vec<Group>),
    /// Row-aligned labels of two columns, for cross-tabulation.
    Labels { rows: Vec<String>, cols: Vec<String> },
}

impl Sample {
    /// Number of complete observations.
    pub fn len(&self) -> usize {
        match self {
            Sample::Series { values, .. } => values.len(),
            Sample::Paired { x, .. } => x.len(),
            Sample::Groups(groups) => groups.iter().map(|g| g.values.len()).sum(),
            Sample::Labels { rows, .. } => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A request that passed validation. Consumed by the dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub struct Prepared {
    method: Method,
    primary: String,
    secondary: Option<String>,
    sample: Sample,
}

impl Prepared {
    pub fn method(&self) -> Method {
        self.method
    }

    pub fn primary(&self) -> &str {
        &self.primary
    }

    pub fn secondary(&self) -> Option<&str> {
        self.secondary.as_deref()
    }

    pub fn sample(&self) -> &Sample {
        &self.sample
    }
}

/// Validates `request` with the default group policy.
///
/// # Examples
/// ```
/// use u_analysis::dataset::DatasetView;
/// use u_analysis::request::AnalysisRequest;
/// use u_analysis::validate::{validate, Sample};
///
/// let ds = DatasetView::from_text_columns(vec![
///     ("Group", vec!["A", "A", "B", "B"]),
///     ("Value", vec!["1", "2", "10", ""]),
/// ])
/// .unwrap();
/// let prepared = validate(&ds, &AnalysisRequest::pair("t_test", "Group", "Value")).unwrap();
/// match prepared.sample() {
///     Sample::Groups(groups) => {
///         assert_eq!(groups[0].values, vec![1.0, 2.0]);
///         assert_eq!(groups[1].values, vec![10.0]);
///     }
///     other => panic!("unexpected sample {other:?}"),
/// }
/// ```
pub fn validate(dataset: &DatasetView, request: &AnalysisRequest) -> Result<Prepared> {
    validate_with(dataset, request, GroupPolicy::default())
}

/// Validates `request` under an explicit group policy.
pub fn validate_with(
    dataset: &DatasetView,
    request: &AnalysisRequest,
    policy: GroupPolicy,
) -> Result<Prepared> {
    let method: Method = request.method.parse()?;
    let spec = method.spec();
    debug!(method = spec.id, primary = %request.primary, "validating request");

    let primary = lookup(dataset, &request.primary)?;
    let secondary = match spec.secondary {
        Some(role) => {
            let name =
                request
                    .secondary
                    .as_deref()
                    .ok_or(AnalysisError::MissingColumnRole {
                        method: spec.id,
                        role: role.name,
                    })?;
            Some((role, lookup(dataset, name)?))
        }
        None => {
            if let Some(extra) = &request.secondary {
                debug!(method = spec.id, column = %extra, "ignoring secondary column");
            }
            None
        }
    };

    check_kind(spec, spec.primary, primary)?;
    if let Some((role, column)) = secondary {
        check_kind(spec, role, column)?;
    }

    let groups = select_groups(spec, primary, policy)?;
    let sample = extract(spec, primary, secondary.map(|(_, c)| c), groups)?;
    debug!(
        method = spec.id,
        observations = sample.len(),
        dropped_rows = dataset.n_rows().saturating_sub(sample.len()),
        "request validated"
    );

    Ok(Prepared {
        method,
        primary: request.primary.clone(),
        secondary: secondary.map(|(_, c)| c.name().to_string()),
        sample,
    })
}

fn lookup<'a>(dataset: &'a DatasetView, name: &str) -> Result<&'a Column> {
    dataset
        .column(name)
        .ok_or_else(|| AnalysisError::MissingColumn {
            column: name.to_string(),
        })
}

fn check_kind(spec: &MethodSpec, role: ColumnRole, column: &Column) -> Result<()> {
    if role.kind.accepts(column.kind()) {
        Ok(())
    } else {
        Err(AnalysisError::ColumnTypeMismatch {
            column: column.name().to_string(),
            method: spec.id,
            expected: role.kind.describe(),
            actual: column.kind(),
        })
    }
}

/// Group labels to compare, or `None` when the method is not group-based.
fn select_groups(
    spec: &MethodSpec,
    primary: &Column,
    policy: GroupPolicy,
) -> Result<Option<Vec<String>>> {
    let requirement = spec.groups_for(primary.kind());
    if requirement == GroupRequirement::None {
        return Ok(None);
    }

    let mut labels = primary.distinct_labels();
    if labels.len() < 2 {
        return Err(AnalysisError::InsufficientGroups {
            column: primary.name().to_string(),
            method: spec.id,
            required: 2,
            found: labels.len(),
        });
    }
    if requirement == GroupRequirement::Two && labels.len() > 2 {
        match policy {
            GroupPolicy::Strict => {
                return Err(AnalysisError::TooManyGroups {
                    column: primary.name().to_string(),
                    method: spec.id,
                    found: labels.len(),
                })
            }
            GroupPolicy::FirstTwo => {
                warn!(
                    method = spec.id,
                    column = primary.name(),
                    found = labels.len(),
                    discarded = ?&labels[2..],
                    "comparing only the first two groups"
                );
                labels.truncate(2);
            }
        }
    }
    Ok(Some(labels))
}

fn extract(
    spec: &MethodSpec,
    primary: &Column,
    secondary: Option<&Column>,
    groups: Option<Vec<String>>,
) -> Result<Sample> {
    let sample = match (groups, secondary) {
        (Some(labels), Some(measure)) => grouped(spec, primary, measure, labels)?,
        (Some(_), None) => {
            return Err(AnalysisError::ComputationFailure(format!(
                "{} groups rows but has no measurement column",
                spec.id
            )))
        }
        (None, None) => {
            let (rows, values) = primary
                .values()
                .iter()
                .enumerate()
                .filter_map(|(i, v)| v.as_number().map(|x| (i, x)))
                .unzip();
            Sample::Series { rows, values }
        }
        (None, Some(other)) if spec.method == Method::ChiSquare => {
            let (rows, cols) = primary
                .values()
                .iter()
                .zip(other.values())
                .filter_map(|(a, b)| Some((a.label()?, b.label()?)))
                .unzip();
            Sample::Labels { rows, cols }
        }
        (None, Some(other)) => {
            let (x, y) = primary
                .values()
                .iter()
                .zip(other.values())
                .filter_map(|(a, b)| Some((a.as_number()?, b.as_number()?)))
                .unzip();
            Sample::Paired { x, y }
        }
    };

    if sample.is_empty() {
        let columns = match secondary {
            Some(other) => format!("'{}' and '{}'", primary.name(), other.name()),
            None => format!("'{}'", primary.name()),
        };
        return Err(AnalysisError::InsufficientData(format!(
            "{}: no complete observations in {columns}",
            spec.id
        )));
    }
    Ok(sample)
}

fn grouped(
    spec: &MethodSpec,
    grouping: &Column,
    measure: &Column,
    labels: Vec<String>,
) -> Result<Sample> {
    let mut groups: Vec<Group> = labels
        .into_iter()
        .map(|label| Group {
            label,
            values: Vec::new(),
        })
        .collect();

    for (g, v) in grouping.values().iter().zip(measure.values()) {
        let (Some(label), Some(x)) = (g.label(), v.as_number()) else {
            continue;
        };
        if let Some(group) = groups.iter_mut().find(|group| group.label == label) {
            group.values.push(x);
        }
    }

    if let Some(empty) = groups.iter().find(|g| g.values.is_empty()) {
        return Err(AnalysisError::InsufficientData(format!(
            "{}: group '{}' of '{}' has no observations of '{}'",
            spec.id,
            empty.label,
            grouping.name(),
            measure.name()
        )));
    }
    Ok(Sample::Groups(groups))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Value;
    use crate::error::ErrorKind;

    fn dataset() -> DatasetView {
        DatasetView::from_text_columns(vec![
            ("Group", vec!["A", "A", "B", "B", "C", ""]),
            ("Value", vec!["1", "2", "10", "11", "5", "7"]),
            ("Other", vec!["2", "3", "", "12", "4", "8"]),
            ("Flag", vec!["x", "y", "x", "y", "x", "y"]),
        ])
        .unwrap()
    }

    fn kind_of(result: Result<Prepared>) -> ErrorKind {
        result.unwrap_err().kind()
    }

    #[test]
    fn test_unknown_method_checked_first() {
        let req = AnalysisRequest::pair("manova", "Nope", "Nope");
        assert_eq!(kind_of(validate(&dataset(), &req)), ErrorKind::UnknownMethod);
    }

    #[test]
    fn test_missing_primary() {
        let req = AnalysisRequest::pair("t_test", "Nope", "Value");
        let err = validate(&dataset(), &req).unwrap_err();
        assert_eq!(
            err,
            AnalysisError::MissingColumn {
                column: "Nope".into()
            }
        );
    }

    #[test]
    fn test_missing_secondary() {
        let ds = dataset();
        let absent = AnalysisRequest::new("correlation", "Value");
        assert_eq!(kind_of(validate(&ds, &absent)), ErrorKind::MissingColumn);
        let unknown = AnalysisRequest::pair("correlation", "Value", "Nope");
        assert_eq!(kind_of(validate(&ds, &unknown)), ErrorKind::MissingColumn);
    }

    #[test]
    fn test_kind_mismatch() {
        let ds = dataset();
        let req = AnalysisRequest::pair("correlation", "Group", "Value");
        let err = validate(&ds, &req).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ColumnTypeMismatch);
        assert!(err.to_string().contains("Group"));

        let req = AnalysisRequest::pair("t_test", "Group", "Flag");
        assert_eq!(kind_of(validate(&ds, &req)), ErrorKind::ColumnTypeMismatch);

        let req = AnalysisRequest::new("time_series", "Flag");
        assert_eq!(kind_of(validate(&ds, &req)), ErrorKind::ColumnTypeMismatch);
    }

    #[test]
    fn test_numeric_grouping_column_is_rejected() {
        let ds = DatasetView::from_text_columns(vec![
            ("X", vec!["1", "2", "3", "1", "2", "3"]),
            ("Y", vec!["4", "5", "6", "5", "6", "7"]),
        ])
        .unwrap();
        for method in ["t_test", "anova", "kruskal_wallis"] {
            let err = validate(&ds, &AnalysisRequest::pair(method, "X", "Y")).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ColumnTypeMismatch, "{method}");
            assert!(err.to_string().contains("categorical"), "{method}: {err}");
        }
        // the same column still cross-tabulates
        assert!(validate(&ds, &AnalysisRequest::pair("chi_square", "X", "Y")).is_ok());
    }

    #[test]
    fn test_insufficient_groups() {
        let ds = DatasetView::from_text_columns(vec![
            ("Group", vec!["A", "A", "", "A"]),
            ("Value", vec!["1", "2", "3", "4"]),
        ])
        .unwrap();
        for method in ["t_test", "anova", "kruskal_wallis"] {
            let err = validate(&ds, &AnalysisRequest::pair(method, "Group", "Value")).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InsufficientGroups, "{method}");
        }
    }

    #[test]
    fn test_first_two_groups_policy() {
        let req = AnalysisRequest::pair("t_test", "Group", "Value");
        let prepared = validate(&dataset(), &req).unwrap();
        let Sample::Groups(groups) = prepared.sample() else {
            panic!("expected groups");
        };
        let labels: Vec<&str> = groups.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, vec!["A", "B"]);
    }

    #[test]
    fn test_strict_group_policy() {
        let req = AnalysisRequest::pair("t_test", "Group", "Value");
        let err = validate_with(&dataset(), &req, GroupPolicy::Strict).unwrap_err();
        assert_eq!(
            err,
            AnalysisError::TooManyGroups {
                column: "Group".into(),
                method: "t_test",
                found: 3
            }
        );
    }

    #[test]
    fn test_anova_keeps_all_groups() {
        let req = AnalysisRequest::pair("anova", "Group", "Value");
        let prepared = validate_with(&dataset(), &req, GroupPolicy::Strict).unwrap();
        let Sample::Groups(groups) = prepared.sample() else {
            panic!("expected groups");
        };
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[2].values, vec![5.0]);
    }

    #[test]
    fn test_group_emptied_by_missing_values() {
        let ds = DatasetView::from_text_columns(vec![
            ("Group", vec!["A", "A", "B"]),
            ("Value", vec!["1", "2", "NA"]),
        ])
        .unwrap();
        let err = validate(&ds, &AnalysisRequest::pair("t_test", "Group", "Value")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientData);
        assert!(err.to_string().contains("'B'"));
    }

    #[test]
    fn test_series_keeps_row_indices() {
        let req = AnalysisRequest::new("time_series", "Other");
        let prepared = validate(&dataset(), &req).unwrap();
        assert_eq!(
            prepared.sample(),
            &Sample::Series {
                rows: vec![0, 1, 3, 4, 5],
                values: vec![2.0, 3.0, 12.0, 4.0, 8.0]
            }
        );
    }

    #[test]
    fn test_all_missing_column_is_insufficient() {
        let ds = DatasetView::new(vec![(
            "X".into(),
            vec![Value::Missing, Value::Missing],
        )])
        .unwrap();
        let err = validate(&ds, &AnalysisRequest::new("one_sample_t", "X")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientData);
    }

    #[test]
    fn test_paired_drops_incomplete_rows() {
        let req = AnalysisRequest::pair("regression", "Value", "Other");
        let prepared = validate(&dataset(), &req).unwrap();
        assert_eq!(
            prepared.sample(),
            &Sample::Paired {
                x: vec![1.0, 2.0, 11.0, 5.0, 7.0],
                y: vec![2.0, 3.0, 12.0, 4.0, 8.0]
            }
        );
        assert_eq!(prepared.secondary(), Some("Other"));
    }

    #[test]
    fn test_wilcoxon_modes() {
        let ds = dataset();
        let paired = validate(&ds, &AnalysisRequest::pair("wilcoxon", "Value", "Other")).unwrap();
        assert!(matches!(paired.sample(), Sample::Paired { .. }));

        let grouped = validate(&ds, &AnalysisRequest::pair("wilcoxon", "Flag", "Value")).unwrap();
        assert!(matches!(grouped.sample(), Sample::Groups(g) if g.len() == 2));
    }

    #[test]
    fn test_chi_square_uses_labels_of_any_kind() {
        let ds = DatasetView::new(vec![
            ("A".into(), vec![1.0.into(), 1.0.into(), 2.0.into(), 2.0.into()]),
            ("B".into(), vec!["u".into(), "u".into(), Value::Missing, "v".into()]),
        ])
        .unwrap();
        let prepared = validate(&ds, &AnalysisRequest::pair("chi_square", "A", "B")).unwrap();
        assert_eq!(
            prepared.sample(),
            &Sample::Labels {
                rows: vec!["1".into(), "1".into(), "2".into()],
                cols: vec!["u".into(), "u".into(), "v".into()]
            }
        );
    }

    #[test]
    fn test_extra_secondary_is_ignored() {
        let req = AnalysisRequest::pair("one_sample_t", "Value", "Other");
        let prepared = validate(&dataset(), &req).unwrap();
        assert_eq!(prepared.secondary(), None);
    }
}
