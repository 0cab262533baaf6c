//! Immutable, typed view over a parsed tabular dataset.
//!
//! A [`DatasetView`] is built once per analysis from whatever the hosting
//! layer parsed (an uploaded file, a manually entered grid, a JSON body) and
//! is read-only afterwards. Each column carries an inferred [`ColumnKind`]:
//! a column is [`ColumnKind::Numeric`] when every non-missing cell is a
//! number, otherwise [`ColumnKind::Categorical`].

use crate::error::{AnalysisError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// A single cell.
///
/// Deserializes untagged: JSON numbers become [`Value::Number`], strings
/// [`Value::Text`], `null` [`Value::Missing`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Text(String),
    Missing,
}

impl Value {
    /// Interprets a manually entered cell.
    ///
    /// Empty strings and the usual missing markers (`NA`, `N/A`, `NaN`,
    /// `null`, `None`, case-insensitive) are missing; anything that parses
    /// as a finite float is a number; everything else is text.
    ///
    /// # Examples
    /// ```
    /// use u_analysis::dataset::Value;
    /// assert_eq!(Value::parse(" 3.5 "), Value::Number(3.5));
    /// assert_eq!(Value::parse("n/a"), Value::Missing);
    /// assert_eq!(Value::parse("B"), Value::Text("B".into()));
    /// ```
    pub fn parse(raw: &str) -> Value {
        let cell = raw.trim();
        if cell.is_empty() {
            return Value::Missing;
        }
        const MISSING: [&str; 5] = ["na", "n/a", "nan", "null", "none"];
        if MISSING.iter().any(|m| cell.eq_ignore_ascii_case(m)) {
            return Value::Missing;
        }
        match cell.parse::<f64>() {
            Ok(v) if v.is_finite() => Value::Number(v),
            Ok(_) => Value::Missing,
            Err(_) => Value::Text(cell.to_string()),
        }
    }

    /// `true` for [`Value::Missing`] and for non-finite numbers.
    pub fn is_missing(&self) -> bool {
        match self {
            Value::Missing => true,
            Value::Number(v) => !v.is_finite(),
            Value::Text(_) => false,
        }
    }

    /// The numeric content, if this is a finite number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(v) if v.is_finite() => Some(*v),
            _ => None,
        }
    }

    /// Group label of a non-missing cell.
    ///
    /// Numbers use their shortest round-trip decimal form, so `1.0` and `1`
    /// label the same group.
    pub fn label(&self) -> Option<String> {
        match self {
            Value::Text(s) => Some(s.clone()),
            Value::Number(v) if v.is_finite() => Some(format!("{v}")),
            _ => None,
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Number(v as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Missing, Into::into)
    }
}

/// Inferred kind of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnKind {
    Numeric,
    Categorical,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnKind::Numeric => f.write_str("numeric"),
            ColumnKind::Categorical => f.write_str("categorical"),
        }
    }
}

/// A named column with its inferred kind.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    kind: ColumnKind,
    values: Vec<Value>,
}

impl Column {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ColumnKind {
        self.kind
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Distinct non-missing labels in first-seen order.
    pub fn distinct_labels(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.values
            .iter()
            .filter_map(Value::label)
            .filter(|label| seen.insert(label.clone()))
            .collect()
    }
}

fn infer_kind(values: &[Value]) -> ColumnKind {
    let all_numeric = values
        .iter()
        .filter(|v| !v.is_missing())
        .all(|v| matches!(v, Value::Number(_)));
    if all_numeric {
        ColumnKind::Numeric
    } else {
        ColumnKind::Categorical
    }
}

/// Read-only typed table: unique column names, equal-length columns,
/// at least one column and one row.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetView {
    columns: Vec<Column>,
    n_rows: usize,
}

impl DatasetView {
    /// Builds a view from named columns.
    ///
    /// # Errors
    /// - `InsufficientData` if there are no columns or no rows.
    /// - `InvalidDataset` for duplicate column names or ragged columns.
    ///
    /// # Examples
    /// ```
    /// use u_analysis::dataset::{ColumnKind, DatasetView, Value};
    /// let ds = DatasetView::new(vec![
    ///     ("Group".to_string(), vec!["A".into(), "B".into()]),
    ///     ("Value".to_string(), vec![1.0.into(), Value::Missing]),
    /// ])
    /// .unwrap();
    /// assert_eq!(ds.n_rows(), 2);
    /// assert_eq!(ds.column("Value").unwrap().kind(), ColumnKind::Numeric);
    /// ```
    pub fn new(columns: Vec<(String, Vec<Value>)>) -> Result<Self> {
        if columns.is_empty() {
            return Err(AnalysisError::InsufficientData(
                "dataset has no columns".into(),
            ));
        }
        let n_rows = columns[0].1.len();
        if n_rows == 0 {
            return Err(AnalysisError::InsufficientData("dataset has no rows".into()));
        }

        let mut names = HashSet::new();
        let mut built = Vec::with_capacity(columns.len());
        for (name, values) in columns {
            if !names.insert(name.clone()) {
                return Err(AnalysisError::InvalidDataset(format!(
                    "duplicate column name '{name}'"
                )));
            }
            if values.len() != n_rows {
                return Err(AnalysisError::InvalidDataset(format!(
                    "column '{name}' has {} rows, expected {n_rows}",
                    values.len()
                )));
            }
            let kind = infer_kind(&values);
            built.push(Column { name, kind, values });
        }
        Ok(Self {
            columns: built,
            n_rows,
        })
    }

    /// Builds a view from a header row and row-major records.
    ///
    /// # Errors
    /// As [`DatasetView::new`]; a record whose width differs from the header
    /// is `InvalidDataset`.
    pub fn from_rows(headers: &[&str], rows: Vec<Vec<Value>>) -> Result<Self> {
        let mut columns: Vec<(String, Vec<Value>)> = headers
            .iter()
            .map(|h| (h.to_string(), Vec::with_capacity(rows.len())))
            .collect();
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != headers.len() {
                return Err(AnalysisError::InvalidDataset(format!(
                    "row {i} has {} cells, expected {}",
                    row.len(),
                    headers.len()
                )));
            }
            for (column, cell) in columns.iter_mut().zip(row) {
                column.1.push(cell);
            }
        }
        Self::new(columns)
    }

    /// Builds a view from raw text cells, interpreting each with
    /// [`Value::parse`].
    ///
    /// # Examples
    /// ```
    /// use u_analysis::dataset::{ColumnKind, DatasetView};
    /// let ds = DatasetView::from_text_columns(vec![
    ///     ("X", vec!["1", "2", "", "4"]),
    ///     ("Label", vec!["a", "b", "a", "NA"]),
    /// ])
    /// .unwrap();
    /// assert_eq!(ds.column("X").unwrap().kind(), ColumnKind::Numeric);
    /// assert_eq!(ds.column("Label").unwrap().kind(), ColumnKind::Categorical);
    /// ```
    pub fn from_text_columns(columns: Vec<(&str, Vec<&str>)>) -> Result<Self> {
        Self::new(
            columns
                .into_iter()
                .map(|(name, cells)| {
                    (
                        name.to_string(),
                        cells.into_iter().map(Value::parse).collect(),
                    )
                })
                .collect(),
        )
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Column names in dataset order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn kind_of(&self, name: &str) -> Option<ColumnKind> {
        self.column(name).map(Column::kind)
    }
}
