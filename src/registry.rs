//! Closed catalog of analysis methods and their column requirements.
//!
//! [`Method`] is the only way to name an analysis; [`Method::spec`] is the
//! single source of truth for arity, column kinds, group counts and whether
//! a plot is produced. The validator, dispatcher and plot builder all read
//! this table.

use crate::dataset::ColumnKind;
use crate::error::AnalysisError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Analysis method identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    TTest,
    Anova,
    Regression,
    Correlation,
    ChiSquare,
    TimeSeries,
    OneSampleT,
    Wilcoxon,
    KruskalWallis,
}

impl Method {
    pub const ALL: [Method; 9] = [
        Method::TTest,
        Method::Anova,
        Method::Regression,
        Method::Correlation,
        Method::ChiSquare,
        Method::TimeSeries,
        Method::OneSampleT,
        Method::Wilcoxon,
        Method::KruskalWallis,
    ];

    /// Canonical snake_case identifier.
    pub fn id(self) -> &'static str {
        self.spec().id
    }

    /// Human-readable name for titles and interpretations.
    pub fn display_name(self) -> &'static str {
        self.spec().display_name
    }

    /// Registry entry for this method.
    pub fn spec(self) -> &'static MethodSpec {
        &REGISTRY[self as usize]
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Method {
    type Err = AnalysisError;

    /// Accepts the canonical identifiers plus hyphenated, spaced and
    /// mixed-case spellings (`t-test`, `Chi Square`, `kruskal-wallis`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .map(|c| match c {
                '-' | ' ' => '_',
                c => c.to_ascii_lowercase(),
            })
            .collect();
        let method = match normalized.as_str() {
            "t_test" | "ttest" => Method::TTest,
            "anova" => Method::Anova,
            "regression" | "linear_regression" => Method::Regression,
            "correlation" | "pearson" => Method::Correlation,
            "chi_square" | "chi_squared" | "chisquare" => Method::ChiSquare,
            "time_series" | "timeseries" => Method::TimeSeries,
            "one_sample_t" | "one_sample_t_test" => Method::OneSampleT,
            "wilcoxon" => Method::Wilcoxon,
            "kruskal_wallis" | "kruskal" => Method::KruskalWallis,
            _ => return Err(AnalysisError::UnknownMethod(s.to_string())),
        };
        Ok(method)
    }
}

/// Kind a column must have to fill a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindRequirement {
    Numeric,
    Categorical,
    /// Any kind; numeric values are treated as discrete labels.
    Any,
}

impl KindRequirement {
    pub fn accepts(self, kind: ColumnKind) -> bool {
        match self {
            KindRequirement::Numeric => kind == ColumnKind::Numeric,
            KindRequirement::Categorical => kind == ColumnKind::Categorical,
            KindRequirement::Any => true,
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            KindRequirement::Numeric => "numeric",
            KindRequirement::Categorical => "categorical",
            KindRequirement::Any => "numeric or categorical",
        }
    }
}

/// One column slot of a method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnRole {
    /// Role name used in error messages ("grouping", "measurement", ...).
    pub name: &'static str,
    pub kind: KindRequirement,
}

/// How many distinct groups a grouping column must provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupRequirement {
    /// Not a group-comparison method.
    None,
    /// Exactly two groups are compared.
    Two,
    /// Two or more groups are compared.
    AtLeastTwo,
}

/// Registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodSpec {
    pub method: Method,
    pub id: &'static str,
    pub display_name: &'static str,
    pub primary: ColumnRole,
    /// `None` for single-column methods.
    pub secondary: Option<ColumnRole>,
    /// Applies when the primary column partitions rows into groups.
    pub groups: GroupRequirement,
    pub produces_plot: bool,
}

impl MethodSpec {
    /// Number of columns the method consumes.
    pub fn arity(&self) -> usize {
        if self.secondary.is_some() {
            2
        } else {
            1
        }
    }

    /// Group requirement once the primary column's kind is known.
    ///
    /// Wilcoxon with a numeric primary column is the paired test and has no
    /// groups; with a categorical one it compares two groups.
    pub fn groups_for(&self, primary: ColumnKind) -> GroupRequirement {
        match (self.method, primary) {
            (Method::Wilcoxon, ColumnKind::Numeric) => GroupRequirement::None,
            _ => self.groups,
        }
    }
}

const GROUPING: ColumnRole = ColumnRole {
    name: "grouping",
    kind: KindRequirement::Categorical,
};
const MEASUREMENT: ColumnRole = ColumnRole {
    name: "measurement",
    kind: KindRequirement::Numeric,
};

/// Indexed by `Method as usize`; order must match the enum declaration.
static REGISTRY: [MethodSpec; 9] = [
    MethodSpec {
        method: Method::TTest,
        id: "t_test",
        display_name: "Two-Sample t-Test",
        primary: GROUPING,
        secondary: Some(MEASUREMENT),
        groups: GroupRequirement::Two,
        produces_plot: true,
    },
    MethodSpec {
        method: Method::Anova,
        id: "anova",
        display_name: "One-Way ANOVA",
        primary: GROUPING,
        secondary: Some(MEASUREMENT),
        groups: GroupRequirement::AtLeastTwo,
        produces_plot: true,
    },
    MethodSpec {
        method: Method::Regression,
        id: "regression",
        display_name: "Linear Regression",
        primary: ColumnRole {
            name: "independent",
            kind: KindRequirement::Numeric,
        },
        secondary: Some(ColumnRole {
            name: "dependent",
            kind: KindRequirement::Numeric,
        }),
        groups: GroupRequirement::None,
        produces_plot: true,
    },
    MethodSpec {
        method: Method::Correlation,
        id: "correlation",
        display_name: "Pearson Correlation",
        primary: ColumnRole {
            name: "first variable",
            kind: KindRequirement::Numeric,
        },
        secondary: Some(ColumnRole {
            name: "second variable",
            kind: KindRequirement::Numeric,
        }),
        groups: GroupRequirement::None,
        produces_plot: true,
    },
    MethodSpec {
        method: Method::ChiSquare,
        id: "chi_square",
        display_name: "Chi-Square Test of Independence",
        primary: ColumnRole {
            name: "row",
            kind: KindRequirement::Any,
        },
        secondary: Some(ColumnRole {
            name: "column",
            kind: KindRequirement::Any,
        }),
        groups: GroupRequirement::None,
        produces_plot: true,
    },
    MethodSpec {
        method: Method::TimeSeries,
        id: "time_series",
        display_name: "Time Series",
        primary: MEASUREMENT,
        secondary: None,
        groups: GroupRequirement::None,
        produces_plot: true,
    },
    MethodSpec {
        method: Method::OneSampleT,
        id: "one_sample_t",
        display_name: "One-Sample t-Test",
        primary: MEASUREMENT,
        secondary: None,
        groups: GroupRequirement::None,
        produces_plot: false,
    },
    MethodSpec {
        method: Method::Wilcoxon,
        id: "wilcoxon",
        display_name: "Wilcoxon Test",
        // Numeric primary: paired signed-rank. Categorical primary:
        // two-sample rank-sum over its groups.
        primary: ColumnRole {
            name: "first sample or grouping",
            kind: KindRequirement::Any,
        },
        secondary: Some(MEASUREMENT),
        groups: GroupRequirement::Two,
        produces_plot: false,
    },
    MethodSpec {
        method: Method::KruskalWallis,
        id: "kruskal_wallis",
        display_name: "Kruskal-Wallis H-Test",
        primary: GROUPING,
        secondary: Some(MEASUREMENT),
        groups: GroupRequirement::AtLeastTwo,
        produces_plot: false,
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_registry_order_matches_enum() {
        for method in Method::ALL {
            assert_eq!(method.spec().method, method, "{method:?}");
        }
    }

    #[test]
    fn test_ids_round_trip() {
        for method in Method::ALL {
            assert_eq!(method.id().parse::<Method>().unwrap(), method);
        }
    }

    #[test]
    fn test_aliases() {
        assert_eq!("t-test".parse::<Method>().unwrap(), Method::TTest);
        assert_eq!("T-Test".parse::<Method>().unwrap(), Method::TTest);
        assert_eq!("Chi Square".parse::<Method>().unwrap(), Method::ChiSquare);
        assert_eq!(
            "kruskal-wallis".parse::<Method>().unwrap(),
            Method::KruskalWallis
        );
        assert_eq!(
            " one-sample-t ".parse::<Method>().unwrap(),
            Method::OneSampleT
        );
    }

    #[test]
    fn test_unknown_method() {
        let err = "manova".parse::<Method>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownMethod);
        assert!(err.to_string().contains("manova"));
    }

    #[test]
    fn test_arity() {
        let single: Vec<Method> = Method::ALL
            .into_iter()
            .filter(|m| m.spec().arity() == 1)
            .collect();
        assert_eq!(single, vec![Method::TimeSeries, Method::OneSampleT]);
    }

    #[test]
    fn test_plot_flags() {
        assert!(Method::TTest.spec().produces_plot);
        assert!(Method::ChiSquare.spec().produces_plot);
        assert!(!Method::OneSampleT.spec().produces_plot);
        assert!(!Method::Wilcoxon.spec().produces_plot);
        assert!(!Method::KruskalWallis.spec().produces_plot);
    }

    #[test]
    fn test_wilcoxon_mode_follows_primary_kind() {
        let spec = Method::Wilcoxon.spec();
        assert_eq!(spec.groups_for(ColumnKind::Numeric), GroupRequirement::None);
        assert_eq!(spec.groups_for(ColumnKind::Categorical), GroupRequirement::Two);
        assert_eq!(
            Method::TTest.spec().groups_for(ColumnKind::Numeric),
            GroupRequirement::Two
        );
    }

    #[test]
    fn test_grouping_roles_are_categorical() {
        for method in [Method::TTest, Method::Anova, Method::KruskalWallis] {
            assert_eq!(
                method.spec().primary.kind,
                KindRequirement::Categorical,
                "{method}"
            );
        }
        assert_eq!(Method::ChiSquare.spec().primary.kind, KindRequirement::Any);
        assert_eq!(Method::Wilcoxon.spec().primary.kind, KindRequirement::Any);
    }

    #[test]
    fn test_kind_requirements() {
        assert!(KindRequirement::Any.accepts(ColumnKind::Numeric));
        assert!(KindRequirement::Numeric.accepts(ColumnKind::Numeric));
        assert!(!KindRequirement::Numeric.accepts(ColumnKind::Categorical));
        assert!(!KindRequirement::Categorical.accepts(ColumnKind::Numeric));
    }

    #[test]
    fn test_serde_identifiers() {
        let json = serde_json::to_string(&Method::KruskalWallis).unwrap();
        assert_eq!(json, "\"kruskal_wallis\"");
        let m: Method = serde_json::from_str("\"one_sample_t\"").unwrap();
        assert_eq!(m, Method::OneSampleT);
    }
}
