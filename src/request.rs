//! The request half of the call contract.

use serde::{Deserialize, Serialize};

/// A method name plus one or two column names, exactly as supplied by the
/// hosting layer.
///
/// Nothing is checked on construction: an unknown method or a missing
/// column is reported by [`validate`](crate::validate::validate), never by
/// a panic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub method: String,
    pub primary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary: Option<String>,
}

impl AnalysisRequest {
    /// Single-column request.
    pub fn new(method: impl Into<String>, primary: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            primary: primary.into(),
            secondary: None,
        }
    }

    /// Two-column request.
    ///
    /// # Examples
    /// ```
    /// use u_analysis::request::AnalysisRequest;
    /// let req = AnalysisRequest::pair("t_test", "Group", "Value");
    /// assert_eq!(req.secondary.as_deref(), Some("Value"));
    /// ```
    pub fn pair(
        method: impl Into<String>,
        primary: impl Into<String>,
        secondary: impl Into<String>,
    ) -> Self {
        Self {
            method: method.into(),
            primary: primary.into(),
            secondary: Some(secondary.into()),
        }
    }

    pub fn with_secondary(mut self, secondary: impl Into<String>) -> Self {
        self.secondary = Some(secondary.into());
        self
    }
}
