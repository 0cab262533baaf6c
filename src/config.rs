//! Engine configuration.

use serde::{Deserialize, Serialize};

/// What an exactly-two-group method does when the grouping column has
/// more than two groups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupPolicy {
    /// Compare the first two groups in first-seen order and log a warning.
    #[default]
    FirstTwo,
    /// Reject the request with `TooManyGroups`.
    Strict,
}

/// Options shared by every analysis an [`Engine`](crate::engine::Engine)
/// runs. The significance level is fixed at [`ALPHA`](crate::result::ALPHA)
/// and not configurable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub group_policy: GroupPolicy,
    /// When false, results never carry a plot descriptor.
    pub build_plots: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            group_policy: GroupPolicy::FirstTwo,
            build_plots: true,
        }
    }
}

impl EngineConfig {
    pub fn with_group_policy(mut self, policy: GroupPolicy) -> Self {
        self.group_policy = policy;
        self
    }

    pub fn with_plots(mut self, build_plots: bool) -> Self {
        self.build_plots = build_plots;
        self
    }
}
