//! `APIManager` status types.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Condition on the `APIManager` (Kubernetes condition shape).
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeCondition {
    pub r#type: String,
    pub status: String,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub last_transition_time: DateTime<Utc>,
}

/// `APIManager` status written by this operator.
///
/// Reporting only: the upgrade sequence never reads it back.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct APIManagerStatus {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<UpgradeCondition>,

    /// Last observed generation of the spec.
    #[serde(default)]
    pub observed_generation: i64,
}

impl APIManagerStatus {
    /// Find a condition by type.
    pub fn condition(&self, condition_type: &str) -> Option<&UpgradeCondition> {
        self.conditions.iter().find(|c| c.r#type == condition_type)
    }
}
