//! Status patch helpers, the `Upgraded` condition, and event recording.

use chrono::Utc;
use k8s_openapi::api::core::v1::ObjectReference;
use kube::Api;
use kube::Resource;
use kube::api::{Patch, PatchParams};
use kube::runtime::events::{Event, EventType, Recorder, Reporter};
use tracing::debug;

use crate::cluster::FIELD_MANAGER;
use crate::crd::{APIManager, APIManagerStatus, UpgradeCondition};
use crate::error::Result;

pub const CONDITION_UPGRADED: &str = "Upgraded";

pub const REASON_CONVERGED: &str = "Converged";
pub const REASON_UPGRADING: &str = "Upgrading";
pub const REASON_UPGRADE_ERROR: &str = "UpgradeError";

/// Result of the last upgrade pass as reported on the `Upgraded` condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpgradeState {
    Converged { release: String },
    Upgrading,
    Failed { message: String },
}

impl UpgradeState {
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::Converged { .. } => REASON_CONVERGED,
            Self::Upgrading => REASON_UPGRADING,
            Self::Failed { .. } => REASON_UPGRADE_ERROR,
        }
    }
}

/// Patch the status subresource of an `APIManager`.
pub async fn patch_status(
    api: &Api<APIManager>,
    name: &str,
    status: &APIManagerStatus,
) -> Result<APIManager> {
    debug!(
        "Patching status for {}: observedGeneration={}",
        name, status.observed_generation
    );

    let patch = serde_json::json!({ "status": status });
    let result = api
        .patch_status(name, &PatchParams::apply(FIELD_MANAGER), &Patch::Merge(&patch))
        .await?;
    Ok(result)
}

/// Status to report after a pass, derived from the current one.
///
/// Equal to `current` when nothing observable changed, so callers can skip
/// the patch.
pub fn next_status(
    current: &APIManagerStatus,
    generation: i64,
    state: &UpgradeState,
) -> APIManagerStatus {
    let mut status = current.clone();
    status.observed_generation = generation;

    match state {
        UpgradeState::Converged { release } => set_condition(
            &mut status,
            CONDITION_UPGRADED,
            "True",
            state.reason(),
            Some(format!("Platform converged to release {release}")),
        ),
        UpgradeState::Upgrading => set_condition(
            &mut status,
            CONDITION_UPGRADED,
            "False",
            state.reason(),
            Some("Upgrade step applied, waiting for the next pass".to_string()),
        ),
        UpgradeState::Failed { message } => set_condition(
            &mut status,
            CONDITION_UPGRADED,
            "False",
            state.reason(),
            Some(message.clone()),
        ),
    }

    status
}

/// True if `state` converged and the previous status did not say so.
pub fn became_converged(previous: &APIManagerStatus, state: &UpgradeState) -> bool {
    matches!(state, UpgradeState::Converged { .. })
        && previous
            .condition(CONDITION_UPGRADED)
            .is_none_or(|c| c.reason != REASON_CONVERGED)
}

/// Set a condition on the status.
///
/// The transition time only moves when the condition status flips.
pub fn set_condition(
    status: &mut APIManagerStatus,
    condition_type: &str,
    condition_status: &str,
    reason: &str,
    message: Option<String>,
) {
    let last_transition_time = status
        .condition(condition_type)
        .filter(|c| c.status == condition_status)
        .map_or_else(Utc::now, |c| c.last_transition_time);

    // Remove existing condition of same type
    status.conditions.retain(|c| c.r#type != condition_type);

    status.conditions.push(UpgradeCondition {
        r#type: condition_type.to_string(),
        status: condition_status.to_string(),
        reason: reason.to_string(),
        message,
        last_transition_time,
    });
}

/// Event recorder bundled with its target `ObjectReference`.
pub struct EventRecorder {
    recorder: Recorder,
    obj_ref: ObjectReference,
}

impl EventRecorder {
    /// Create an event recorder for the given `APIManager` resource.
    pub fn new(client: kube::Client, obj: &APIManager) -> Self {
        let reporter = Reporter {
            controller: FIELD_MANAGER.into(),
            instance: None,
        };
        Self {
            recorder: Recorder::new(client, reporter),
            obj_ref: obj.object_ref(&()),
        }
    }

    /// Publish a Normal event.
    pub async fn publish(&self, reason: &str, message: &str) {
        self.send(EventType::Normal, reason, message).await;
    }

    /// Publish a Warning event.
    pub async fn publish_warning(&self, reason: &str, message: &str) {
        self.send(EventType::Warning, reason, message).await;
    }

    async fn send(&self, type_: EventType, reason: &str, message: &str) {
        self.recorder
            .publish(
                &Event {
                    type_,
                    reason: reason.into(),
                    note: Some(message.into()),
                    action: reason.into(),
                    secondary: None,
                },
                &self.obj_ref,
            )
            .await
            .unwrap_or_else(|e| tracing::warn!("Failed to publish {} event: {}", reason, e));
    }
}
