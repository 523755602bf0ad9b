//! Rollout-trigger reconciliation for the routing tier.

use async_trait::async_trait;
use tracing::{debug, info};

use super::{Reconciler, StepResult};
use crate::component::apicast::{self, ROUTING_TIER};
use crate::context::UpgradeContext;
use crate::error::{Error, Result};
use crate::openshift::DeploymentTriggerPolicy;

/// Points the image change triggers of the apicast DeploymentConfigs at the
/// target release tag.
pub struct RolloutTriggerReconciler<'a> {
    ctx: &'a UpgradeContext,
}

impl<'a> RolloutTriggerReconciler<'a> {
    pub const fn new(ctx: &'a UpgradeContext) -> Self {
        Self { ctx }
    }
}

/// True if both lists hold the same trigger rules in the same order.
pub fn triggers_match(existing: &[DeploymentTriggerPolicy], desired: &[DeploymentTriggerPolicy]) -> bool {
    existing.len() == desired.len()
        && existing
            .iter()
            .zip(desired)
            .all(|(current, wanted)| current.same_rule(wanted))
}

#[async_trait]
impl Reconciler for RolloutTriggerReconciler<'_> {
    async fn reconcile(&self) -> Result<StepResult> {
        let namespace = &self.ctx.namespace;

        for name in ROUTING_TIER {
            let mut dc = self
                .ctx
                .reader
                .get_deployment_config(namespace, name)
                .await?
                .ok_or_else(|| Error::not_found("DeploymentConfig", namespace, name))?;

            let desired = apicast::deployment_triggers(name, &self.ctx.release);
            if triggers_match(&dc.spec.triggers, &desired) {
                debug!("Triggers of DeploymentConfig {}/{} up to date", namespace, name);
                continue;
            }

            info!(
                "Updating triggers of DeploymentConfig {}/{} to release {}",
                namespace, name, self.ctx.release
            );
            dc.spec.triggers = desired;
            self.ctx.writer.update_deployment_config(&dc).await?;
            return Ok(StepResult::REQUEUE);
        }

        Ok(StepResult::CONVERGED)
    }
}
