//! API gateway (routing tier) rollout triggers.

use crate::openshift::DeploymentTriggerPolicy;

use super::images::APICAST_IMAGE_STREAM;

pub const APICAST_STAGING: &str = "apicast-staging";
pub const APICAST_PRODUCTION: &str = "apicast-production";

/// Routing-tier DeploymentConfigs whose triggers the upgrade manages.
pub const ROUTING_TIER: [&str; 2] = [APICAST_STAGING, APICAST_PRODUCTION];

/// Desired triggers of an apicast DeploymentConfig: redeploy on config change
/// and automatically when the release tag of the apicast image moves.
///
/// The container is named after its DeploymentConfig.
pub fn deployment_triggers(deployment: &str, release: &str) -> Vec<DeploymentTriggerPolicy> {
    vec![
        DeploymentTriggerPolicy::config_change(),
        DeploymentTriggerPolicy::image_change(
            &[deployment],
            &format!("{APICAST_IMAGE_STREAM}:{release}"),
        ),
    ]
}
