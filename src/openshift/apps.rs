//! `apps.openshift.io/v1` `DeploymentConfig`.

use k8s_openapi::api::core::v1::{EnvVar, ObjectReference};
use kube::CustomResource;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const TRIGGER_CONFIG_CHANGE: &str = "ConfigChange";
pub const TRIGGER_IMAGE_CHANGE: &str = "ImageChange";

#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[kube(
    group = "apps.openshift.io",
    version = "v1",
    kind = "DeploymentConfig",
    namespaced,
    schema = "disabled"
)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentConfigSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<DeploymentStrategy>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub triggers: Vec<DeploymentTriggerPolicy>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentStrategy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rolling_params: Option<RollingDeploymentStrategyParams>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RollingDeploymentStrategyParams {
    /// Hook run before the new deployment starts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre: Option<LifecycleHook>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleHook {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exec_new_pod: Option<ExecNewPodHook>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Hook that runs a one-off pod built from the deployment's container.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExecNewPodHook {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVar>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentTriggerPolicy {
    pub r#type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_change_params: Option<DeploymentTriggerImageChangeParams>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentTriggerImageChangeParams {
    #[serde(default)]
    pub automatic: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub container_names: Vec<String>,

    pub from: ObjectReference,

    /// Set by the server once the trigger fired.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_triggered_image: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DeploymentConfig {
    /// Pod definition of the rolling strategy's pre-deploy hook, if any.
    #[cfg(test)]
    pub fn pre_hook_pod(&self) -> Option<&ExecNewPodHook> {
        self.spec
            .strategy
            .as_ref()?
            .rolling_params
            .as_ref()?
            .pre
            .as_ref()?
            .exec_new_pod
            .as_ref()
    }

    pub fn pre_hook_pod_mut(&mut self) -> Option<&mut ExecNewPodHook> {
        self.spec
            .strategy
            .as_mut()?
            .rolling_params
            .as_mut()?
            .pre
            .as_mut()?
            .exec_new_pod
            .as_mut()
    }
}

impl DeploymentTriggerPolicy {
    pub fn config_change() -> Self {
        Self {
            r#type: TRIGGER_CONFIG_CHANGE.to_string(),
            ..Default::default()
        }
    }

    /// Automatic redeploy of `containers` when `image_stream_tag` changes.
    pub fn image_change(containers: &[&str], image_stream_tag: &str) -> Self {
        Self {
            r#type: TRIGGER_IMAGE_CHANGE.to_string(),
            image_change_params: Some(DeploymentTriggerImageChangeParams {
                automatic: true,
                container_names: containers.iter().map(ToString::to_string).collect(),
                from: ObjectReference {
                    kind: Some("ImageStreamTag".to_string()),
                    name: Some(image_stream_tag.to_string()),
                    ..Default::default()
                },
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    /// Compare the fields that decide what the trigger reacts to.
    ///
    /// Server-populated fields (`lastTriggeredImage`, defaulted namespace) are ignored.
    pub fn same_rule(&self, other: &Self) -> bool {
        if self.r#type != other.r#type {
            return false;
        }
        match (&self.image_change_params, &other.image_change_params) {
            (None, None) => true,
            (Some(a), Some(b)) => {
                a.automatic == b.automatic
                    && a.container_names == b.container_names
                    && a.from.kind == b.from.kind
                    && a.from.name == b.from.name
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn system_app_json() -> serde_json::Value {
        serde_json::json!({
            "apiVersion": "apps.openshift.io/v1",
            "kind": "DeploymentConfig",
            "metadata": {"name": "system-app", "namespace": "apim", "resourceVersion": "42"},
            "spec": {
                "replicas": 1,
                "strategy": {
                    "type": "Rolling",
                    "rollingParams": {
                        "timeoutSeconds": 1200,
                        "pre": {
                            "failurePolicy": "Retry",
                            "execNewPod": {
                                "containerName": "system-master",
                                "command": ["bash", "-c", "bundle exec rake boot openshift:deploy"],
                                "env": [{"name": "AMP_RELEASE", "value": "2.4"}]
                            }
                        }
                    }
                },
                "triggers": [
                    {"type": "ConfigChange"},
                    {
                        "type": "ImageChange",
                        "imageChangeParams": {
                            "automatic": true,
                            "containerNames": ["system-master"],
                            "from": {"kind": "ImageStreamTag", "name": "amp-system:2.4", "namespace": "apim"},
                            "lastTriggeredImage": "quay.io/3scale/porta@sha256:abc"
                        }
                    }
                ]
            }
        })
    }

    #[test]
    fn test_deployment_config_roundtrip_keeps_unknown_fields() {
        let original = system_app_json();
        let dc: DeploymentConfig = serde_json::from_value(original.clone()).unwrap();
        let back = serde_json::to_value(&dc).unwrap();
        assert_eq!(back["spec"], original["spec"]);
    }

    #[test]
    fn test_pre_hook_pod_access() {
        let mut dc: DeploymentConfig = serde_json::from_value(system_app_json()).unwrap();
        let env = &dc.pre_hook_pod().unwrap().env;
        assert_eq!(env.len(), 1);
        assert_eq!(env[0].name, "AMP_RELEASE");

        dc.pre_hook_pod_mut().unwrap().env.clear();
        assert!(dc.pre_hook_pod().unwrap().env.is_empty());
    }

    #[test]
    fn test_pre_hook_pod_missing_strategy() {
        let dc = DeploymentConfig::new("system-app", DeploymentConfigSpec::default());
        assert!(dc.pre_hook_pod().is_none());
    }

    #[test]
    fn test_same_rule_ignores_server_fields() {
        let dc: DeploymentConfig = serde_json::from_value(system_app_json()).unwrap();
        let desired = DeploymentTriggerPolicy::image_change(&["system-master"], "amp-system:2.4");
        assert!(dc.spec.triggers[1].same_rule(&desired));
        assert!(dc.spec.triggers[0].same_rule(&DeploymentTriggerPolicy::config_change()));
    }

    #[test]
    fn test_same_rule_detects_tag_change() {
        let old = DeploymentTriggerPolicy::image_change(&["apicast"], "amp-apicast:2.4");
        let new = DeploymentTriggerPolicy::image_change(&["apicast"], "amp-apicast:2.5");
        assert!(!old.same_rule(&new));
        assert!(!old.same_rule(&DeploymentTriggerPolicy::config_change()));
    }
}
