//! `APIManager` spec types.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::status::APIManagerStatus;
use super::types::{ApicastSpec, BackendSpec, HighAvailabilitySpec, SystemSpec, ZyncSpec};

/// `APIManager` spec is the desired-state descriptor of a platform deployment.
#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[kube(
    group = "apps.3scale.net",
    version = "v1alpha1",
    kind = "APIManager",
    namespaced,
    shortname = "apim",
    status = "APIManagerStatus",
    printcolumn = r#"{"name":"DOMAIN","type":"string","jsonPath":".spec.wildcardDomain"}"#,
    printcolumn = r#"{"name":"UPGRADED","type":"string","jsonPath":".status.conditions[?(@.type==\"Upgraded\")].reason"}"#,
    printcolumn = r#"{"name":"AGE","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct APIManagerSpec {
    /// Root domain under which tenant routes are published.
    pub wildcard_domain: String,

    /// Value of the `app` label put on every managed object.
    #[serde(default = "default_app_label")]
    pub app_label: String,

    /// Import image stream tags from registries without TLS verification.
    #[serde(default)]
    pub image_stream_tag_import_insecure: bool,

    /// Externally managed stateful stores.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high_availability: Option<HighAvailabilitySpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apicast: Option<ApicastSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<BackendSpec>,

    #[serde(default)]
    pub system: SystemSpec,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zync: Option<ZyncSpec>,
}

pub const DEFAULT_APP_LABEL: &str = "3scale-api-management";

fn default_app_label() -> String {
    DEFAULT_APP_LABEL.to_string()
}
