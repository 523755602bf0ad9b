//! `image.openshift.io/v1` `ImageStream`.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::ObjectReference;
use kube::CustomResource;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[kube(
    group = "image.openshift.io",
    version = "v1",
    kind = "ImageStream",
    namespaced,
    schema = "disabled"
)]
#[serde(rename_all = "camelCase")]
pub struct ImageStreamSpec {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<TagReference>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TagReference {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<BTreeMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<ObjectReference>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import_policy: Option<TagImportPolicy>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TagImportPolicy {
    #[serde(default)]
    pub insecure: bool,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TagReference {
    /// Tag that imports an external registry image.
    pub fn docker_image(name: &str, image: &str, display_name: &str, insecure: bool) -> Self {
        Self {
            name: name.to_string(),
            annotations: Some(BTreeMap::from([(
                "openshift.io/display-name".to_string(),
                display_name.to_string(),
            )])),
            from: Some(ObjectReference {
                kind: Some("DockerImage".to_string()),
                name: Some(image.to_string()),
                ..Default::default()
            }),
            import_policy: Some(TagImportPolicy {
                insecure,
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    /// Source kind and name, ignoring server-populated reference fields.
    fn source(&self) -> Option<(Option<&str>, Option<&str>)> {
        self.from
            .as_ref()
            .map(|from| (from.kind.as_deref(), from.name.as_deref()))
    }

    fn insecure(&self) -> bool {
        self.import_policy.as_ref().is_some_and(|p| p.insecure)
    }

    /// True if both tags import the same image with the same import policy.
    pub fn same_source(&self, other: &Self) -> bool {
        self.name == other.name
            && self.source() == other.source()
            && self.insecure() == other.insecure()
    }
}

#[cfg(test)]
impl ImageStream {
    pub fn tag(&self, name: &str) -> Option<&TagReference> {
        self.spec.tags.iter().find(|t| t.name == name)
    }
}
