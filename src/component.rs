//! Desired-state builders for the managed platform objects.
//!
//! Pure functions of the `APIManager` spec and target release. Nothing here
//! talks to the cluster.

pub mod apicast;
pub mod database;
pub mod images;
pub mod redis;
pub mod system;

use std::collections::BTreeMap;

use kube::api::ObjectMeta;

use crate::openshift::{ImageStream, ImageStreamSpec, TagReference};

/// Labels shared by every object of a platform component.
pub fn labels(app_label: &str, component: &str, element: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        ("app".to_string(), app_label.to_string()),
        ("threescale_component".to_string(), component.to_string()),
        (
            "threescale_component_element".to_string(),
            element.to_string(),
        ),
    ])
}

/// Single-tag image stream in `namespace`.
pub fn image_stream(
    name: &str,
    namespace: &str,
    labels: BTreeMap<String, String>,
    tag: TagReference,
) -> ImageStream {
    ImageStream {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            labels: Some(labels),
            ..Default::default()
        },
        spec: ImageStreamSpec {
            tags: vec![tag],
            ..Default::default()
        },
    }
}
