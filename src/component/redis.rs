//! Cache-store and primary-datastore (Redis) image streams.

use crate::crd::APIManagerSpec;
use crate::openshift::{ImageStream, TagReference};

use super::{image_stream, labels};

pub const BACKEND_REDIS_IMAGE_STREAM: &str = "backend-redis";
pub const SYSTEM_REDIS_IMAGE_STREAM: &str = "system-redis";

pub const REDIS_IMAGE: &str = "centos/redis-32-centos7";
pub const REDIS_TAG: &str = "32";

fn redis_stream(
    spec: &APIManagerSpec,
    namespace: &str,
    name: &str,
    component: &str,
    image: &str,
    display_name: &str,
) -> ImageStream {
    let tag = TagReference::docker_image(
        REDIS_TAG,
        image,
        display_name,
        spec.image_stream_tag_import_insecure,
    );
    image_stream(name, namespace, labels(&spec.app_label, component, "redis"), tag)
}

/// Image stream of the backend cache store.
pub fn backend_image_stream(spec: &APIManagerSpec, namespace: &str) -> ImageStream {
    let image = spec
        .backend
        .as_ref()
        .and_then(|b| b.redis_image.as_deref())
        .unwrap_or(REDIS_IMAGE);
    redis_stream(
        spec,
        namespace,
        BACKEND_REDIS_IMAGE_STREAM,
        "backend",
        image,
        "Backend Redis",
    )
}

/// Image stream of the system primary datastore.
pub fn system_image_stream(spec: &APIManagerSpec, namespace: &str) -> ImageStream {
    let image = spec.system.redis_image.as_deref().unwrap_or(REDIS_IMAGE);
    redis_stream(
        spec,
        namespace,
        SYSTEM_REDIS_IMAGE_STREAM,
        "system",
        image,
        "System Redis",
    )
}
