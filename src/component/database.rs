//! System database image streams, one per supported engine.

use crate::crd::APIManagerSpec;
use crate::openshift::{ImageStream, TagReference};

use super::{image_stream, labels};

pub const MYSQL_IMAGE_STREAM: &str = "system-mysql";
pub const MYSQL_IMAGE: &str = "centos/mysql-57-centos7";
pub const MYSQL_TAG: &str = "5.7";

pub const POSTGRESQL_IMAGE_STREAM: &str = "system-postgresql";
pub const POSTGRESQL_IMAGE: &str = "centos/postgresql-10-centos7";
pub const POSTGRESQL_TAG: &str = "10";

pub fn mysql_image_stream(spec: &APIManagerSpec, namespace: &str) -> ImageStream {
    let image = spec
        .system
        .database
        .as_ref()
        .and_then(|db| db.mysql.as_ref())
        .and_then(|mysql| mysql.image.as_deref())
        .unwrap_or(MYSQL_IMAGE);
    let tag = TagReference::docker_image(
        MYSQL_TAG,
        image,
        "System MySQL",
        spec.image_stream_tag_import_insecure,
    );
    image_stream(
        MYSQL_IMAGE_STREAM,
        namespace,
        labels(&spec.app_label, "system", "mysql"),
        tag,
    )
}

pub fn postgresql_image_stream(spec: &APIManagerSpec, namespace: &str) -> ImageStream {
    let image = spec
        .system
        .database
        .as_ref()
        .and_then(|db| db.postgresql.as_ref())
        .and_then(|pg| pg.image.as_deref())
        .unwrap_or(POSTGRESQL_IMAGE);
    let tag = TagReference::docker_image(
        POSTGRESQL_TAG,
        image,
        "System PostgreSQL",
        spec.image_stream_tag_import_insecure,
    );
    image_stream(
        POSTGRESQL_IMAGE_STREAM,
        namespace,
        labels(&spec.app_label, "system", "postgresql"),
        tag,
    )
}
