//! Platform image configuration and the image streams built from it.

use crate::crd::APIManagerSpec;
use crate::error::{Error, Result};
use crate::openshift::{ImageStream, TagReference};

use super::{image_stream, labels};

pub const APICAST_IMAGE_STREAM: &str = "amp-apicast";
pub const BACKEND_IMAGE_STREAM: &str = "amp-backend";
pub const SYSTEM_IMAGE_STREAM: &str = "amp-system";
pub const ZYNC_IMAGE_STREAM: &str = "amp-zync";
pub const ZYNC_DATABASE_IMAGE_STREAM: &str = "zync-database-postgresql";
pub const SYSTEM_MEMCACHED_IMAGE_STREAM: &str = "system-memcached";

pub const ZYNC_DATABASE_POSTGRESQL_IMAGE: &str = "centos/postgresql-10-centos7";
pub const SYSTEM_MEMCACHED_IMAGE: &str = "memcached:1.5";

/// Default registry image of a platform component for a release.
pub fn default_image(repository: &str, release: &str) -> String {
    format!("quay.io/3scale/{repository}:3scale-{release}.0-GA")
}

/// Fully validated image configuration. Only obtainable through
/// [`AmpImagesOptionsBuilder::build`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmpImagesOptions {
    app_label: String,
    amp_release: String,
    apicast_image: String,
    backend_image: String,
    system_image: String,
    zync_image: String,
    zync_database_postgresql_image: String,
    system_memcached_image: String,
    insecure_import_policy: bool,
}

#[derive(Debug, Clone, Default)]
pub struct AmpImagesOptionsBuilder {
    app_label: Option<String>,
    amp_release: Option<String>,
    apicast_image: Option<String>,
    backend_image: Option<String>,
    system_image: Option<String>,
    zync_image: Option<String>,
    zync_database_postgresql_image: Option<String>,
    system_memcached_image: Option<String>,
    insecure_import_policy: bool,
}

impl AmpImagesOptionsBuilder {
    pub fn app_label(mut self, value: impl Into<String>) -> Self {
        self.app_label = Some(value.into());
        self
    }

    pub fn amp_release(mut self, value: impl Into<String>) -> Self {
        self.amp_release = Some(value.into());
        self
    }

    pub fn apicast_image(mut self, value: impl Into<String>) -> Self {
        self.apicast_image = Some(value.into());
        self
    }

    pub fn backend_image(mut self, value: impl Into<String>) -> Self {
        self.backend_image = Some(value.into());
        self
    }

    pub fn system_image(mut self, value: impl Into<String>) -> Self {
        self.system_image = Some(value.into());
        self
    }

    pub fn zync_image(mut self, value: impl Into<String>) -> Self {
        self.zync_image = Some(value.into());
        self
    }

    pub fn zync_database_postgresql_image(mut self, value: impl Into<String>) -> Self {
        self.zync_database_postgresql_image = Some(value.into());
        self
    }

    pub fn system_memcached_image(mut self, value: impl Into<String>) -> Self {
        self.system_memcached_image = Some(value.into());
        self
    }

    pub const fn insecure_import_policy(mut self, value: bool) -> Self {
        self.insecure_import_policy = value;
        self
    }

    /// Validate every required field and return the options, or an error
    /// listing each missing one. Whitespace-only values count as missing.
    pub fn build(self) -> Result<AmpImagesOptions> {
        let mut missing = Vec::new();
        let mut require = |value: Option<String>, message: &'static str| {
            value.filter(|v| !v.trim().is_empty()).unwrap_or_else(|| {
                missing.push(message);
                String::new()
            })
        };

        let app_label = require(self.app_label, "no AppLabel has been provided");
        let amp_release = require(self.amp_release, "no AMP release has been provided");
        let apicast_image = require(self.apicast_image, "no Apicast image has been provided");
        let backend_image = require(self.backend_image, "no Backend image has been provided");
        let system_image = require(self.system_image, "no System image has been provided");
        let zync_image = require(self.zync_image, "no Zync image has been provided");
        let zync_database_postgresql_image = require(
            self.zync_database_postgresql_image,
            "no Zync database PostgreSQL image has been provided",
        );
        let system_memcached_image = require(
            self.system_memcached_image,
            "no System Memcached image has been provided",
        );

        if !missing.is_empty() {
            return Err(Error::InvalidImageOptions(missing));
        }

        Ok(AmpImagesOptions {
            app_label,
            amp_release,
            apicast_image,
            backend_image,
            system_image,
            zync_image,
            zync_database_postgresql_image,
            system_memcached_image,
            insecure_import_policy: self.insecure_import_policy,
        })
    }
}

impl AmpImagesOptions {
    pub fn builder() -> AmpImagesOptionsBuilder {
        AmpImagesOptionsBuilder::default()
    }

    /// Options for `release`, with any image overrides from the spec applied.
    pub fn from_spec(spec: &APIManagerSpec, release: &str) -> Result<Self> {
        let apicast = spec.apicast.as_ref().and_then(|a| a.image.clone());
        let backend = spec.backend.as_ref().and_then(|b| b.image.clone());
        let zync = spec.zync.as_ref().and_then(|z| z.image.clone());
        let zync_database = spec.zync.as_ref().and_then(|z| z.postgresql_image.clone());

        Self::builder()
            .app_label(spec.app_label.clone())
            .amp_release(release)
            .apicast_image(apicast.unwrap_or_else(|| default_image("apicast", release)))
            .backend_image(backend.unwrap_or_else(|| default_image("apisonator", release)))
            .system_image(
                spec.system
                    .image
                    .clone()
                    .unwrap_or_else(|| default_image("porta", release)),
            )
            .zync_image(zync.unwrap_or_else(|| default_image("zync", release)))
            .zync_database_postgresql_image(
                zync_database.unwrap_or_else(|| ZYNC_DATABASE_POSTGRESQL_IMAGE.to_string()),
            )
            .system_memcached_image(
                spec.system
                    .memcached_image
                    .clone()
                    .unwrap_or_else(|| SYSTEM_MEMCACHED_IMAGE.to_string()),
            )
            .insecure_import_policy(spec.image_stream_tag_import_insecure)
            .build()
    }

    pub fn app_label(&self) -> &str {
        &self.app_label
    }

    pub fn amp_release(&self) -> &str {
        &self.amp_release
    }

    pub fn apicast_image(&self) -> &str {
        &self.apicast_image
    }

    pub fn backend_image(&self) -> &str {
        &self.backend_image
    }

    pub fn system_image(&self) -> &str {
        &self.system_image
    }

    pub fn zync_image(&self) -> &str {
        &self.zync_image
    }

    pub fn zync_database_postgresql_image(&self) -> &str {
        &self.zync_database_postgresql_image
    }

    pub fn system_memcached_image(&self) -> &str {
        &self.system_memcached_image
    }

    pub const fn insecure_import_policy(&self) -> bool {
        self.insecure_import_policy
    }

    fn release_stream(
        &self,
        name: &str,
        namespace: &str,
        component: &str,
        element: &str,
        image: &str,
        display_name: &str,
    ) -> ImageStream {
        let release = self.amp_release();
        let tag = TagReference::docker_image(
            release,
            image,
            &format!("{display_name} {release}"),
            self.insecure_import_policy(),
        );
        image_stream(
            name,
            namespace,
            labels(self.app_label(), component, element),
            tag,
        )
    }

    /// Image streams of the shared platform image set, in reconcile order.
    pub fn image_streams(&self, namespace: &str) -> Vec<ImageStream> {
        vec![
            self.release_stream(
                APICAST_IMAGE_STREAM,
                namespace,
                "apicast",
                "apicast",
                self.apicast_image(),
                "AMP APIcast",
            ),
            self.release_stream(
                BACKEND_IMAGE_STREAM,
                namespace,
                "backend",
                "backend",
                self.backend_image(),
                "AMP backend",
            ),
            self.release_stream(
                SYSTEM_IMAGE_STREAM,
                namespace,
                "system",
                "system",
                self.system_image(),
                "AMP system",
            ),
            self.release_stream(
                ZYNC_IMAGE_STREAM,
                namespace,
                "zync",
                "zync",
                self.zync_image(),
                "AMP Zync",
            ),
            self.release_stream(
                ZYNC_DATABASE_IMAGE_STREAM,
                namespace,
                "zync",
                "database",
                self.zync_database_postgresql_image(),
                "Zync database PostgreSQL",
            ),
            self.release_stream(
                SYSTEM_MEMCACHED_IMAGE_STREAM,
                namespace,
                "system",
                "memcache",
                self.system_memcached_image(),
                "System Memcached",
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::{ApicastSpec, ZyncSpec};

    fn complete_builder() -> AmpImagesOptionsBuilder {
        AmpImagesOptions::builder()
            .app_label("apim")
            .amp_release("2.5")
            .apicast_image("apicast:2.5")
            .backend_image("backend:2.5")
            .system_image("system:2.5")
            .zync_image("zync:2.5")
            .zync_database_postgresql_image("postgresql:10")
            .system_memcached_image("memcached:1.5")
    }

    #[test]
    fn test_build_complete() {
        let options = complete_builder().insecure_import_policy(true).build().unwrap();
        assert_eq!(options.app_label(), "apim");
        assert_eq!(options.amp_release(), "2.5");
        assert_eq!(options.zync_database_postgresql_image(), "postgresql:10");
        assert!(options.insecure_import_policy());
    }

    #[test]
    fn test_build_insecure_defaults_to_false() {
        let options = complete_builder().build().unwrap();
        assert!(!options.insecure_import_policy());
    }

    #[test]
    fn test_build_reports_every_missing_field() {
        let err = AmpImagesOptions::builder().build().unwrap_err();
        let Error::InvalidImageOptions(missing) = err else {
            panic!("unexpected error variant");
        };
        assert_eq!(
            missing,
            vec![
                "no AppLabel has been provided",
                "no AMP release has been provided",
                "no Apicast image has been provided",
                "no Backend image has been provided",
                "no System image has been provided",
                "no Zync image has been provided",
                "no Zync database PostgreSQL image has been provided",
                "no System Memcached image has been provided",
            ]
        );
    }

    #[test]
    fn test_build_rejects_blank_value() {
        let err = complete_builder().zync_image("  ").build().unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid image options: no Zync image has been provided"
        );
    }

    #[test]
    fn test_from_spec_defaults() {
        let spec = APIManagerSpec {
            app_label: "apim".to_string(),
            ..Default::default()
        };
        let options = AmpImagesOptions::from_spec(&spec, "2.5").unwrap();
        assert_eq!(options.apicast_image(), "quay.io/3scale/apicast:3scale-2.5.0-GA");
        assert_eq!(options.backend_image(), "quay.io/3scale/apisonator:3scale-2.5.0-GA");
        assert_eq!(options.system_image(), "quay.io/3scale/porta:3scale-2.5.0-GA");
        assert_eq!(options.zync_image(), "quay.io/3scale/zync:3scale-2.5.0-GA");
        assert_eq!(options.system_memcached_image(), SYSTEM_MEMCACHED_IMAGE);
    }

    #[test]
    fn test_from_spec_overrides() {
        let spec = APIManagerSpec {
            app_label: "apim".to_string(),
            image_stream_tag_import_insecure: true,
            apicast: Some(ApicastSpec {
                image: Some("registry.local/apicast:custom".to_string()),
            }),
            zync: Some(ZyncSpec {
                image: None,
                postgresql_image: Some("registry.local/postgresql:12".to_string()),
            }),
            ..Default::default()
        };
        let options = AmpImagesOptions::from_spec(&spec, "2.5").unwrap();
        assert_eq!(options.apicast_image(), "registry.local/apicast:custom");
        assert_eq!(options.zync_image(), "quay.io/3scale/zync:3scale-2.5.0-GA");
        assert_eq!(
            options.zync_database_postgresql_image(),
            "registry.local/postgresql:12"
        );
        assert!(options.insecure_import_policy());
    }

    #[test]
    fn test_from_spec_empty_app_label_is_invalid() {
        let spec = APIManagerSpec::default();
        let err = AmpImagesOptions::from_spec(&spec, "2.5").unwrap_err();
        assert!(err.to_string().contains("no AppLabel has been provided"));
    }

    #[test]
    fn test_image_streams() {
        let options = complete_builder().build().unwrap();
        let streams = options.image_streams("apim");
        let names: Vec<_> = streams
            .iter()
            .map(|s| s.metadata.name.clone().unwrap())
            .collect();
        assert_eq!(
            names,
            vec![
                APICAST_IMAGE_STREAM,
                BACKEND_IMAGE_STREAM,
                SYSTEM_IMAGE_STREAM,
                ZYNC_IMAGE_STREAM,
                ZYNC_DATABASE_IMAGE_STREAM,
                SYSTEM_MEMCACHED_IMAGE_STREAM,
            ]
        );

        let apicast = &streams[0];
        let tag = apicast.tag("2.5").unwrap();
        assert_eq!(
            tag.from.as_ref().unwrap().name.as_deref(),
            Some("apicast:2.5")
        );
        assert_eq!(
            tag.annotations.as_ref().unwrap()["openshift.io/display-name"],
            "AMP APIcast 2.5"
        );
        assert_eq!(apicast.metadata.labels.as_ref().unwrap()["app"], "apim");
    }

    #[test]
    fn test_image_streams_follow_options() {
        let options = complete_builder()
            .amp_release("2.6")
            .insecure_import_policy(true)
            .build()
            .unwrap();
        let expected = [
            options.apicast_image(),
            options.backend_image(),
            options.system_image(),
            options.zync_image(),
            options.zync_database_postgresql_image(),
            options.system_memcached_image(),
        ];

        for (stream, image) in options.image_streams("apim").iter().zip(expected) {
            assert_eq!(stream.spec.tags.len(), 1);
            let tag = stream.tag(options.amp_release()).unwrap();
            assert_eq!(tag.from.as_ref().unwrap().name.as_deref(), Some(image));
            assert!(tag.import_policy.as_ref().unwrap().insecure);
            assert_eq!(
                stream.metadata.labels.as_ref().unwrap()["app"],
                options.app_label()
            );
        }
    }
}
