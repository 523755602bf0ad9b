//! Cluster access seams used by the upgrade.
//!
//! Lookups go through [`ClusterReader`] and mutations through
//! [`ClusterWriter`]; [`KubeCluster`] implements both on a `kube::Client`.
//! Write conflicts are left to the API server's `resourceVersion` check.

#[cfg(test)]
pub mod fake;

use async_trait::async_trait;
use kube::api::PostParams;
use kube::{Api, ResourceExt};
use tracing::debug;

#[cfg(test)]
use mockall::automock;

use crate::error::{Error, Result};
use crate::openshift::{DeploymentConfig, ImageStream};

/// Field manager recorded on every write.
pub const FIELD_MANAGER: &str = "ampuo";

/// Read-only accessor for existence and state lookups.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ClusterReader: Send + Sync {
    async fn get_deployment_config(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<DeploymentConfig>>;

    async fn get_image_stream(&self, namespace: &str, name: &str) -> Result<Option<ImageStream>>;
}

/// Read/write handle used for mutations.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ClusterWriter: Send + Sync {
    /// Replace a DeploymentConfig. Rejected if its `resourceVersion` is stale.
    async fn update_deployment_config(&self, dc: &DeploymentConfig) -> Result<DeploymentConfig>;

    async fn create_image_stream(&self, stream: &ImageStream) -> Result<ImageStream>;

    /// Replace an ImageStream. Rejected if its `resourceVersion` is stale.
    async fn replace_image_stream(&self, stream: &ImageStream) -> Result<ImageStream>;
}

/// `kube`-backed implementation of both cluster seams.
#[derive(Clone)]
pub struct KubeCluster {
    client: kube::Client,
}

impl KubeCluster {
    pub const fn new(client: kube::Client) -> Self {
        Self { client }
    }

    fn post_params() -> PostParams {
        PostParams {
            field_manager: Some(FIELD_MANAGER.to_string()),
            ..Default::default()
        }
    }
}

fn namespace_of<K: ResourceExt>(obj: &K) -> Result<String> {
    obj.namespace()
        .ok_or_else(|| Error::MissingNamespace(obj.name_any()))
}

#[async_trait]
impl ClusterReader for KubeCluster {
    async fn get_deployment_config(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<DeploymentConfig>> {
        let api: Api<DeploymentConfig> = Api::namespaced(self.client.clone(), namespace);
        Ok(api.get_opt(name).await?)
    }

    async fn get_image_stream(&self, namespace: &str, name: &str) -> Result<Option<ImageStream>> {
        let api: Api<ImageStream> = Api::namespaced(self.client.clone(), namespace);
        Ok(api.get_opt(name).await?)
    }
}

#[async_trait]
impl ClusterWriter for KubeCluster {
    async fn update_deployment_config(&self, dc: &DeploymentConfig) -> Result<DeploymentConfig> {
        let namespace = namespace_of(dc)?;
        let name = dc.name_any();
        debug!("Replacing DeploymentConfig {}/{}", namespace, name);

        let api: Api<DeploymentConfig> = Api::namespaced(self.client.clone(), &namespace);
        Ok(api.replace(&name, &Self::post_params(), dc).await?)
    }

    async fn create_image_stream(&self, stream: &ImageStream) -> Result<ImageStream> {
        let namespace = namespace_of(stream)?;
        debug!("Creating ImageStream {}/{}", namespace, stream.name_any());

        let api: Api<ImageStream> = Api::namespaced(self.client.clone(), &namespace);
        Ok(api.create(&Self::post_params(), stream).await?)
    }

    async fn replace_image_stream(&self, stream: &ImageStream) -> Result<ImageStream> {
        let namespace = namespace_of(stream)?;
        let name = stream.name_any();
        debug!("Replacing ImageStream {}/{}", namespace, name);

        let api: Api<ImageStream> = Api::namespaced(self.client.clone(), &namespace);
        Ok(api.replace(&name, &Self::post_params(), stream).await?)
    }
}
