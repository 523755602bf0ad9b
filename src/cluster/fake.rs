//! In-memory cluster for reconciler tests.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use kube::ResourceExt;

use super::{ClusterReader, ClusterWriter};
use crate::error::Result;
use crate::openshift::{DeploymentConfig, ImageStream};

type Key = (String, String);

fn key_of<K: ResourceExt>(obj: &K) -> Key {
    (obj.namespace().unwrap_or_default(), obj.name_any())
}

/// Stores objects by namespace and name and logs every write.
#[derive(Default)]
pub struct FakeCluster {
    deployment_configs: Mutex<BTreeMap<Key, DeploymentConfig>>,
    image_streams: Mutex<BTreeMap<Key, ImageStream>>,
    writes: Mutex<Vec<String>>,
}

impl FakeCluster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_deployment_config(&self, dc: DeploymentConfig) {
        self.deployment_configs
            .lock()
            .unwrap()
            .insert(key_of(&dc), dc);
    }

    pub fn insert_image_stream(&self, stream: ImageStream) {
        self.image_streams
            .lock()
            .unwrap()
            .insert(key_of(&stream), stream);
    }

    pub fn deployment_config(&self, namespace: &str, name: &str) -> Option<DeploymentConfig> {
        self.deployment_configs
            .lock()
            .unwrap()
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    pub fn image_stream(&self, namespace: &str, name: &str) -> Option<ImageStream> {
        self.image_streams
            .lock()
            .unwrap()
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    /// Writes applied so far, e.g. `update DeploymentConfig apim/system-app`.
    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().unwrap().clone()
    }

    pub fn clear_writes(&self) {
        self.writes.lock().unwrap().clear();
    }

    fn record(&self, verb: &str, kind: &str, key: &Key) {
        self.writes
            .lock()
            .unwrap()
            .push(format!("{verb} {kind} {}/{}", key.0, key.1));
    }
}

#[async_trait]
impl ClusterReader for FakeCluster {
    async fn get_deployment_config(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<DeploymentConfig>> {
        Ok(self.deployment_config(namespace, name))
    }

    async fn get_image_stream(&self, namespace: &str, name: &str) -> Result<Option<ImageStream>> {
        Ok(self.image_stream(namespace, name))
    }
}

#[async_trait]
impl ClusterWriter for FakeCluster {
    async fn update_deployment_config(&self, dc: &DeploymentConfig) -> Result<DeploymentConfig> {
        let key = key_of(dc);
        self.record("update", "DeploymentConfig", &key);
        self.deployment_configs
            .lock()
            .unwrap()
            .insert(key, dc.clone());
        Ok(dc.clone())
    }

    async fn create_image_stream(&self, stream: &ImageStream) -> Result<ImageStream> {
        let key = key_of(stream);
        self.record("create", "ImageStream", &key);
        self.image_streams
            .lock()
            .unwrap()
            .insert(key, stream.clone());
        Ok(stream.clone())
    }

    async fn replace_image_stream(&self, stream: &ImageStream) -> Result<ImageStream> {
        let key = key_of(stream);
        self.record("replace", "ImageStream", &key);
        self.image_streams
            .lock()
            .unwrap()
            .insert(key, stream.clone());
        Ok(stream.clone())
    }
}
