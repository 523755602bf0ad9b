//! Per-invocation upgrade context.

use std::sync::Arc;

use kube::ResourceExt;
use tracing::Span;

use crate::cluster::{ClusterReader, ClusterWriter};
use crate::crd::{APIManager, APIManagerSpec};
use crate::error::{Error, Result};

/// Everything one upgrade pass needs: cluster handles, the desired-state
/// descriptor and the span all step logs are recorded under.
///
/// Built fresh for every pass; nothing here outlives the invocation.
#[derive(Clone)]
pub struct UpgradeContext {
    pub apimanager: Arc<APIManager>,
    pub namespace: String,
    /// Platform release the upgrade converges to (e.g. "2.5").
    pub release: String,
    pub reader: Arc<dyn ClusterReader>,
    pub writer: Arc<dyn ClusterWriter>,
    pub span: Span,
}

impl UpgradeContext {
    pub fn new(
        apimanager: Arc<APIManager>,
        release: impl Into<String>,
        reader: Arc<dyn ClusterReader>,
        writer: Arc<dyn ClusterWriter>,
    ) -> Result<Self> {
        let name = apimanager.name_any();
        let namespace = apimanager
            .namespace()
            .ok_or_else(|| Error::MissingNamespace(name.clone()))?;
        let release = release.into();
        let span = tracing::info_span!("upgrade", %namespace, %name, %release);

        Ok(Self {
            apimanager,
            namespace,
            release,
            reader,
            writer,
            span,
        })
    }

    pub fn spec(&self) -> &APIManagerSpec {
        &self.apimanager.spec
    }
}
