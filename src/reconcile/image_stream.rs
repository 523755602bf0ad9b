//! Generic image stream reconciliation.

use async_trait::async_trait;
use kube::ResourceExt;
use tracing::{debug, info};

use super::{Reconciler, StepResult};
use crate::context::UpgradeContext;
use crate::error::Result;
use crate::openshift::ImageStream;

/// Builds the desired image streams of one subsystem.
pub type DesiredImageStreams = fn(&UpgradeContext) -> Result<Vec<ImageStream>>;

/// Converges a list of image streams, stopping at the first one written.
pub struct ImageStreamReconciler<'a> {
    ctx: &'a UpgradeContext,
    desired: DesiredImageStreams,
}

impl<'a> ImageStreamReconciler<'a> {
    pub fn new(ctx: &'a UpgradeContext, desired: DesiredImageStreams) -> Self {
        Self { ctx, desired }
    }
}

#[async_trait]
impl Reconciler for ImageStreamReconciler<'_> {
    async fn reconcile(&self) -> Result<StepResult> {
        for desired in (self.desired)(self.ctx)? {
            if reconcile_image_stream(self.ctx, &desired).await? {
                return Ok(StepResult::REQUEUE);
            }
        }
        Ok(StepResult::CONVERGED)
    }
}

/// Create or update one image stream. Returns true if a write was made.
pub async fn reconcile_image_stream(ctx: &UpgradeContext, desired: &ImageStream) -> Result<bool> {
    let name = desired.name_any();

    let Some(mut existing) = ctx.reader.get_image_stream(&ctx.namespace, &name).await? else {
        info!("Creating ImageStream {}/{}", ctx.namespace, name);
        ctx.writer.create_image_stream(desired).await?;
        return Ok(true);
    };

    if !merge_tags(&mut existing, desired) {
        debug!("ImageStream {}/{} up to date", ctx.namespace, name);
        return Ok(false);
    }

    info!("Updating tags of ImageStream {}/{}", ctx.namespace, name);
    ctx.writer.replace_image_stream(&existing).await?;
    Ok(true)
}

/// Bring the desired tags into `existing`.
///
/// Missing tags are appended, tags importing a different source are replaced,
/// tags only present in `existing` are kept. Returns true if anything changed.
pub fn merge_tags(existing: &mut ImageStream, desired: &ImageStream) -> bool {
    let mut changed = false;

    for tag in &desired.spec.tags {
        match existing.spec.tags.iter_mut().find(|t| t.name == tag.name) {
            Some(current) if current.same_source(tag) => {}
            Some(current) => {
                *current = tag.clone();
                changed = true;
            }
            None => {
                existing.spec.tags.push(tag.clone());
                changed = true;
            }
        }
    }

    changed
}
