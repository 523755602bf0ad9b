//! Reconciler capability and the per-subsystem implementations.
//!
//! Every reconciler follows the same contract: no drift means no writes and
//! no requeue; a write means `requeue`, since the store may apply it
//! asynchronously. At most one write is attempted per call.

pub mod image_stream;
pub mod rollout;

use async_trait::async_trait;

use crate::component::{database, redis};
use crate::component::images::AmpImagesOptions;
use crate::context::UpgradeContext;
use crate::error::Result;
use crate::openshift::ImageStream;

use image_stream::ImageStreamReconciler;
use rollout::RolloutTriggerReconciler;

/// Outcome of one step. Errors travel in the surrounding `Result`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepResult {
    pub requeue: bool,
}

impl StepResult {
    /// No drift left for this step.
    pub const CONVERGED: Self = Self { requeue: false };
    /// A mutation was applied; run again before trusting later steps.
    pub const REQUEUE: Self = Self { requeue: true };
}

/// Managed subsystems the upgrade delegates to a reconciler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Subsystem {
    /// Shared platform image set.
    AmpImages,
    /// Backend cache store image.
    BackendRedisImage,
    /// System primary datastore image.
    SystemRedisImage,
    SystemMySqlImage,
    SystemPostgreSqlImage,
    /// Image change triggers of the routing tier.
    ApicastRollout,
}

impl std::fmt::Display for Subsystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AmpImages => write!(f, "amp-images"),
            Self::BackendRedisImage => write!(f, "backend-redis-image"),
            Self::SystemRedisImage => write!(f, "system-redis-image"),
            Self::SystemMySqlImage => write!(f, "system-mysql-image"),
            Self::SystemPostgreSqlImage => write!(f, "system-postgresql-image"),
            Self::ApicastRollout => write!(f, "apicast-rollout-triggers"),
        }
    }
}

/// Converges one subsystem toward its desired state.
#[async_trait]
pub trait Reconciler: Send + Sync {
    async fn reconcile(&self) -> Result<StepResult>;
}

/// Hands out the reconciler of each subsystem.
pub trait ReconcilerSet: Send + Sync {
    fn reconciler(&self, subsystem: Subsystem) -> Box<dyn Reconciler + '_>;
}

/// Production reconcilers, all bound to one upgrade context.
pub struct PlatformReconcilers<'a> {
    ctx: &'a UpgradeContext,
}

impl<'a> PlatformReconcilers<'a> {
    pub const fn new(ctx: &'a UpgradeContext) -> Self {
        Self { ctx }
    }
}

impl ReconcilerSet for PlatformReconcilers<'_> {
    fn reconciler(&self, subsystem: Subsystem) -> Box<dyn Reconciler + '_> {
        match subsystem {
            Subsystem::AmpImages => Box::new(ImageStreamReconciler::new(self.ctx, amp_images)),
            Subsystem::BackendRedisImage => {
                Box::new(ImageStreamReconciler::new(self.ctx, backend_redis))
            }
            Subsystem::SystemRedisImage => {
                Box::new(ImageStreamReconciler::new(self.ctx, system_redis))
            }
            Subsystem::SystemMySqlImage => {
                Box::new(ImageStreamReconciler::new(self.ctx, system_mysql))
            }
            Subsystem::SystemPostgreSqlImage => {
                Box::new(ImageStreamReconciler::new(self.ctx, system_postgresql))
            }
            Subsystem::ApicastRollout => Box::new(RolloutTriggerReconciler::new(self.ctx)),
        }
    }
}

fn amp_images(ctx: &UpgradeContext) -> Result<Vec<ImageStream>> {
    let options = AmpImagesOptions::from_spec(ctx.spec(), &ctx.release)?;
    Ok(options.image_streams(&ctx.namespace))
}

fn backend_redis(ctx: &UpgradeContext) -> Result<Vec<ImageStream>> {
    Ok(vec![redis::backend_image_stream(ctx.spec(), &ctx.namespace)])
}

fn system_redis(ctx: &UpgradeContext) -> Result<Vec<ImageStream>> {
    Ok(vec![redis::system_image_stream(ctx.spec(), &ctx.namespace)])
}

fn system_mysql(ctx: &UpgradeContext) -> Result<Vec<ImageStream>> {
    Ok(vec![database::mysql_image_stream(ctx.spec(), &ctx.namespace)])
}

fn system_postgresql(ctx: &UpgradeContext) -> Result<Vec<ImageStream>> {
    Ok(vec![database::postgresql_image_stream(
        ctx.spec(),
        &ctx.namespace,
    )])
}
