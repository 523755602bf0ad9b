//! Upgrade orchestration.
//!
//! One pass runs the steps of [`plan`] in order and stops at the first step
//! that applied a change or failed. No progress is stored between passes: a
//! converged step is a no-op, so re-running from the top is always safe.
//!
//! Step order:
//!
//! 1. pre-deploy hook env of `system-app`
//! 2. platform image set
//! 3. standalone topology only: backend redis, system redis, then the image of
//!    the configured database engine
//! 4. rollout triggers of the routing tier

pub mod hook;

use tracing::{Instrument, info, warn};

use crate::context::UpgradeContext;
use crate::crd::APIManagerSpec;
use crate::error::{Error, Result};
use crate::reconcile::{ReconcilerSet, StepResult, Subsystem};

/// Where the stateful stores live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    /// Stores are managed outside the platform; their images are left alone.
    HighAvailability,
    Standalone,
}

impl Topology {
    pub fn from_spec(spec: &APIManagerSpec) -> Self {
        match &spec.high_availability {
            Some(ha) if ha.enabled => Self::HighAvailability,
            _ => Self::Standalone,
        }
    }
}

/// Relational engine backing the system component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseEngine {
    MySql,
    PostgreSql,
    Unset,
}

impl DatabaseEngine {
    /// MySQL wins when both engines are configured.
    pub fn from_spec(spec: &APIManagerSpec) -> Self {
        let Some(database) = &spec.system.database else {
            return Self::Unset;
        };
        if database.mysql.is_some() {
            Self::MySql
        } else if database.postgresql.is_some() {
            Self::PostgreSql
        } else {
            Self::Unset
        }
    }
}

/// One entry of an upgrade plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Sync the env of the `system-app` pre-deploy hook.
    HookEnv,
    Reconcile(Subsystem),
    /// Standalone topology without a database engine: fails the pass.
    MissingDatabase,
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HookEnv => write!(f, "system-app-pre-hook-env"),
            Self::Reconcile(subsystem) => write!(f, "{subsystem}"),
            Self::MissingDatabase => write!(f, "system-database"),
        }
    }
}

/// Ordered steps of an upgrade pass for `spec`.
pub fn plan(spec: &APIManagerSpec) -> Vec<Step> {
    let mut steps = vec![Step::HookEnv, Step::Reconcile(Subsystem::AmpImages)];

    if Topology::from_spec(spec) == Topology::Standalone {
        steps.push(Step::Reconcile(Subsystem::BackendRedisImage));
        steps.push(Step::Reconcile(Subsystem::SystemRedisImage));
        steps.push(match DatabaseEngine::from_spec(spec) {
            DatabaseEngine::MySql => Step::Reconcile(Subsystem::SystemMySqlImage),
            DatabaseEngine::PostgreSql => Step::Reconcile(Subsystem::SystemPostgreSqlImage),
            DatabaseEngine::Unset => Step::MissingDatabase,
        });
    }

    steps.push(Step::Reconcile(Subsystem::ApicastRollout));
    steps
}

/// Runs upgrade passes for one `APIManager`.
pub struct Upgrader<'a> {
    ctx: &'a UpgradeContext,
    reconcilers: &'a dyn ReconcilerSet,
}

impl<'a> Upgrader<'a> {
    pub fn new(ctx: &'a UpgradeContext, reconcilers: &'a dyn ReconcilerSet) -> Self {
        Self { ctx, reconcilers }
    }

    pub fn plan(&self) -> Vec<Step> {
        plan(self.ctx.spec())
    }

    /// Run one pass.
    ///
    /// Returns the first requeue or error a step reports, or
    /// [`StepResult::CONVERGED`] once every step is converged. Errors are
    /// returned unchanged.
    pub async fn upgrade(&self) -> Result<StepResult> {
        async {
            for step in self.plan() {
                let result = self.run(step).await.inspect_err(|e| {
                    warn!(%step, "Upgrade step failed: {}", e);
                })?;
                if result.requeue {
                    info!(%step, "Upgrade step applied a change, requeueing");
                    return Ok(result);
                }
            }
            info!("Upgrade converged");
            Ok(StepResult::CONVERGED)
        }
        .instrument(self.ctx.span.clone())
        .await
    }

    async fn run(&self, step: Step) -> Result<StepResult> {
        match step {
            Step::HookEnv => hook::sync_pre_hook_env(self.ctx).await,
            Step::Reconcile(subsystem) => self.reconcilers.reconciler(subsystem).reconcile().await,
            Step::MissingDatabase => Err(Error::DatabaseNotSet),
        }
    }
}
