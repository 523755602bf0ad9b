//! APIManager controller - reconcile dispatch and error policy.

use std::sync::Arc;
use std::time::{Duration, Instant};

use kube::runtime::controller::Action;
use kube::{Api, ResourceExt};
use tracing::{error, info, warn};

use crate::cluster::KubeCluster;
use crate::config::Config;
use crate::context::UpgradeContext;
use crate::crd::APIManager;
use crate::error::{Error, Result};
use crate::reconcile::{PlatformReconcilers, StepResult};
use crate::status::{self, EventRecorder, UpgradeState};
use crate::telemetry::metrics::{Metrics, ReconcileOutcome};
use crate::upgrade::Upgrader;

/// Shared context for the controller.
pub struct Context {
    pub kube_client: kube::Client,
    pub config: Config,
    pub metrics: Arc<Metrics>,
}

/// Reconcile an APIManager resource.
///
/// Runs one upgrade pass, then reports it on the status and as events.
/// Upgrade errors go to [`error_policy`].
pub async fn reconcile(obj: Arc<APIManager>, ctx: Arc<Context>) -> Result<Action> {
    let started = Instant::now();
    let name = obj.name_any();
    let namespace = obj
        .namespace()
        .ok_or_else(|| Error::MissingNamespace(name.clone()))?;

    info!("Reconciling {}/{}", namespace, name);

    let cluster = Arc::new(KubeCluster::new(ctx.kube_client.clone()));
    let upgrade_ctx = UpgradeContext::new(
        obj.clone(),
        ctx.config.amp_release.clone(),
        cluster.clone(),
        cluster,
    )?;
    let reconcilers = PlatformReconcilers::new(&upgrade_ctx);
    let result = Upgrader::new(&upgrade_ctx, &reconcilers).upgrade().await;

    let state = upgrade_state(&result, &ctx.config.amp_release);
    report(&obj, &namespace, &ctx.kube_client, &state).await;

    let outcome = match &result {
        Ok(step) if step.requeue => ReconcileOutcome::Requeue,
        Ok(_) => ReconcileOutcome::Converged,
        Err(_) => ReconcileOutcome::Error,
    };
    ctx.metrics
        .observe_reconcile(&namespace, &name, outcome, started.elapsed());

    match result {
        Ok(step) => Ok(Action::requeue(requeue_after(step, &ctx.config))),
        Err(e) => {
            ctx.metrics
                .observe_error(&namespace, &name, e.is_transient());
            Err(e)
        }
    }
}

/// Error policy for the controller.
pub fn error_policy(obj: Arc<APIManager>, err: &Error, ctx: Arc<Context>) -> Action {
    let delay = backoff(err, &ctx.config);
    warn!(
        "Upgrade of {}/{} failed, retrying in {:?}: {}",
        obj.namespace().unwrap_or_default(),
        obj.name_any(),
        delay,
        err
    );
    Action::requeue(delay)
}

/// Delay before the next pass after a successful one.
pub const fn requeue_after(step: StepResult, config: &Config) -> Duration {
    if step.requeue {
        config.requeue_interval()
    } else {
        config.resync_interval()
    }
}

/// Delay before retrying a failed pass. Every error is retried.
pub const fn backoff(err: &Error, config: &Config) -> Duration {
    if err.is_transient() {
        config.error_backoff()
    } else {
        config.config_error_backoff()
    }
}

pub fn upgrade_state(result: &Result<StepResult>, release: &str) -> UpgradeState {
    match result {
        Ok(step) if step.requeue => UpgradeState::Upgrading,
        Ok(_) => UpgradeState::Converged {
            release: release.to_string(),
        },
        Err(e) => UpgradeState::Failed {
            message: e.to_string(),
        },
    }
}

/// Patch the status if it changed and publish the matching event.
///
/// Reporting failures are logged and never fail the reconcile.
async fn report(obj: &APIManager, namespace: &str, client: &kube::Client, state: &UpgradeState) {
    let name = obj.name_any();
    let current = obj.status.clone().unwrap_or_default();
    let generation = obj.metadata.generation.unwrap_or(0);
    let next = status::next_status(&current, generation, state);

    if next != current {
        let api: Api<APIManager> = Api::namespaced(client.clone(), namespace);
        if let Err(e) = status::patch_status(&api, &name, &next).await {
            error!("Failed to patch status for {}/{}: {}", namespace, name, e);
        }
    }

    let recorder = EventRecorder::new(client.clone(), obj);
    match state {
        UpgradeState::Upgrading => {
            recorder
                .publish(
                    "UpgradeStepApplied",
                    "Upgrade step applied a change, requeueing",
                )
                .await;
        }
        UpgradeState::Converged { release } if status::became_converged(&current, state) => {
            recorder
                .publish(
                    "UpgradeCompleted",
                    &format!("Platform converged to release {release}"),
                )
                .await;
        }
        UpgradeState::Converged { .. } => {}
        UpgradeState::Failed { message } => {
            recorder.publish_warning("UpgradeFailed", message).await;
        }
    }
}
