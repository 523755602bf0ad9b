//! Pre-deploy hook environment sync of the system application.

use k8s_openapi::api::core::v1::EnvVar;
use tracing::{debug, info};

use crate::component::system::{self, SYSTEM_APP};
use crate::context::UpgradeContext;
use crate::error::{Error, Result};
use crate::reconcile::StepResult;

/// True if the hook env must be rewritten.
///
/// Full structural comparison: order, values and secret references all count.
pub fn env_changed(existing: &[EnvVar], desired: &[EnvVar]) -> bool {
    existing != desired
}

/// Bring the `system-app` pre-deploy hook env to the desired release.
///
/// The DeploymentConfig is looked up through the read-only accessor and
/// written back through the writer only when the env drifted.
pub async fn sync_pre_hook_env(ctx: &UpgradeContext) -> Result<StepResult> {
    let namespace = &ctx.namespace;
    let mut dc = ctx
        .reader
        .get_deployment_config(namespace, SYSTEM_APP)
        .await?
        .ok_or_else(|| Error::not_found("DeploymentConfig", namespace, SYSTEM_APP))?;

    let desired = system::app_pre_hook_env(ctx.spec(), &ctx.release);
    let hook = dc.pre_hook_pod_mut().ok_or_else(|| Error::MissingPreHook {
        namespace: namespace.clone(),
        name: SYSTEM_APP.to_string(),
    })?;

    if !env_changed(&hook.env, &desired) {
        debug!("Pre-deploy hook env of {}/{} up to date", namespace, SYSTEM_APP);
        return Ok(StepResult::CONVERGED);
    }

    info!(
        "Updating pre-deploy hook env of {}/{} ({} vars)",
        namespace,
        SYSTEM_APP,
        desired.len()
    );
    hook.env = desired;
    ctx.writer.update_deployment_config(&dc).await?;
    Ok(StepResult::REQUEUE)
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Arc;

    use kube::api::ObjectMeta;

    use super::*;
    use crate::cluster::{MockClusterReader, MockClusterWriter};
    use crate::cluster::fake::FakeCluster;
    use crate::crd::{APIManager, APIManagerSpec};
    use crate::openshift::{
        DeploymentConfig, DeploymentConfigSpec, DeploymentStrategy, ExecNewPodHook, LifecycleHook,
        RollingDeploymentStrategyParams,
    };

    fn value(name: &str, value: &str) -> EnvVar {
        EnvVar {
            name: name.to_string(),
            value: Some(value.to_string()),
            value_from: None,
        }
    }

    /// `system-app` with a pre-deploy hook pod carrying `env`.
    pub(crate) fn system_app(namespace: &str, env: Vec<EnvVar>) -> DeploymentConfig {
        DeploymentConfig {
            metadata: ObjectMeta {
                name: Some(SYSTEM_APP.to_string()),
                namespace: Some(namespace.to_string()),
                ..Default::default()
            },
            spec: DeploymentConfigSpec {
                strategy: Some(DeploymentStrategy {
                    rolling_params: Some(RollingDeploymentStrategyParams {
                        pre: Some(LifecycleHook {
                            exec_new_pod: Some(ExecNewPodHook {
                                env,
                                ..Default::default()
                            }),
                            ..Default::default()
                        }),
                        ..Default::default()
                    }),
                    ..Default::default()
                }),
                ..Default::default()
            },
        }
    }

    fn apim() -> Arc<APIManager> {
        let mut apim = APIManager::new(
            "apim",
            APIManagerSpec {
                wildcard_domain: "apps.example.com".to_string(),
                ..Default::default()
            },
        );
        apim.metadata.namespace = Some("apim".to_string());
        Arc::new(apim)
    }

    fn context(cluster: &Arc<FakeCluster>) -> UpgradeContext {
        UpgradeContext::new(apim(), "2.5", cluster.clone(), cluster.clone()).unwrap()
    }

    #[test]
    fn test_env_changed() {
        let a = vec![value("AMP_RELEASE", "2.5"), value("RAILS_ENV", "production")];
        let reordered = vec![value("RAILS_ENV", "production"), value("AMP_RELEASE", "2.5")];
        let bumped = vec![value("AMP_RELEASE", "2.4"), value("RAILS_ENV", "production")];

        assert!(!env_changed(&a, &a.clone()));
        assert!(env_changed(&a, &reordered));
        assert!(env_changed(&a, &bumped));
        assert!(env_changed(&a, &a[..1]));
        assert!(env_changed(&[], &a));
    }

    #[tokio::test]
    async fn test_outdated_env_written_and_requeued() {
        let cluster = Arc::new(FakeCluster::new());
        cluster.insert_deployment_config(system_app("apim", vec![value("AMP_RELEASE", "2.4")]));
        let ctx = context(&cluster);

        let result = sync_pre_hook_env(&ctx).await.unwrap();
        assert_eq!(result, StepResult::REQUEUE);
        assert_eq!(cluster.writes(), vec!["update DeploymentConfig apim/system-app"]);

        let dc = cluster.deployment_config("apim", SYSTEM_APP).unwrap();
        assert_eq!(
            dc.pre_hook_pod().unwrap().env,
            system::app_pre_hook_env(ctx.spec(), "2.5")
        );
    }

    #[tokio::test]
    async fn test_current_env_is_noop() {
        let cluster = Arc::new(FakeCluster::new());
        let ctx = context(&cluster);
        cluster.insert_deployment_config(system_app(
            "apim",
            system::app_pre_hook_env(ctx.spec(), "2.5"),
        ));

        let result = sync_pre_hook_env(&ctx).await.unwrap();
        assert_eq!(result, StepResult::CONVERGED);
        assert!(cluster.writes().is_empty());
    }

    #[tokio::test]
    async fn test_missing_system_app_is_lookup_error() {
        let cluster = Arc::new(FakeCluster::new());
        let ctx = context(&cluster);

        let err = sync_pre_hook_env(&ctx).await.unwrap_err();
        assert_eq!(err.to_string(), "DeploymentConfig apim/system-app not found");
    }

    #[tokio::test]
    async fn test_missing_hook_is_error() {
        let cluster = Arc::new(FakeCluster::new());
        let mut dc = system_app("apim", vec![]);
        dc.spec.strategy = None;
        cluster.insert_deployment_config(dc);
        let ctx = context(&cluster);

        let err = sync_pre_hook_env(&ctx).await.unwrap_err();
        assert!(matches!(err, Error::MissingPreHook { ref name, .. } if name == SYSTEM_APP));
        assert!(cluster.writes().is_empty());
    }

    #[tokio::test]
    async fn test_reads_through_reader_only() {
        let cluster = Arc::new(FakeCluster::new());
        let mut reader = MockClusterReader::new();
        reader
            .expect_get_deployment_config()
            .withf(|namespace, name| namespace.to_string() == "apim" && name.to_string() == SYSTEM_APP)
            .times(1)
            .returning(|namespace, _| Ok(Some(system_app(namespace, vec![]))));
        let ctx = UpgradeContext::new(apim(), "2.5", Arc::new(reader), cluster.clone()).unwrap();

        let result = sync_pre_hook_env(&ctx).await.unwrap();
        assert_eq!(result, StepResult::REQUEUE);
        assert_eq!(cluster.writes(), vec!["update DeploymentConfig apim/system-app"]);
    }

    #[tokio::test]
    async fn test_write_failure_returned_unchanged() {
        let cluster = Arc::new(FakeCluster::new());
        cluster.insert_deployment_config(system_app("apim", vec![value("AMP_RELEASE", "2.4")]));
        let mut writer = MockClusterWriter::new();
        writer
            .expect_update_deployment_config()
            .times(1)
            .returning(|dc| Err(Error::MissingNamespace(kube::ResourceExt::name_any(dc))));
        let ctx = UpgradeContext::new(apim(), "2.5", cluster.clone(), Arc::new(writer)).unwrap();

        let err = sync_pre_hook_env(&ctx).await.unwrap_err();
        assert!(matches!(err, Error::MissingNamespace(ref name) if name == SYSTEM_APP));
        assert_eq!(err.to_string(), "system-app has no namespace");

        let stored = cluster.deployment_config("apim", SYSTEM_APP).unwrap();
        assert_eq!(stored.pre_hook_pod().unwrap().env, vec![value("AMP_RELEASE", "2.4")]);
    }
}
