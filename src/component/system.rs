//! System application: environment of the pre-deploy hook pod.

use k8s_openapi::api::core::v1::{EnvVar, EnvVarSource, SecretKeySelector};

use crate::crd::APIManagerSpec;

/// DeploymentConfig carrying the migration pre-deploy hook.
pub const SYSTEM_APP: &str = "system-app";

fn env_value(name: &str, value: &str) -> EnvVar {
    EnvVar {
        name: name.to_string(),
        value: Some(value.to_string()),
        value_from: None,
    }
}

fn env_secret(name: &str, secret: &str, key: &str) -> EnvVar {
    EnvVar {
        name: name.to_string(),
        value: None,
        value_from: Some(EnvVarSource {
            secret_key_ref: Some(SecretKeySelector {
                name: secret.to_string(),
                key: key.to_string(),
                optional: None,
            }),
            ..Default::default()
        }),
    }
}

/// Desired env of the `system-app` pre-deploy hook pod for `release`.
///
/// Order matters: the hook env is compared as a whole list.
pub fn app_pre_hook_env(spec: &APIManagerSpec, release: &str) -> Vec<EnvVar> {
    vec![
        env_value("AMP_RELEASE", release),
        env_value("APICAST_REGISTRY_URL", "http://apicast-staging:8090/policies"),
        env_value("FORCE_SSL", "true"),
        env_value("PROVIDER_PLAN", "enterprise"),
        env_value("RAILS_ENV", "production"),
        env_value("RAILS_LOG_LEVEL", "info"),
        env_value("RAILS_LOG_TO_STDOUT", "true"),
        env_value("THINKING_SPHINX_PORT", "9306"),
        env_value("THREESCALE_SUPERDOMAIN", &spec.wildcard_domain),
        env_secret("DATABASE_URL", "system-database", "URL"),
        env_secret("MASTER_ACCESS_TOKEN", "system-seed", "MASTER_ACCESS_TOKEN"),
        env_secret("REDIS_URL", "system-redis", "URL"),
        env_secret("BACKEND_REDIS_URL", "backend-redis", "REDIS_STORAGE_URL"),
        env_secret("MEMCACHE_SERVERS", "system-memcache", "SERVERS"),
        env_secret(
            "ZYNC_AUTHENTICATION_TOKEN",
            "zync",
            "ZYNC_AUTHENTICATION_TOKEN",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> APIManagerSpec {
        APIManagerSpec {
            wildcard_domain: "apps.example.com".to_string(),
            ..Default::default()
        }
    }

    fn find<'a>(env: &'a [EnvVar], name: &str) -> &'a EnvVar {
        env.iter().find(|e| e.name == name).unwrap()
    }

    #[test]
    fn test_release_and_domain() {
        let env = app_pre_hook_env(&spec(), "2.5");
        assert_eq!(find(&env, "AMP_RELEASE").value.as_deref(), Some("2.5"));
        assert_eq!(
            find(&env, "THREESCALE_SUPERDOMAIN").value.as_deref(),
            Some("apps.example.com")
        );
    }

    #[test]
    fn test_secret_references() {
        let env = app_pre_hook_env(&spec(), "2.5");
        let database = find(&env, "DATABASE_URL");
        assert!(database.value.is_none());
        let selector = database
            .value_from
            .as_ref()
            .unwrap()
            .secret_key_ref
            .as_ref()
            .unwrap();
        assert_eq!(selector.name, "system-database");
        assert_eq!(selector.key, "URL");
    }

    #[test]
    fn test_env_depends_on_release() {
        assert_ne!(
            app_pre_hook_env(&spec(), "2.4"),
            app_pre_hook_env(&spec(), "2.5")
        );
        assert_eq!(
            app_pre_hook_env(&spec(), "2.5"),
            app_pre_hook_env(&spec(), "2.5")
        );
    }

    #[test]
    fn test_env_names_unique() {
        let env = app_pre_hook_env(&spec(), "2.5");
        let mut names: Vec<_> = env.iter().map(|e| e.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), env.len());
    }
}
