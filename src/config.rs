use std::time::Duration;

use clap::{Parser, Subcommand};

// Environment variable names, one per flag.
pub mod env {
    pub const LOG_FORMAT: &str = "LOG_FORMAT";
    pub const LOG_LEVEL: &str = "LOG_LEVEL";
    pub const HEALTH_PORT: &str = "HEALTH_PORT";
    pub const METRICS_PORT: &str = "METRICS_PORT";
    pub const WATCH_NAMESPACE: &str = "WATCH_NAMESPACE";
    pub const AMP_RELEASE: &str = "AMP_RELEASE";
    pub const REQUEUE_INTERVAL_SECS: &str = "REQUEUE_INTERVAL_SECS";
    pub const RESYNC_INTERVAL_SECS: &str = "RESYNC_INTERVAL_SECS";
    pub const ERROR_BACKOFF_SECS: &str = "ERROR_BACKOFF_SECS";
    pub const CONFIG_ERROR_BACKOFF_SECS: &str = "CONFIG_ERROR_BACKOFF_SECS";
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run the operator (default)
    Run,
    /// Print the APIManager CustomResourceDefinition as YAML
    Crd,
    /// Show version information
    Version,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "ampuo",
    version,
    about = "API Management Platform upgrade operator",
    long_about = "A Kubernetes operator that upgrades an API Management Platform deployment in place by converging its hook environment, image streams and rollout triggers to a target release."
)]
pub struct Config {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Log format: json or text
    #[arg(long, env = env::LOG_FORMAT, default_value = "json")]
    pub log_format: String,

    /// Log level: trace, debug, info, warn, error
    #[arg(long, env = env::LOG_LEVEL, default_value = "info")]
    pub log_level: String,

    /// Health check server port
    #[arg(long, env = env::HEALTH_PORT, default_value = "8080")]
    pub health_port: u16,

    /// Prometheus metrics server port
    #[arg(long, env = env::METRICS_PORT, default_value = "8081")]
    pub metrics_port: u16,

    /// Namespace to watch (empty = all namespaces)
    #[arg(long, env = env::WATCH_NAMESPACE)]
    pub watch_namespace: Option<String>,

    /// Platform release to upgrade to
    #[arg(long, env = env::AMP_RELEASE, default_value = "2.5")]
    pub amp_release: String,

    /// Delay before the next pass after a step applied a change
    #[arg(long, env = env::REQUEUE_INTERVAL_SECS, default_value = "5")]
    pub requeue_interval_secs: u64,

    /// Delay before re-checking a converged APIManager
    #[arg(long, env = env::RESYNC_INTERVAL_SECS, default_value = "300")]
    pub resync_interval_secs: u64,

    /// Backoff after a Kubernetes API error
    #[arg(long, env = env::ERROR_BACKOFF_SECS, default_value = "10")]
    pub error_backoff_secs: u64,

    /// Backoff after a lookup or configuration error
    #[arg(long, env = env::CONFIG_ERROR_BACKOFF_SECS, default_value = "120")]
    pub config_error_backoff_secs: u64,
}

impl Config {
    pub fn from_args() -> Self {
        Self::parse()
    }

    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Run)
    }

    /// Validate values clap cannot check on its own.
    pub fn validate(&self) -> Result<(), String> {
        if self.amp_release.trim().is_empty() {
            return Err(format!("{} must not be empty", env::AMP_RELEASE));
        }
        if self.health_port == self.metrics_port {
            return Err(format!(
                "{} and {} must differ (both {})",
                env::HEALTH_PORT,
                env::METRICS_PORT,
                self.health_port
            ));
        }
        Ok(())
    }

    /// Namespace to watch, `None` for the whole cluster.
    pub fn namespace(&self) -> Option<&str> {
        self.watch_namespace.as_deref().filter(|ns| !ns.is_empty())
    }

    pub const fn requeue_interval(&self) -> Duration {
        Duration::from_secs(self.requeue_interval_secs)
    }

    pub const fn resync_interval(&self) -> Duration {
        Duration::from_secs(self.resync_interval_secs)
    }

    pub const fn error_backoff(&self) -> Duration {
        Duration::from_secs(self.error_backoff_secs)
    }

    pub const fn config_error_backoff(&self) -> Duration {
        Duration::from_secs(self.config_error_backoff_secs)
    }
}
