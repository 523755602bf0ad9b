//! Custom error types for ampuo.

use thiserror::Error;

/// Errors that can stop an upgrade pass.
#[derive(Error, Debug)]
pub enum Error {
    /// A prerequisite object is absent from the cluster.
    #[error("{kind} {namespace}/{name} not found")]
    NotFound {
        kind: &'static str,
        namespace: String,
        name: String,
    },

    /// The hook-bearing workload exists but carries no pre-deploy hook pod.
    #[error("DeploymentConfig {namespace}/{name} has no pre-deploy hook")]
    MissingPreHook { namespace: String, name: String },

    /// Read or write rejected by the API server (including version conflicts).
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    #[error("System database is not set")]
    DatabaseNotSet,

    #[error("invalid image options: {}", .0.join("; "))]
    InvalidImageOptions(Vec<&'static str>),

    #[error("{0} has no namespace")]
    MissingNamespace(String),
}

impl Error {
    /// Shorthand for a missing object lookup.
    pub fn not_found(kind: &'static str, namespace: &str, name: &str) -> Self {
        Self::NotFound {
            kind,
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }

    /// Returns true if this error is transient and a quick retry may succeed.
    ///
    /// Only used to pick a backoff. Every error is retried by the controller.
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Kube(_))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
