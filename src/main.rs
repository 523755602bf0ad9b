//! ampuo - API Management Platform upgrade operator.
//!
//! Watches `APIManager` resources and upgrades the platform they describe in
//! place: the system pre-deploy hook env, the platform image streams, the
//! store images of standalone deployments and the apicast rollout triggers.

mod cluster;
mod component;
mod config;
mod context;
mod controller;
mod crd;
mod error;
mod logging;
mod openshift;
mod reconcile;
mod status;
mod telemetry;
mod upgrade;

use std::sync::Arc;

use anyhow::Result;
use futures::StreamExt;
use kube::runtime::Controller;
use kube::runtime::watcher;
use kube::{Api, CustomResourceExt};
use tracing::{error, info};

use config::{Command, Config};
use controller::Context;
use crd::APIManager;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const COMMIT: &str = env!("BUILD_COMMIT");
pub const BUILD_DATE: &str = env!("BUILD_DATE");

#[tokio::main]
async fn main() {
    let config = Config::from_args();

    match config.command() {
        Command::Version => {
            println!("ampuo {VERSION} (commit: {COMMIT}, build: {BUILD_DATE})");
            return;
        }
        Command::Crd => {
            match serde_yaml::to_string(&APIManager::crd()) {
                Ok(yaml) => print!("{yaml}"),
                Err(e) => {
                    eprintln!("Failed to render CRD: {e}");
                    std::process::exit(1);
                }
            }
            return;
        }
        Command::Run => {}
    }

    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {e}");
        std::process::exit(1);
    }

    if let Err(e) = logging::init(&config.log_format, &config.log_level) {
        eprintln!("Failed to initialize logging: {e}");
        std::process::exit(1);
    }

    info!(
        "Starting ampuo v{} (commit: {}, build: {})",
        VERSION, COMMIT, BUILD_DATE
    );

    if let Err(e) = run(config).await {
        error!("Operator failed: {}", e);
        std::process::exit(1);
    }
}

/// Main operator loop.
async fn run(config: Config) -> Result<()> {
    let client = kube::Client::try_default().await?;
    info!("Connected to Kubernetes API server");

    let mut registry = prometheus_client::registry::Registry::default();
    let metrics = Arc::new(telemetry::metrics::Metrics::new(&mut registry));
    let registry = Arc::new(registry);

    let health_state = telemetry::health::HealthState::new();
    let health_state_clone = health_state.clone();
    let health_port = config.health_port;
    tokio::spawn(async move {
        if let Err(e) = telemetry::health::serve(health_port, health_state_clone).await {
            error!("Health server failed: {}", e);
        }
    });

    let registry_clone = registry.clone();
    let metrics_port = config.metrics_port;
    tokio::spawn(async move {
        if let Err(e) = telemetry::metrics::serve(metrics_port, registry_clone).await {
            error!("Metrics server failed: {}", e);
        }
    });

    let api: Api<APIManager> = match config.namespace() {
        Some(namespace) => {
            info!("Watching APIManager resources in namespace {}", namespace);
            Api::namespaced(client.clone(), namespace)
        }
        None => {
            info!("Watching APIManager resources in all namespaces");
            Api::all(client.clone())
        }
    };

    info!("Target platform release: {}", config.amp_release);

    let ctx = Arc::new(Context {
        kube_client: client,
        config,
        metrics,
    });

    // Mark as ready once controller starts
    health_state.set_ready(true);

    info!("Starting APIManager controller");
    Controller::new(api, watcher::Config::default())
        .shutdown_on_signal()
        .run(controller::reconcile, controller::error_policy, ctx)
        .for_each(|res| async move {
            match res {
                Ok((obj, _)) => info!("Reconciled {}", obj.name),
                Err(e) => error!("Reconcile failed: {}", e),
            }
        })
        .await;

    health_state.set_ready(false);
    info!("Controller stopped");
    Ok(())
}
