//! Typed subsets of the OpenShift `apps` and `image` APIs.
//!
//! Only the fields the upgrade touches are modeled. Everything else is kept in
//! `extra` so that a get-modify-replace cycle does not drop server data.

pub mod apps;
pub mod image;

pub use apps::{DeploymentConfig, DeploymentTriggerPolicy};
#[allow(unused_imports)]
pub use apps::{
    DeploymentConfigSpec, DeploymentStrategy, DeploymentTriggerImageChangeParams, ExecNewPodHook,
    LifecycleHook, RollingDeploymentStrategyParams,
};
pub use image::{ImageStream, ImageStreamSpec, TagReference};
#[allow(unused_imports)]
pub use image::TagImportPolicy;
