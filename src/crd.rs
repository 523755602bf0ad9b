//! `APIManager` CRD type definition.

pub mod spec;
pub mod status;
pub mod types;

pub use spec::{APIManager, APIManagerSpec};
pub use status::{APIManagerStatus, UpgradeCondition};
#[allow(unused_imports)]
pub use types::{
    ApicastSpec, BackendSpec, HighAvailabilitySpec, MySqlSpec, PostgreSqlSpec,
    SystemDatabaseSpec, SystemSpec, ZyncSpec,
};
