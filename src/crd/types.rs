//! Per-component spec sections of an `APIManager`.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// High availability settings.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HighAvailabilitySpec {
    /// Redis and the system database run outside the platform namespace.
    #[serde(default)]
    pub enabled: bool,
}

/// API gateway (routing tier) settings.
#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApicastSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BackendSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Image of the backend cache store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redis_image: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SystemSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Image of the system primary datastore.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redis_image: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memcached_image: Option<String>,

    /// Database engine selection. Exactly one engine is expected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<SystemDatabaseSpec>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SystemDatabaseSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mysql: Option<MySqlSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postgresql: Option<PostgreSqlSpec>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MySqlSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostgreSqlSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ZyncSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Image of the zync PostgreSQL database.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postgresql_image: Option<String>,
}
