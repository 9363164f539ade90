//! Configuration for Grafter migrations.
//!
//! Migration inputs are explicit values handed to the engine, never globals:
//! the datasource identifiers travel in a [`MigrationConfig`] and the
//! resolver credentials in a [`DatasourceConfig`].

use serde::Deserialize;
use std::time::Duration;

/// Datasource types written by the v1 connector plugin.
///
/// Only panels bound to a datasource of one of these types ever carry the
/// legacy flat query schema.
pub const LEGACY_DATASOURCE_TYPES: [&str; 2] =
    ["checkmk-datasource", "tribe-29-checkmk-datasource"];

/// Resolver network configuration.
pub struct ResolverConfig;

impl ResolverConfig {
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);
    pub const WEBAPI_PATH: &'static str = "check_mk/webapi.py";
    pub const RECIPES_ACTION: &'static str = "get_graph_recipes";
}

/// Parameters of one migration run.
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    /// Name of the v1 connector datasource whose panels get migrated.
    pub datasource_old: String,
    /// Name of the v2 connector datasource the panels are rebound to.
    pub datasource_new: String,
    /// Optional replacement dashboard title.
    pub new_title: Option<String>,
}

impl MigrationConfig {
    pub fn new(datasource_old: impl Into<String>, datasource_new: impl Into<String>) -> Self {
        Self {
            datasource_old: datasource_old.into(),
            datasource_new: datasource_new.into(),
            new_title: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.new_title = Some(title.into());
        self
    }
}

/// Connection settings of a stored Checkmk datasource.
///
/// Deserialized from the `json_data` column of Grafana's `data_source`
/// table; `name` and `ds_type` come from the row itself.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatasourceConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub secret: String,
    #[serde(skip)]
    pub name: String,
    #[serde(skip)]
    pub ds_type: String,
}

impl DatasourceConfig {
    /// Parse the `json_data` column, attaching the row-level identity.
    pub fn from_json_data(
        json_data: &str,
        name: impl Into<String>,
        ds_type: impl Into<String>,
    ) -> crate::Result<Self> {
        let mut config: DatasourceConfig = serde_json::from_str(json_data)?;
        config.name = name.into();
        config.ds_type = ds_type.into();
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_config_builder() {
        let config = MigrationConfig::new("Checkmk v1", "Checkmk v2").with_title("Renamed");
        assert_eq!(config.datasource_old, "Checkmk v1");
        assert_eq!(config.datasource_new, "Checkmk v2");
        assert_eq!(config.new_title.as_deref(), Some("Renamed"));
    }

    #[test]
    fn test_datasource_config_from_json_data() {
        let config = DatasourceConfig::from_json_data(
            r#"{"url":"http://cmk/mysite","username":"automation","secret":"s3cret"}"#,
            "Checkmk v1",
            "checkmk-datasource",
        )
        .unwrap();
        assert_eq!(config.url, "http://cmk/mysite");
        assert_eq!(config.username, "automation");
        assert_eq!(config.secret, "s3cret");
        assert_eq!(config.name, "Checkmk v1");
        assert_eq!(config.ds_type, "checkmk-datasource");
    }

    #[test]
    fn test_datasource_config_tolerates_missing_fields() {
        let config =
            DatasourceConfig::from_json_data(r#"{"url":"http://cmk"}"#, "ds", "checkmk-datasource")
                .unwrap();
        assert!(config.username.is_empty());
        assert!(config.secret.is_empty());
    }

    #[test]
    fn test_timeouts_are_reasonable() {
        assert!(ResolverConfig::REQUEST_TIMEOUT > Duration::ZERO);
        assert!(ResolverConfig::CONNECT_TIMEOUT <= ResolverConfig::REQUEST_TIMEOUT);
    }
}
