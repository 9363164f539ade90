//! Grafana SQLite database access.
//!
//! Reads datasource credentials and dashboard rows straight from Grafana's
//! own `grafana.db` and writes migrated documents back the way Grafana
//! itself would: version bump, history row in `dashboard_version`, then the
//! `dashboard` row update, all in one transaction.

use crate::config::{DatasourceConfig, LEGACY_DATASOURCE_TYPES};
use crate::document::Dashboard;
use crate::error::{GrafterError, Result};
use chrono::Local;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

/// Change message recorded in `dashboard_version` for every migration save.
const VERSION_MESSAGE: &str = "Checkmk connector update";

/// Timestamp format Grafana stores in `created`/`updated` columns.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One row of the `dashboard` table, JSON payload still unparsed.
#[derive(Debug, Clone)]
pub struct DashboardRow {
    pub id: i64,
    pub created_by: i64,
    pub data: String,
}

/// Handle on a Grafana SQLite database.
///
/// Thread-safe via internal mutex on the connection.
pub struct GrafanaDb {
    conn: Mutex<Connection>,
}

impl GrafanaDb {
    /// Open an existing Grafana database.
    ///
    /// The file must already exist: opening a path Grafana never wrote
    /// would silently create an empty database and make every later query
    /// look like "no dashboards", so that case fails up front.
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref();
        if !db_path.is_file() {
            return Err(GrafterError::Config {
                message: format!("Grafana database not found at {}", db_path.display()),
            });
        }

        let conn = Connection::open(db_path).map_err(|e| GrafterError::Database {
            message: format!("Failed to open Grafana database: {}", e),
            source: Some(e),
        })?;
        debug!("Opened Grafana database at {}", db_path.display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| GrafterError::Database {
            message: format!("Failed to lock database: {}", e),
            source: None,
        })
    }

    /// All datasources written by a legacy connector plugin, with their
    /// connection settings parsed out of `json_data`.
    pub fn datasource_configs(&self) -> Result<Vec<DatasourceConfig>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT type, name, json_data FROM data_source")
            .map_err(|e| GrafterError::Database {
                message: format!("Failed to query datasources: {}", e),
                source: Some(e),
            })?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })
            .map_err(|e| GrafterError::Database {
                message: format!("Failed to read datasources: {}", e),
                source: Some(e),
            })?;

        let mut configs = Vec::new();
        for row in rows {
            let (ds_type, name, json_data) = row?;
            if !LEGACY_DATASOURCE_TYPES.contains(&ds_type.as_str()) {
                continue;
            }
            configs.push(DatasourceConfig::from_json_data(&json_data, name, ds_type)?);
        }
        Ok(configs)
    }

    /// Connection settings of the named legacy datasource.
    pub fn datasource_config(&self, name: &str) -> Result<DatasourceConfig> {
        self.datasource_configs()?
            .into_iter()
            .find(|config| config.name == name)
            .ok_or_else(|| GrafterError::DatasourceNotFound {
                name: name.to_string(),
            })
    }

    /// Every dashboard row in the database.
    pub fn dashboards(&self) -> Result<Vec<DashboardRow>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT id, created_by, data FROM dashboard")
            .map_err(|e| GrafterError::Database {
                message: format!("Failed to query dashboards: {}", e),
                source: Some(e),
            })?;

        let rows = stmt
            .query_map([], |row| {
                Ok(DashboardRow {
                    id: row.get(0)?,
                    created_by: row.get(1)?,
                    data: row.get(2)?,
                })
            })
            .map_err(|e| GrafterError::Database {
                message: format!("Failed to read dashboards: {}", e),
                source: Some(e),
            })?;

        let mut dashboards = Vec::new();
        for row in rows {
            dashboards.push(row?);
        }
        Ok(dashboards)
    }

    /// Persist a migrated dashboard under the identity of `row`.
    ///
    /// Bumps the document version, appends the previous version to
    /// `dashboard_version` and updates the `dashboard` row, as a single
    /// transaction so Grafana never sees a half-saved state.
    pub fn save_dashboard(&self, row: &DashboardRow, dashboard: &mut Dashboard) -> Result<()> {
        let parent_version = dashboard.version;
        dashboard.version += 1;
        let data = serde_json::to_string(dashboard)?;
        let now = Local::now().format(TIMESTAMP_FORMAT).to_string();

        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(|e| GrafterError::Database {
            message: format!("Failed to begin transaction: {}", e),
            source: Some(e),
        })?;

        tx.execute(
            r#"
            INSERT INTO dashboard_version
                (dashboard_id, parent_version, restored_from, version,
                 created, created_by, message, data)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                row.id,
                parent_version,
                0,
                dashboard.version,
                now,
                row.created_by,
                VERSION_MESSAGE,
                data,
            ],
        )
        .map_err(|e| GrafterError::Database {
            message: format!("Failed to record dashboard version: {}", e),
            source: Some(e),
        })?;

        tx.execute(
            "UPDATE dashboard SET data = ?1, version = ?2, updated = ?3 WHERE id = ?4",
            params![data, dashboard.version, now, row.id],
        )
        .map_err(|e| GrafterError::Database {
            message: format!("Failed to update dashboard {}: {}", row.id, e),
            source: Some(e),
        })?;

        tx.commit().map_err(|e| GrafterError::Database {
            message: format!("Failed to commit dashboard {}: {}", row.id, e),
            source: Some(e),
        })?;
        debug!(
            "Saved dashboard {} as version {}",
            row.id, dashboard.version
        );
        Ok(())
    }
}
