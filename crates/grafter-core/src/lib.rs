//! Grafter Core - Headless engine for migrating Grafana dashboards from the
//! legacy Checkmk connector plugin to the current one.
//!
//! This crate rewrites panel query targets from the flat v1 schema to the
//! nested v2 schema, resolving legacy numeric graph references against the
//! Checkmk web API. It can be used programmatically without any CLI layer.
//!
//! # Example
//!
//! ```rust,ignore
//! use grafter_core::{migrate_dashboard, MigrationConfig, WebApiResolver};
//!
//! #[tokio::main]
//! async fn main() -> grafter_core::Result<()> {
//!     let resolver = WebApiResolver::new("http://cmk/mysite", "automation", "s3cret")?;
//!     let mut dashboard = grafter_core::store::file::load_dashboard("dashboard.json")?;
//!
//!     let config = MigrationConfig::new("Checkmk v1", "Checkmk v2");
//!     let migrated = migrate_dashboard(&mut dashboard, &config, &resolver).await?;
//!     println!("Migrated {} targets", migrated);
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod document;
pub mod error;
pub mod migration;
pub mod resolver;
pub mod store;

// Re-export commonly used types
pub use config::{DatasourceConfig, MigrationConfig, LEGACY_DATASOURCE_TYPES};
pub use document::{Context, Dashboard, Panel, Params, Target};
pub use error::{GrafterError, Result};
pub use migration::{migrate_dashboard, migrate_target};
pub use resolver::{GraphMetric, GraphResolver, GraphSpec, WebApiResolver};
pub use store::{DashboardRow, GrafanaDb};
