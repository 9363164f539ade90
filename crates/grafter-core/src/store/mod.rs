//! Dashboard storage backends.
//!
//! Dashboards either live as rows in Grafana's SQLite database or as
//! exported JSON files; both hand the migration engine the same
//! [`crate::document::Dashboard`] value.

pub mod file;
pub mod sqlite;

pub use sqlite::{DashboardRow, GrafanaDb};
