//! File-based dashboard storage.
//!
//! For migrating a single exported dashboard JSON without touching a
//! Grafana database.

use crate::document::Dashboard;
use crate::error::{GrafterError, Result};
use std::path::Path;

/// Load a dashboard document from a JSON export file.
pub fn load_dashboard(path: impl AsRef<Path>) -> Result<Dashboard> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|e| GrafterError::io_with_path(e, path))?;
    serde_json::from_str(&raw).map_err(|e| GrafterError::Json {
        message: format!("Invalid dashboard JSON in {}: {}", path.display(), e),
        source: Some(e),
    })
}

/// Write a dashboard document as pretty-printed JSON.
pub fn save_dashboard(path: impl AsRef<Path>, dashboard: &Dashboard) -> Result<()> {
    let path = path.as_ref();
    let raw = serde_json::to_string_pretty(dashboard)?;
    std::fs::write(path, raw).map_err(|e| GrafterError::io_with_path(e, path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_roundtrip_preserves_document() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("dashboard.json");

        let source = temp_dir.path().join("source.json");
        std::fs::write(
            &source,
            r#"{"title":"Overview","version":2,"panels":[{"type":"graph"}],"tags":["prod"]}"#,
        )
        .unwrap();

        let dashboard = load_dashboard(&source).unwrap();
        assert_eq!(dashboard.title, "Overview");
        save_dashboard(&path, &dashboard).unwrap();

        let reloaded = load_dashboard(&path).unwrap();
        assert_eq!(reloaded.version, 2);
        assert_eq!(reloaded.extra.get("tags"), Some(&json!(["prod"])));
    }

    #[test]
    fn test_load_missing_file_names_the_path() {
        let err = load_dashboard("/no/such/dashboard.json").unwrap_err();
        assert!(err.to_string().contains("dashboard.json"));
    }

    #[test]
    fn test_load_rejects_invalid_json() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(load_dashboard(&path).is_err());
    }
}
