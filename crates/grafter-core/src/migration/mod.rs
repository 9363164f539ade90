//! Dashboard migration engine.
//!
//! Rewrites panel targets from the flat v1 query schema to the nested v2
//! schema, one translation stage per concern: host tags, plain filters,
//! graph selection. Stages run in that fixed order because host-tag
//! extraction and filter translation both write into `context`, and the
//! graph stage reads the finished `context` for its resolver call.

mod context;
mod graph;
mod host_tags;
mod paths;

use crate::config::MigrationConfig;
use crate::document::{Dashboard, Panel, Target};
use crate::error::Result;
use crate::resolver::GraphResolver;
use serde_json::Value;
use tracing::{debug, info};

pub use paths::{selection_entry, set_path};

/// Migrate one target through all translation stages.
pub async fn migrate_target(target: &mut Target, resolver: &dyn GraphResolver) -> Result<()> {
    host_tags::translate_host_tags(target)?;
    context::translate_context(target)?;
    graph::translate_graph(target, resolver).await
}

/// Migrate every panel of `dashboard` that is bound to the legacy
/// datasource, rebinding it to the new one.
///
/// Panels on other datasources pass through untouched, raw JSON included.
/// Returns the number of migrated targets; `0` means the dashboard did not
/// reference the legacy datasource at all.
pub async fn migrate_dashboard(
    dashboard: &mut Dashboard,
    config: &MigrationConfig,
    resolver: &dyn GraphResolver,
) -> Result<usize> {
    let mut migrated = 0;

    for panel_value in &mut dashboard.panels {
        let datasource = panel_value.get("datasource").and_then(Value::as_str);
        if datasource != Some(config.datasource_old.as_str()) {
            continue;
        }

        let mut panel: Panel = serde_json::from_value(panel_value.clone())?;
        panel.datasource = Some(config.datasource_new.clone());
        for target in &mut panel.targets {
            migrate_target(target, resolver).await?;
            migrated += 1;
        }
        *panel_value = serde_json::to_value(&panel)?;
    }

    if let Some(title) = &config.new_title {
        dashboard.title = title.clone();
    }

    if migrated > 0 {
        info!(
            "Migrated {} targets of dashboard {:?} to datasource {:?}",
            migrated, dashboard.title, config.datasource_new
        );
    } else {
        debug!(
            "Dashboard {:?} has no panels on datasource {:?}",
            dashboard.title, config.datasource_old
        );
    }
    Ok(migrated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::GraphSpec;
    use async_trait::async_trait;
    use serde_json::json;

    struct EmptyResolver;

    #[async_trait]
    impl GraphResolver for EmptyResolver {
        async fn resolve(
            &self,
            _context: &crate::document::Context,
        ) -> Result<Vec<GraphSpec>> {
            Ok(Vec::new())
        }
    }

    fn config() -> MigrationConfig {
        MigrationConfig::new("Checkmk v1", "Checkmk v2")
    }

    #[tokio::test]
    async fn test_only_matching_panels_are_rewritten() {
        let mut dashboard: Dashboard = serde_json::from_value(json!({
            "title": "Overview",
            "panels": [
                {
                    "datasource": "Checkmk v1",
                    "targets": [{"refId": "A", "host": "srv1"}]
                },
                {
                    "datasource": "Prometheus",
                    "targets": [{"refId": "B", "expr": "up"}],
                    "options": {"legend": false}
                },
                {"type": "row"}
            ]
        }))
        .unwrap();
        let untouched = dashboard.panels[1].clone();

        let migrated = migrate_dashboard(&mut dashboard, &config(), &EmptyResolver)
            .await
            .unwrap();

        assert_eq!(migrated, 1);
        assert_eq!(
            dashboard.panels[0].get("datasource"),
            Some(&json!("Checkmk v2"))
        );
        assert_eq!(
            dashboard.panels[0].pointer("/targets/0/context/host/host"),
            Some(&json!("srv1"))
        );
        assert!(dashboard.panels[0].pointer("/targets/0/host").is_none());
        // Foreign panels round-trip byte-for-byte.
        assert_eq!(dashboard.panels[1], untouched);
        assert_eq!(dashboard.panels[2], json!({"type": "row"}));
    }

    #[tokio::test]
    async fn test_title_override() {
        let mut dashboard = Dashboard {
            title: "Old title".into(),
            ..Default::default()
        };
        migrate_dashboard(
            &mut dashboard,
            &config().with_title("New title"),
            &EmptyResolver,
        )
        .await
        .unwrap();
        assert_eq!(dashboard.title, "New title");
    }

    #[tokio::test]
    async fn test_second_run_is_a_no_op() {
        let mut dashboard: Dashboard = serde_json::from_value(json!({
            "panels": [{
                "datasource": "Checkmk v1",
                "targets": [{
                    "refId": "A",
                    "host": "srv1",
                    "mode": "graph",
                    "graph": 0
                }]
            }]
        }))
        .unwrap();

        migrate_dashboard(&mut dashboard, &config(), &EmptyResolver)
            .await
            .unwrap();
        let first = dashboard.panels.clone();

        // Re-running against the already-migrated document only re-matches
        // on the new datasource name.
        let rerun = MigrationConfig::new("Checkmk v2", "Checkmk v2");
        migrate_dashboard(&mut dashboard, &rerun, &EmptyResolver)
            .await
            .unwrap();
        assert_eq!(dashboard.panels, first);
    }

    #[tokio::test]
    async fn test_resolver_failure_fails_the_dashboard() {
        struct FailingResolver;

        #[async_trait]
        impl GraphResolver for FailingResolver {
            async fn resolve(
                &self,
                _context: &crate::document::Context,
            ) -> Result<Vec<GraphSpec>> {
                Err(crate::error::GrafterError::Resolver {
                    message: "connection refused".into(),
                    source: None,
                })
            }
        }

        let mut dashboard: Dashboard = serde_json::from_value(json!({
            "panels": [{
                "datasource": "Checkmk v1",
                "targets": [{"mode": "graph"}]
            }]
        }))
        .unwrap();

        let err = migrate_dashboard(&mut dashboard, &config(), &FailingResolver)
            .await
            .unwrap_err();
        assert!(err.is_resolver_failure());
    }
}
