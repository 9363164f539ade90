//! End-to-end migration tests over full dashboard documents.

use async_trait::async_trait;
use grafter_core::resolver::{GraphMetric, GraphResolver, GraphSpec};
use grafter_core::{migrate_dashboard, Context, Dashboard, MigrationConfig, Result};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Canned resolver recording every call it receives.
struct MockResolver {
    graphs: Vec<GraphSpec>,
    calls: AtomicUsize,
}

impl MockResolver {
    fn new(graphs: Vec<GraphSpec>) -> Self {
        Self {
            graphs,
            calls: AtomicUsize::new(0),
        }
    }

    fn empty() -> Self {
        Self::new(Vec::new())
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GraphResolver for MockResolver {
    async fn resolve(&self, _context: &Context) -> Result<Vec<GraphSpec>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.graphs.clone())
    }
}

fn cpu_graphs() -> Vec<GraphSpec> {
    vec![GraphSpec {
        title: "CPU utilization".into(),
        graph_id: "cpu_utilization_5".into(),
        metrics: vec![
            GraphMetric {
                title: "User".into(),
                expression: vec![
                    json!("rrd"),
                    json!("mysite"),
                    json!("srv1"),
                    json!("CPU utilization"),
                    json!("user"),
                    json!("max"),
                ],
            },
            GraphMetric {
                title: "System".into(),
                expression: vec![
                    json!("rrd"),
                    json!("mysite"),
                    json!("srv1"),
                    json!("CPU utilization"),
                    json!("system"),
                    json!("max"),
                ],
            },
        ],
    }]
}

fn config() -> MigrationConfig {
    MigrationConfig::new("Checkmk v1", "Checkmk v2")
}

fn dashboard_with_target(target: Value) -> Dashboard {
    serde_json::from_value(json!({
        "title": "Overview",
        "uid": "abc123",
        "version": 5,
        "panels": [{
            "datasource": "Checkmk v1",
            "id": 2,
            "targets": [target]
        }]
    }))
    .unwrap()
}

fn first_target(dashboard: &Dashboard) -> &Value {
    dashboard.panels[0].pointer("/targets/0").unwrap()
}

#[tokio::test]
async fn test_target_without_legacy_fields_gains_no_keys() {
    let resolver = MockResolver::empty();
    let mut dashboard = dashboard_with_target(json!({"refId": "A"}));

    migrate_dashboard(&mut dashboard, &config(), &resolver)
        .await
        .unwrap();

    assert_eq!(first_target(&dashboard), &json!({"refId": "A"}));
    assert_eq!(resolver.call_count(), 0);
}

#[tokio::test]
async fn test_host_filter_moves_with_selection_mirror() {
    let resolver = MockResolver::empty();
    let mut dashboard = dashboard_with_target(json!({"refId": "A", "host": "srv1"}));

    migrate_dashboard(&mut dashboard, &config(), &resolver)
        .await
        .unwrap();

    let target = first_target(&dashboard);
    assert_eq!(target.pointer("/context/host/host"), Some(&json!("srv1")));
    assert_eq!(
        target.pointer("/params/selections/context/host/host"),
        Some(&json!({"value": "srv1", "label": "srv1", "isDisabled": false}))
    );
    assert!(target.get("host").is_none());
}

#[tokio::test]
async fn test_host_tag_filters_are_grouped() {
    let resolver = MockResolver::empty();
    let mut dashboard = dashboard_with_target(json!({
        "filter0grp": "criticality",
        "filter0val": "prod",
        "filter0op": "is"
    }));

    migrate_dashboard(&mut dashboard, &config(), &resolver)
        .await
        .unwrap();

    let target = first_target(&dashboard);
    assert_eq!(
        target.pointer("/context/host_tags"),
        Some(&json!({
            "host_tag_0_grp": "criticality",
            "host_tag_0_val": "prod",
            "host_tag_0_op": "is"
        }))
    );
}

#[tokio::test]
async fn test_operator_only_filter_leaves_no_host_tags() {
    let resolver = MockResolver::empty();
    let mut dashboard = dashboard_with_target(json!({"filter1op": "is"}));

    migrate_dashboard(&mut dashboard, &config(), &resolver)
        .await
        .unwrap();

    let target = first_target(&dashboard);
    assert!(target.pointer("/context/host_tags").is_none());
    assert!(target.get("filter1op").is_none());
}

#[tokio::test]
async fn test_metric_mode_translates_to_stable_metric_id() {
    let resolver = MockResolver::new(cpu_graphs());
    let mut dashboard = dashboard_with_target(json!({
        "host": "srv1",
        "service": "CPU utilization",
        "site": "mysite",
        "mode": "metric",
        "metric": "0.1"
    }));

    migrate_dashboard(&mut dashboard, &config(), &resolver)
        .await
        .unwrap();

    let target = first_target(&dashboard);
    assert_eq!(target.pointer("/params/graphMode"), Some(&json!("metric")));
    assert_eq!(target.pointer("/params/graph_name"), Some(&json!("system")));
    assert_eq!(
        target.pointer("/params/selections/params/graph_name/label"),
        Some(&json!("System"))
    );
    assert_eq!(resolver.call_count(), 1);
}

#[tokio::test]
async fn test_combined_graph_never_calls_resolver() {
    let resolver = MockResolver::new(cpu_graphs());
    let mut dashboard = dashboard_with_target(json!({
        "combinedgraph": "CPU overview",
        "presentiation": "sum"
    }));

    migrate_dashboard(&mut dashboard, &config(), &resolver)
        .await
        .unwrap();

    let target = first_target(&dashboard);
    assert_eq!(resolver.call_count(), 0);
    assert_eq!(
        target.pointer("/params/graph_name"),
        Some(&json!("CPU overview"))
    );
    assert_eq!(target.pointer("/params/presentation"), Some(&json!("sum")));
}

#[tokio::test]
async fn test_out_of_range_graph_gets_placeholder() {
    let resolver = MockResolver::new(cpu_graphs());
    let mut dashboard = dashboard_with_target(json!({
        "mode": "graph",
        "graph": 9
    }));

    migrate_dashboard(&mut dashboard, &config(), &resolver)
        .await
        .unwrap();

    let target = first_target(&dashboard);
    assert_eq!(target.pointer("/params/graph_name"), Some(&json!("")));
    assert_eq!(
        target.pointer("/params/selections/params/graph_name/label"),
        Some(&json!("Not available"))
    );
}

#[tokio::test]
async fn test_foreign_panels_are_untouched() {
    let resolver = MockResolver::empty();
    let foreign = json!({
        "datasource": "Prometheus",
        "id": 7,
        "targets": [{"refId": "A", "expr": "up", "host": "should-stay"}],
        "fieldConfig": {"defaults": {"unit": "percent"}}
    });
    let mut dashboard: Dashboard = serde_json::from_value(json!({
        "title": "Mixed",
        "panels": [
            foreign.clone(),
            {"datasource": "Checkmk v1", "targets": [{"host": "srv1"}]}
        ]
    }))
    .unwrap();

    let migrated = migrate_dashboard(&mut dashboard, &config(), &resolver)
        .await
        .unwrap();

    assert_eq!(migrated, 1);
    assert_eq!(dashboard.panels[0], foreign);
}

#[tokio::test]
async fn test_full_target_translates_every_stage() {
    let resolver = MockResolver::new(cpu_graphs());
    let mut dashboard = dashboard_with_target(json!({
        "refId": "A",
        "host": "srv1",
        "service": "CPU utilization",
        "site": "mysite",
        "hostregex": "srv.*",
        "format": "time_series",
        "usehostregex": false,
        "filter0grp": "criticality",
        "filter0val": "prod",
        "filter0op": "is",
        "mode": "graph",
        "graph": 0,
        "presentiation": "lines"
    }));

    migrate_dashboard(&mut dashboard, &config(), &resolver)
        .await
        .unwrap();

    assert_eq!(
        dashboard.panels[0].get("datasource"),
        Some(&json!("Checkmk v2"))
    );
    let target = first_target(&dashboard);

    // Every legacy key is gone.
    for legacy in [
        "host",
        "service",
        "site",
        "hostregex",
        "format",
        "usehostregex",
        "filter0grp",
        "filter0val",
        "filter0op",
        "mode",
        "graph",
        "presentiation",
    ] {
        assert!(target.get(legacy).is_none(), "legacy key {:?} kept", legacy);
    }

    assert_eq!(target.pointer("/refId"), Some(&json!("A")));
    assert_eq!(target.pointer("/context/host/host"), Some(&json!("srv1")));
    assert_eq!(
        target.pointer("/context/hostregex/host_regex"),
        Some(&json!("srv.*"))
    );
    assert_eq!(
        target.pointer("/context/host_tags/host_tag_0_val"),
        Some(&json!("prod"))
    );
    assert_eq!(
        target.pointer("/params/graph_name"),
        Some(&json!("cpu_utilization_5"))
    );
    assert_eq!(
        target.pointer("/params/selections/params/graph_name/label"),
        Some(&json!("CPU utilization"))
    );
}

#[tokio::test]
async fn test_rerun_over_migrated_dashboard_changes_nothing() {
    let resolver = MockResolver::new(cpu_graphs());
    let mut dashboard = dashboard_with_target(json!({
        "host": "srv1",
        "mode": "graph",
        "graph": 0
    }));

    migrate_dashboard(&mut dashboard, &config(), &resolver)
        .await
        .unwrap();
    let first_pass = serde_json::to_value(&dashboard).unwrap();
    let calls_after_first = resolver.call_count();

    let rerun = MigrationConfig::new("Checkmk v2", "Checkmk v2");
    migrate_dashboard(&mut dashboard, &rerun, &resolver)
        .await
        .unwrap();

    assert_eq!(serde_json::to_value(&dashboard).unwrap(), first_pass);
    assert_eq!(resolver.call_count(), calls_after_first);
}
