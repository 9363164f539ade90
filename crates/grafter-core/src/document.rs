//! Typed records for Grafana dashboard documents.
//!
//! The migration engine only types the parts of the document it rewrites.
//! Panels stay raw [`serde_json::Value`]s inside [`Dashboard`] until a panel
//! is selected for migration, so panels bound to other datasources round-trip
//! unchanged. Unknown keys at every typed level are kept in a flattened
//! passthrough map.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A Grafana dashboard document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dashboard {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub uid: String,
    #[serde(default)]
    pub version: i64,
    #[serde(default)]
    pub panels: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A dashboard panel, parsed only when its datasource matches the one
/// being migrated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Panel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datasource: Option<String>,
    #[serde(default)]
    pub targets: Vec<Target>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A panel query target, carrying both the legacy flat v1 fields (before
/// migration) and the nested v2 shape (after).
///
/// Legacy fields are `Option<Value>` rather than typed scalars: old
/// dashboards hold whatever the v1 plugin happened to store, and a field of
/// an unexpected type must skip its own translation instead of failing the
/// document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Target {
    // Legacy v1 fields, consumed by migration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostregex: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serviceregex: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub combinedgraph: Option<Value>,
    // Field name as written by the v1 plugin, typo included.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presentiation: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usehostregex: Option<Value>,

    // Nested v2 shape, produced by migration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Context>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Params>,

    // Everything else: refId, dynamic filter<N><suffix> host-tag keys, etc.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Target {
    /// True when any legacy graph-selection field is still present.
    pub fn has_legacy_graph_fields(&self) -> bool {
        self.mode.is_some()
            || self.metric.is_some()
            || self.graph.is_some()
            || self.combinedgraph.is_some()
            || self.presentiation.is_some()
    }
}

/// The v2 query context: one sub-object per filter kind, each keyed by its
/// semantic field name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Context {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<HostFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostregex: Option<HostRegexFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<ServiceFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serviceregex: Option<ServiceRegexFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub siteopt: Option<SiteFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_tags: Option<Map<String, Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Context {
    /// Site filter value, empty when unset.
    pub fn site(&self) -> &str {
        self.siteopt.as_ref().map(|s| s.site.as_str()).unwrap_or("")
    }

    /// Host filter value, empty when unset.
    pub fn host_name(&self) -> &str {
        self.host.as_ref().map(|h| h.host.as_str()).unwrap_or("")
    }

    /// Service filter value, empty when unset.
    pub fn service_description(&self) -> &str {
        self.service
            .as_ref()
            .map(|s| s.service.as_str())
            .unwrap_or("")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HostFilter {
    pub host: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HostRegexFilter {
    pub host_regex: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceFilter {
    pub service: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceRegexFilter {
    pub service_regex: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteFilter {
    pub site: String,
}

/// The v2 query parameters, including the dynamic UI-selection mirror.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Params {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph_name: Option<String>,
    #[serde(rename = "graphMode", default, skip_serializing_if = "Option::is_none")]
    pub graph_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presentation: Option<String>,
    /// Mirror tree of the `context`/`params` key paths, each leaf a
    /// `{value, label, isDisabled}` object for UI rehydration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selections: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
