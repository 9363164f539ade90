//! Graph resolution capability.
//!
//! The migration engine disambiguates legacy numeric graph references by
//! asking the monitoring backend which graphs exist for a query context.
//! [`GraphResolver`] is the seam; [`webapi::WebApiResolver`] is the
//! production implementation over the Checkmk web API.

pub mod webapi;

use crate::document::Context;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use webapi::WebApiResolver;

/// Position of the stable metric id inside an `rrd` expression tuple:
/// `["rrd", site, host, service, metric_id, ...]`.
const RRD_METRIC_ID_INDEX: usize = 4;

/// Ordered list of candidate graphs for a monitoring context.
///
/// Order matters: legacy targets reference graphs and metrics by index into
/// exactly this list.
#[async_trait]
pub trait GraphResolver: Send + Sync {
    async fn resolve(&self, context: &Context) -> Result<Vec<GraphSpec>>;
}

/// One graph known to the monitoring backend for a context.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphSpec {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub graph_id: String,
    #[serde(default)]
    pub metrics: Vec<GraphMetric>,
}

/// One metric of a graph, with its backend expression tuple.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphMetric {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub expression: Vec<Value>,
}

impl GraphMetric {
    /// Stable metric id, present only when the expression is a raw `rrd`
    /// reference. Derived-metric expressions (sums, differences, ...) have
    /// no stable id and return `None`.
    pub fn rrd_metric_id(&self) -> Option<&str> {
        if self.expression.first()?.as_str()? != "rrd" {
            return None;
        }
        self.expression.get(RRD_METRIC_ID_INDEX)?.as_str()
    }
}
