//! Graph-selection translation.
//!
//! The v1 plugin stored graph choices as backend list indices (`graph`,
//! `metric`) that only mean something relative to the recipe list the
//! backend returns for the target's context. Translation asks the resolver
//! for that list once and rewrites the indices into the stable graph and
//! metric ids the v2 schema uses.

use super::context::take_nonempty_string;
use super::paths::record_selection;
use crate::document::{Params, Target};
use crate::error::Result;
use crate::resolver::{GraphMetric, GraphResolver, GraphSpec};
use serde_json::Value;
use tracing::{debug, warn};

/// Presentation mode the v1 editor used when the field was never touched.
const DEFAULT_PRESENTATION: &str = "lines";

/// Label written when no graph could be matched for the target.
const NOT_AVAILABLE: &str = "Not available";

/// Parse the dotted `metric` reference (`"<graph>.<metric>"`) into its
/// index components. Empty components are skipped; a non-numeric component
/// voids the whole reference.
fn parse_metric_id(raw: &str) -> Vec<usize> {
    let components: Option<Vec<usize>> = raw
        .split('.')
        .filter(|part| !part.is_empty())
        .map(|part| part.parse().ok())
        .collect();
    match components {
        Some(ids) => ids,
        None => {
            warn!("Ignoring unparseable metric reference {:?}", raw);
            Vec::new()
        }
    }
}

/// Pop the legacy `graph` index, tolerating both the numeric and the
/// stringified form old dashboards contain.
fn take_graph_index(field: &mut Option<Value>) -> usize {
    match field.take() {
        None => 0,
        Some(Value::Number(n)) => n.as_u64().map(|n| n as usize).unwrap_or_else(|| {
            warn!("Ignoring non-index graph field {}", n);
            0
        }),
        Some(Value::String(s)) => s.parse().unwrap_or_else(|_| {
            if !s.is_empty() {
                warn!("Ignoring unparseable graph index {:?}", s);
            }
            0
        }),
        Some(other) => {
            warn!("Ignoring non-index graph field {}", other);
            0
        }
    }
}

/// Write `params.graph_name` together with its selection mirror.
fn set_graph_name(params: &mut Params, name: &str, label: Option<&str>) -> Result<()> {
    params.graph_name = Some(name.to_string());
    record_selection(params, &["params", "graph_name"], name, label)
}

/// Rewrite the legacy graph-selection fields of one target.
///
/// Resolver errors propagate: an unreachable backend must not be confused
/// with "no graphs for this context", which legitimately ends in the
/// explicit "Not available" placeholder.
pub async fn translate_graph(target: &mut Target, resolver: &dyn GraphResolver) -> Result<()> {
    if !target.has_legacy_graph_fields() {
        return Ok(());
    }

    let mode = take_nonempty_string(&mut target.mode, "mode").unwrap_or_default();
    let metric_id = take_nonempty_string(&mut target.metric, "metric")
        .map(|raw| parse_metric_id(&raw))
        .unwrap_or_default();
    let graph_index = take_graph_index(&mut target.graph);
    let presentation = take_nonempty_string(&mut target.presentiation, "presentiation")
        .unwrap_or_else(|| DEFAULT_PRESENTATION.to_string());
    let combined_graph = take_nonempty_string(&mut target.combinedgraph, "combinedgraph");

    let params = target.params.get_or_insert_with(Default::default);

    // Combined graphs are addressed by name, not by recipe index, so no
    // resolver round trip is needed.
    if let Some(name) = combined_graph {
        set_graph_name(params, &name, None)?;
        params.presentation = Some(presentation);
        return Ok(());
    }

    let context = target.context.clone().unwrap_or_default();
    let graphs = resolver.resolve(&context).await?;
    debug!(
        "Resolved {} candidate graphs for mode {:?}",
        graphs.len(),
        mode
    );

    if mode == "graph" && graph_index < graphs.len() {
        let graph = &graphs[graph_index];
        return set_graph_name(params, &graph.graph_id, Some(&graph.title));
    }

    if mode == "metric" && metric_id.len() == 2 {
        if let Some(metric) = metric_at(&graphs, metric_id[0], metric_id[1]) {
            // Derived-metric expressions have no stable id to migrate to;
            // the reference is dropped rather than replaced with a guess.
            if let Some(id) = metric.rrd_metric_id() {
                params.graph_mode = Some("metric".to_string());
                return set_graph_name(params, id, Some(&metric.title));
            }
            return Ok(());
        }
    }

    set_graph_name(params, "", Some(NOT_AVAILABLE))
}

fn metric_at(graphs: &[GraphSpec], graph_index: usize, metric_index: usize) -> Option<&GraphMetric> {
    graphs.get(graph_index)?.metrics.get(metric_index)
}
