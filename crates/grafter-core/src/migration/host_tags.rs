//! Host-tag filter translation.
//!
//! The v1 plugin stored host-tag filters as dynamic flat keys
//! `filter<N><suffix>` on the target, one triple of keys per filter slot:
//! group, value and operator. The v2 schema groups them under
//! `context.host_tags` as `host_tag_<N>_<code>` entries.

use super::paths::record_selection;
use crate::document::{Context, Target};
use crate::error::Result;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::warn;

/// Suffix written by the v1 plugin, normalized to the v2 key code.
///
/// Both the short form (`grp`, `val`) and the long form (`group`, `value`)
/// occur in the wild, depending on the plugin version that last saved the
/// dashboard.
fn suffix_code(suffix: &str) -> Option<&'static str> {
    match suffix {
        "grp" | "group" => Some("grp"),
        "val" | "value" => Some("val"),
        "op" => Some("op"),
        _ => None,
    }
}

/// Split a `filter<N><suffix>` key into its slot digit and suffix code.
fn parse_filter_key(key: &str) -> Option<(char, &'static str)> {
    let rest = key.strip_prefix("filter")?;
    let mut chars = rest.chars();
    let slot = chars.next().filter(char::is_ascii_digit)?;
    suffix_code(chars.as_str()).map(|code| (slot, code))
}

/// Move all `filter<N><suffix>` keys off the target into
/// `context.host_tags`, mirroring each entry in the selections tree.
///
/// A slot whose keys are all operators carries no actual filter; when every
/// surviving key is an `op` key the whole `host_tags` object is omitted so
/// an unfiltered target stays unfiltered.
pub fn translate_host_tags(target: &mut Target) -> Result<()> {
    let filter_keys: Vec<String> = target
        .extra
        .keys()
        .filter(|key| key.starts_with("filter"))
        .cloned()
        .collect();
    if filter_keys.is_empty() {
        return Ok(());
    }

    // BTreeMap keeps host_tag keys in slot order in the output document.
    let mut tags: BTreeMap<String, String> = BTreeMap::new();
    let mut non_op_seen = false;

    for key in filter_keys {
        let Some((slot, code)) = parse_filter_key(&key) else {
            warn!("Leaving unrecognized filter key {:?} in place", key);
            continue;
        };
        let Some(value) = target.extra.remove(&key) else {
            continue;
        };
        let Some(value) = value.as_str().filter(|v| !v.is_empty()) else {
            continue;
        };
        if code != "op" {
            non_op_seen = true;
        }
        tags.insert(format!("host_tag_{}_{}", slot, code), value.to_string());
    }

    if tags.is_empty() || !non_op_seen {
        return Ok(());
    }

    let context = target.context.get_or_insert_with(Context::default);
    let mut host_tags = Map::new();
    let params = target.params.get_or_insert_with(Default::default);
    for (key, value) in tags {
        host_tags.insert(key.clone(), Value::String(value.clone()));
        record_selection(params, &["context", "host_tags", key.as_str()], &value, None)?;
    }
    context.host_tags = Some(host_tags);
    Ok(())
}
