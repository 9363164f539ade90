//! Nested key-path writes into JSON trees.
//!
//! Migration writes values at dotted paths like `context.host.host` and
//! mirrors every write under `params.selections`. Intermediate objects are
//! created on demand; a non-object in the middle of a path is a contract
//! violation and fails the target.

use crate::document::Params;
use crate::error::{GrafterError, Result};
use serde_json::{json, Map, Value};

/// Set `value` at `path` inside `tree`, creating intermediate objects.
///
/// Errors with [`GrafterError::PathConflict`] when an intermediate key holds
/// a non-object value, naming the offending prefix.
pub fn set_path(tree: &mut Value, path: &[&str], value: Value) -> Result<()> {
    let Some((leaf, parents)) = path.split_last() else {
        return Err(GrafterError::Other("empty key path".into()));
    };

    let mut cursor = tree;
    for (depth, key) in parents.iter().enumerate() {
        cursor = cursor
            .as_object_mut()
            .ok_or_else(|| GrafterError::PathConflict {
                path: path[..depth].join("."),
            })?
            .entry(key.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }

    let Some(object) = cursor.as_object_mut() else {
        return Err(GrafterError::PathConflict {
            path: parents.join("."),
        });
    };
    object.insert(leaf.to_string(), value);
    Ok(())
}

/// A `{value, label, isDisabled}` leaf for the UI-selection mirror.
///
/// The label falls back to the raw value when no display label exists.
pub fn selection_entry(value: &str, label: Option<&str>) -> Value {
    let label = match label {
        Some(label) if !label.is_empty() => label,
        _ => value,
    };
    json!({
        "value": value,
        "label": label,
        "isDisabled": false,
    })
}

/// Mirror a written field under `params.selections` at the same key path.
pub fn record_selection(
    params: &mut Params,
    path: &[&str],
    value: &str,
    label: Option<&str>,
) -> Result<()> {
    let selections = params
        .selections
        .get_or_insert_with(|| Value::Object(Map::new()));
    set_path(selections, path, selection_entry(value, label))
}
