//! Plugin name resolution
//!
//! The peer numbers plugins by their position in the alphabetically sorted
//! list of enabled plugins of one kind, not by their position in the plugin
//! record. Resolution rebuilds that list from the record's parallel `name`,
//! `type` and `enabled` arrays.

use crate::types::FeatureKind;
use serde_json::Value;
use state::KeyedRecord;

pub const NAME_FIELD: &str = "name";
pub const TYPE_FIELD: &str = "type";
pub const ENABLED_FIELD: &str = "enabled";

/// Sorted names of the enabled plugins of `kind`
pub fn enabled_features(plugins: &KeyedRecord, kind: FeatureKind) -> Vec<String> {
    let (Some(names), Some(types), Some(enabled)) = (
        plugins.get(NAME_FIELD).and_then(Value::as_array),
        plugins.get(TYPE_FIELD).and_then(Value::as_array),
        plugins.get(ENABLED_FIELD).and_then(Value::as_array),
    ) else {
        return Vec::new();
    };

    let mut matching: Vec<String> = names
        .iter()
        .zip(types)
        .zip(enabled)
        .filter(|((_, ty), on)| ty.as_str() == Some(kind.as_str()) && is_enabled(on))
        .filter_map(|((name, _), _)| name.as_str().map(str::to_owned))
        .collect();
    matching.sort();
    matching
}

/// Wire index of plugin `name` among the enabled plugins of `kind`
pub fn resolve_feature(plugins: &KeyedRecord, kind: FeatureKind, name: &str) -> Option<i32> {
    enabled_features(plugins, kind)
        .iter()
        .position(|candidate| candidate == name)
        .and_then(|index| i32::try_from(index).ok())
}

fn is_enabled(flag: &Value) -> bool {
    match flag {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_i64().map_or(false, |v| v != 0),
        _ => false,
    }
}
