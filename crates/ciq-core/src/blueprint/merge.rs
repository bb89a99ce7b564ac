//! Structural merge of collected values into the blueprint.

use serde_yaml::{Mapping, Value};
use std::collections::HashMap;

use crate::error::{CiqError, Result};

/// Converts a flat dotted-path map into a nested YAML mapping.
///
/// Two flat keys colliding on conflicting types at a shared prefix
/// (e.g. `a.b` and `a.b.c`) are rejected rather than silently resolved.
/// Keys are processed in sorted order so the output is deterministic.
pub fn flat_to_nested(values: &HashMap<String, String>) -> Result<Value> {
    let mut root = Mapping::new();

    let mut keys: Vec<&String> = values.keys().collect();
    keys.sort();

    for key in keys {
        let value = &values[key];
        let segments: Vec<&str> = key.split('.').collect();
        let mut current = &mut root;

        for segment in &segments[..segments.len() - 1] {
            let entry = current
                .entry(Value::String((*segment).to_string()))
                .or_insert_with(|| Value::Mapping(Mapping::new()));
            current = match entry {
                Value::Mapping(map) => map,
                _ => {
                    return Err(CiqError::merge(format!(
                        "path '{key}' conflicts with a scalar at segment '{segment}'"
                    )));
                }
            };
        }

        let last = Value::String(segments[segments.len() - 1].to_string());
        if matches!(current.get(&last), Some(Value::Mapping(_))) {
            return Err(CiqError::merge(format!(
                "path '{key}' would overwrite a nested mapping"
            )));
        }
        current.insert(last, Value::String(value.clone()));
    }

    Ok(Value::Mapping(root))
}

/// Deep-merges `update` into `base`.
///
/// Where both sides hold a mapping the merge recurses; otherwise the
/// update value replaces the base value, last writer wins, with no
/// type-compatibility check.
pub fn deep_merge(base: &mut Value, update: Value) {
    match (base, update) {
        (Value::Mapping(base_map), Value::Mapping(update_map)) => {
            for (key, value) in update_map {
                match base_map.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base_slot, update) => *base_slot = update,
    }
}

/// Merges flat collected values into the blueprint and serializes the
/// result back to YAML (block style, base key order preserved).
pub fn merge_into_blueprint(
    blueprint: &Value,
    values: &HashMap<String, String>,
) -> Result<String> {
    let nested = flat_to_nested(values)?;
    let mut merged = blueprint.clone();
    deep_merge(&mut merged, nested);
    Ok(serde_yaml::to_string(&merged)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_flat_to_nested_builds_intermediates() {
        let nested = flat_to_nested(&flat(&[("a.b.c", "1"), ("a.d", "2")])).unwrap();
        let expected: Value =
            serde_yaml::from_str("a:\n  b:\n    c: '1'\n  d: '2'\n").unwrap();
        assert_eq!(nested, expected);
    }

    #[test]
    fn test_flat_to_nested_rejects_prefix_conflict() {
        assert!(flat_to_nested(&flat(&[("a.b", "x"), ("a.b.c", "y")])).is_err());
    }

    #[test]
    fn test_deep_merge_keeps_untouched_siblings() {
        let mut base: Value = serde_yaml::from_str("a:\n  b: 1\n  c: 2\n").unwrap();
        let update: Value = serde_yaml::from_str("a:\n  b: 9\n").unwrap();
        deep_merge(&mut base, update);
        let expected: Value = serde_yaml::from_str("a:\n  b: 9\n  c: 2\n").unwrap();
        assert_eq!(base, expected);
    }

    #[test]
    fn test_deep_merge_scalar_over_mapping() {
        let mut base: Value = serde_yaml::from_str("a:\n  b:\n    c: 1\n").unwrap();
        let update: Value = serde_yaml::from_str("a:\n  b: flat\n").unwrap();
        deep_merge(&mut base, update);
        let expected: Value = serde_yaml::from_str("a:\n  b: flat\n").unwrap();
        assert_eq!(base, expected);
    }

    #[test]
    fn test_merge_preserves_base_key_order() {
        let blueprint: Value =
            serde_yaml::from_str("zeta: 1\nalpha:\n  keep: x\n  swap: y\n").unwrap();
        let yaml =
            merge_into_blueprint(&blueprint, &flat(&[("alpha.swap", "z")])).unwrap();
        // zeta stays first, no alphabetical re-sorting
        assert!(yaml.starts_with("zeta:"));
        assert!(yaml.contains("swap: z"));
        assert!(yaml.contains("keep: x"));
    }

    #[test]
    fn test_merge_is_deterministic() {
        let blueprint: Value = serde_yaml::from_str("a:\n  b: 1\n").unwrap();
        let values = flat(&[("a.b", "9"), ("a.new", "v"), ("other", "w")]);
        let first = merge_into_blueprint(&blueprint, &values).unwrap();
        let second = merge_into_blueprint(&blueprint, &values).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_roundtrip_with_default_lookup() {
        use crate::blueprint::defaults::lookup_path;

        let blueprint: Value = serde_yaml::from_str("a:\n  b: old\n").unwrap();
        let values = flat(&[("a.b", "new"), ("a.c.d", "fresh")]);
        let yaml = merge_into_blueprint(&blueprint, &values).unwrap();
        let reparsed: Value = serde_yaml::from_str(&yaml).unwrap();
        for (path, value) in &values {
            assert_eq!(lookup_path(&reparsed, path), *value);
        }
    }
}
