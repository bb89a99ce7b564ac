//! Default value resolution against the parsed blueprint.

use serde_yaml::Value;
use std::collections::HashMap;

/// Mapping from parameter path to the stringified value already present
/// in the blueprint, or empty string when absent.
pub type DefaultValueMap = HashMap<String, String>;

/// Resolves one dotted path by walking nested mapping lookups.
///
/// Any absent segment or non-mapping container resolves to the empty
/// string, as does an explicit null leaf.
pub fn lookup_path(blueprint: &Value, path: &str) -> String {
    let mut current = blueprint;
    for segment in path.split('.') {
        match current {
            Value::Mapping(map) => match map.get(segment) {
                Some(next) => current = next,
                None => return String::new(),
            },
            _ => return String::new(),
        }
    }
    stringify(current)
}

/// Resolves every given path against the blueprint. Pure function, safe
/// to call repeatedly.
pub fn resolve_defaults<'a, I>(blueprint: &Value, paths: I) -> DefaultValueMap
where
    I: IntoIterator<Item = &'a str>,
{
    paths
        .into_iter()
        .map(|path| (path.to_string(), lookup_path(blueprint, path)))
        .collect()
}

fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        // Collections rarely back a collectable parameter; render them
        // as single-line YAML so the default is still displayable.
        other => serde_yaml::to_string(other)
            .unwrap_or_default()
            .trim_end()
            .to_string(),
    }
}
