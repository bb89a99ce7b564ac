//! Blueprint context built once at startup and shared read-only.

use serde_yaml::Value;
use std::path::Path;
use tracing::warn;

use ciq_core::blueprint::{BlueprintSchema, DefaultValueMap, resolve_defaults};

/// The parameter universe and everything derived from the blueprint
/// template: schema, defaults and the parsed document used for merging.
///
/// Immutable after load; handlers share it behind an `Arc` without
/// locking.
#[derive(Debug, Clone)]
pub struct BlueprintContext {
    pub schema: BlueprintSchema,
    pub defaults: DefaultValueMap,
    /// Parsed blueprint document, `None` when the template was
    /// unreadable (collection still works off the fallback schema, the
    /// merge step reports the problem).
    pub blueprint: Option<Value>,
}

impl BlueprintContext {
    /// Loads the context from the blueprint file, degrading rather than
    /// failing: an unreadable template yields the fallback schema and no
    /// merge document.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let schema = BlueprintSchema::from_file(path.as_ref());
        let blueprint = match std::fs::read_to_string(path.as_ref()) {
            Ok(text) => match serde_yaml::from_str::<Value>(&text) {
                Ok(value) => Some(value),
                Err(err) => {
                    warn!(error = %err, "blueprint is not valid YAML, merge will degrade");
                    None
                }
            },
            Err(_) => None,
        };
        Self::assemble(schema, blueprint)
    }

    /// Builds the context from in-memory blueprint source.
    pub fn from_source(source: &str) -> Self {
        let schema = BlueprintSchema::parse(source);
        let blueprint = serde_yaml::from_str::<Value>(source).ok();
        Self::assemble(schema, blueprint)
    }

    fn assemble(schema: BlueprintSchema, blueprint: Option<Value>) -> Self {
        let defaults = match &blueprint {
            Some(value) => resolve_defaults(value, schema.paths()),
            None => schema
                .paths()
                .map(|p| (p.to_string(), String::new()))
                .collect(),
        };
        Self {
            schema,
            defaults,
            blueprint,
        }
    }

    /// Parameter paths in the deterministic prompting order.
    pub fn universe(&self) -> Vec<String> {
        self.schema.sorted_paths()
    }

    /// Serialized blueprint text used by the model-assisted merge
    /// fallback.
    pub fn blueprint_yaml(&self) -> Option<String> {
        self.blueprint
            .as_ref()
            .and_then(|value| serde_yaml::to_string(value).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SOURCE: &str = "\
a:
  b: one # CIQ: B|first
  c: two # CIQ: C|second
d: three # CIQ: D
";

    #[test]
    fn test_from_source_builds_schema_and_defaults() {
        let context = BlueprintContext::from_source(SOURCE);
        assert_eq!(context.universe(), vec!["a.b", "a.c", "d"]);
        assert_eq!(context.defaults["a.b"], "one");
        assert_eq!(context.defaults["d"], "three");
        assert!(context.blueprint.is_some());
    }

    #[test]
    fn test_load_degrades_on_missing_file() {
        let context = BlueprintContext::load("/definitely/not/here.yaml");
        assert!(!context.schema.is_empty());
        assert!(context.blueprint.is_none());
        // defaults exist for every parameter, all empty
        assert!(context.defaults.values().all(String::is_empty));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SOURCE.as_bytes()).unwrap();
        let context = BlueprintContext::load(file.path());
        assert_eq!(context.universe().len(), 3);
        assert!(context.blueprint_yaml().unwrap().contains("b: one"));
    }
}
