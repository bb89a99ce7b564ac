//! Blueprint handling: schema extraction, default resolution and merging.
//!
//! The blueprint is an annotated YAML template. Mapping keys carrying a
//! trailing `# CIQ: title|description|example` comment form the parameter
//! universe the copilot collects values for.

pub mod defaults;
pub mod fallback;
pub mod merge;
pub mod schema;

pub use defaults::{DefaultValueMap, resolve_defaults};
pub use merge::{deep_merge, flat_to_nested, merge_into_blueprint};
pub use schema::{BlueprintSchema, ParameterSpec};

use std::path::Path;

use crate::error::Result;

/// Reads the blueprint template text from disk.
pub fn read_blueprint_text(path: impl AsRef<Path>) -> Result<String> {
    Ok(std::fs::read_to_string(path)?)
}

/// Loads and parses the blueprint template into a YAML value.
pub fn load_blueprint(path: impl AsRef<Path>) -> Result<serde_yaml::Value> {
    let text = read_blueprint_text(path)?;
    Ok(serde_yaml::from_str(&text)?)
}
