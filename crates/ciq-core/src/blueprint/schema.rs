//! Schema extraction from `# CIQ:` annotated blueprint templates.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::warn;

use crate::error::Result;

use super::fallback::fallback_parameters;

static KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\s*)([\w.]+):").expect("key regex is valid"));
static CIQ_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#\s*CIQ:\s*(.*)$").expect("CIQ regex is valid"));

/// Metadata attached to a single collectable parameter.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ParameterSpec {
    /// Short human label.
    pub title: String,
    /// Explanatory text shown when prompting.
    pub description: String,
    /// Sample value, may be empty.
    pub example: String,
}

impl ParameterSpec {
    /// Parses the pipe-delimited annotation body: `title|description|example`.
    /// Every field after the first is optional.
    fn from_annotation(body: &str) -> Self {
        let mut parts = body.trim().splitn(3, '|');
        Self {
            title: parts.next().unwrap_or_default().trim().to_string(),
            description: parts.next().unwrap_or_default().trim().to_string(),
            example: parts.next().unwrap_or_default().trim().to_string(),
        }
    }
}

/// The parameter universe extracted from a blueprint template.
///
/// Entries preserve file order; [`BlueprintSchema::sorted_paths`] yields
/// the deterministic lexicographic prompting order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlueprintSchema {
    entries: Vec<(String, ParameterSpec)>,
}

impl BlueprintSchema {
    /// Builds a schema from pre-assembled entries (used by the static fallback).
    pub fn from_entries(entries: Vec<(String, ParameterSpec)>) -> Self {
        Self { entries }
    }

    /// Extracts CIQ-annotated parameters from blueprint source text.
    ///
    /// Nesting is tracked with an indentation stack (2 spaces = 1 level):
    /// a mapping key at level L truncates the stack to L and is pushed;
    /// its dotted path is the stack joined with `.`. Blank lines and
    /// full-line comments leave the stack untouched.
    pub fn parse(source: &str) -> Self {
        let mut entries: Vec<(String, ParameterSpec)> = Vec::new();
        let mut path_stack: Vec<String> = Vec::new();

        for line in source.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let Some(key_caps) = KEY_RE.captures(line) else {
                continue;
            };
            let level = key_caps[1].len() / 2;
            let key = key_caps[2].to_string();
            path_stack.truncate(level);
            path_stack.push(key);

            if let Some(ciq_caps) = CIQ_RE.captures(line) {
                let path = path_stack.join(".");
                entries.push((path, ParameterSpec::from_annotation(&ciq_caps[1])));
            }
        }

        Self { entries }
    }

    /// Loads the schema from a blueprint file, degrading to the built-in
    /// fallback parameter table when the file cannot be read.
    pub fn from_file(path: impl AsRef<Path>) -> Self {
        match std::fs::read_to_string(path.as_ref()) {
            Ok(text) => {
                let schema = Self::parse(&text);
                if schema.is_empty() {
                    warn!(
                        path = %path.as_ref().display(),
                        "blueprint carries no CIQ annotations, using fallback schema"
                    );
                    return Self::from_entries(fallback_parameters());
                }
                schema
            }
            Err(err) => {
                warn!(
                    path = %path.as_ref().display(),
                    error = %err,
                    "could not read blueprint, using fallback schema"
                );
                Self::from_entries(fallback_parameters())
            }
        }
    }

    /// Strict variant of [`BlueprintSchema::from_file`] that surfaces the
    /// read error instead of degrading.
    pub fn try_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::parse(&text))
    }

    /// Looks up the metadata for a dotted path.
    pub fn get(&self, path: &str) -> Option<&ParameterSpec> {
        self.entries.iter().find(|(p, _)| p == path).map(|(_, s)| s)
    }

    /// Returns true when the path belongs to the parameter universe.
    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Parameter paths in file order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(p, _)| p.as_str())
    }

    /// Parameter paths sorted lexicographically (the prompting order).
    pub fn sorted_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.entries.iter().map(|(p, _)| p.clone()).collect();
        paths.sort();
        paths
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Flattened property map for downstream payload generation.
    ///
    /// Dotted paths become underscore field names with the `global.`
    /// prefix stripped, mirroring what the API layer expects.
    pub fn schema_properties(&self) -> BTreeMap<String, serde_json::Value> {
        self.entries
            .iter()
            .map(|(path, spec)| {
                let field_name = path
                    .strip_prefix("global.")
                    .unwrap_or(path)
                    .replace('.', "_");
                let display = if spec.title.is_empty() {
                    spec.description.clone()
                } else {
                    spec.title.clone()
                };
                (
                    field_name,
                    serde_json::json!({
                        "type": "string",
                        "x-displayName": display,
                        "x-order": 1,
                        "original_param": path,
                    }),
                )
            })
            .collect()
    }
}
