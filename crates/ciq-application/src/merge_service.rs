//! Final YAML generation: structural merge with model-assisted fallback.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::warn;

use ciq_core::blueprint::merge_into_blueprint;
use ciq_core::capability::LlmInvoke;

use crate::context::BlueprintContext;

const MERGE_SYSTEM_PROMPT: &str = "You are a YAML configuration expert. Merge the \
user-provided values into the blueprint YAML. The final output must be the complete, \
valid YAML, preserving the original structure and formatting of the blueprint. \
Return ONLY the final, merged YAML content inside a YAML code block.";

const MERGE_MAX_TOKENS: u32 = 4096;

static YAML_FENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```yaml\n(.*?)\n```").expect("fence regex is valid"));

/// Produces the merged deployment YAML for a session's collected values.
pub struct MergeService {
    llm: Arc<dyn LlmInvoke>,
}

impl MergeService {
    pub fn new(llm: Arc<dyn LlmInvoke>) -> Self {
        Self { llm }
    }

    /// Merges the collected values into the blueprint.
    ///
    /// The deterministic structural merge runs first; if it fails the
    /// model-assisted merge takes over. Never fails outright: when both
    /// paths degrade the returned string carries the error description
    /// instead of YAML.
    pub async fn merge(
        &self,
        context: &BlueprintContext,
        values: &HashMap<String, String>,
    ) -> String {
        let Some(blueprint) = &context.blueprint else {
            return "Error: Could not load YAML blueprint.".to_string();
        };

        match merge_into_blueprint(blueprint, values) {
            Ok(yaml) => yaml,
            Err(err) => {
                warn!(error = %err, "structural merge failed, using model-assisted merge");
                self.merge_with_model(context, values).await
            }
        }
    }

    async fn merge_with_model(
        &self,
        context: &BlueprintContext,
        values: &HashMap<String, String>,
    ) -> String {
        let blueprint_yaml = context.blueprint_yaml().unwrap_or_default();
        // sorted map keeps the prompt (and thus the output) reproducible
        let ordered: BTreeMap<&String, &String> = values.iter().collect();
        let values_yaml = serde_yaml::to_string(&ordered).unwrap_or_default();

        let user_msg = format!(
            "**Blueprint YAML:**\n```yaml\n{blueprint_yaml}\n```\n\
             **User Values to Merge:**\n```yaml\n{values_yaml}\n```"
        );

        match self
            .llm
            .invoke(MERGE_SYSTEM_PROMPT, &user_msg, MERGE_MAX_TOKENS)
            .await
        {
            Ok(response) => extract_yaml_block(&response),
            Err(err) => format!("Error generating YAML: {err}"),
        }
    }
}

/// Pulls the fenced YAML block out of a model reply, falling back to the
/// raw reply when no fence is present (accepted degraded outcome).
fn extract_yaml_block(response: &str) -> String {
    YAML_FENCE_RE
        .captures(response)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| response.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ciq_core::error::{CiqError, Result};

    struct ScriptedLlm(&'static str);

    #[async_trait]
    impl LlmInvoke for ScriptedLlm {
        async fn invoke(&self, _s: &str, _u: &str, _m: u32) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct FailingLlm;

    #[async_trait]
    impl LlmInvoke for FailingLlm {
        async fn invoke(&self, _s: &str, _u: &str, _m: u32) -> Result<String> {
            Err(CiqError::upstream("model offline"))
        }
    }

    fn values(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_extract_yaml_block() {
        let fenced = "intro\n```yaml\na: 1\n```\noutro";
        assert_eq!(extract_yaml_block(fenced), "a: 1");
        assert_eq!(extract_yaml_block("no fence at all"), "no fence at all");
    }

    #[tokio::test]
    async fn test_structural_merge_wins() {
        let context = BlueprintContext::from_source("a:\n  b: old # CIQ: B\n");
        let service = MergeService::new(Arc::new(FailingLlm));
        let yaml = service.merge(&context, &values(&[("a.b", "new")])).await;
        assert!(yaml.contains("b: new"));
    }

    #[tokio::test]
    async fn test_missing_blueprint_reports_error_string() {
        let context = BlueprintContext::load("/not/a/real/path.yaml");
        let service = MergeService::new(Arc::new(FailingLlm));
        let yaml = service.merge(&context, &values(&[("a.b", "x")])).await;
        assert!(yaml.starts_with("Error:"));
    }

    #[tokio::test]
    async fn test_model_fallback_on_structural_conflict() {
        let context = BlueprintContext::from_source("a:\n  b: old # CIQ: B\n");
        // a.b and a.b.c collide, forcing the fallback
        let conflicting = values(&[("a.b", "x"), ("a.b.c", "y")]);
        let service = MergeService::new(Arc::new(ScriptedLlm("```yaml\nmerged: true\n```")));
        let yaml = service.merge(&context, &conflicting).await;
        assert_eq!(yaml, "merged: true");
    }

    #[tokio::test]
    async fn test_both_paths_failing_embeds_error() {
        let context = BlueprintContext::from_source("a:\n  b: old # CIQ: B\n");
        let conflicting = values(&[("a.b", "x"), ("a.b.c", "y")]);
        let service = MergeService::new(Arc::new(FailingLlm));
        let yaml = service.merge(&context, &conflicting).await;
        assert!(yaml.starts_with("Error generating YAML:"));
    }
}
