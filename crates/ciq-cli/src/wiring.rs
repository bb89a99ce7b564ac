//! Configuration loading and collaborator assembly.

use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use ciq_application::{BlueprintContext, CiqAssistant};
use ciq_core::capability::LlmInvoke;
use ciq_core::config::CiqConfig;
use ciq_core::intent::{RuleBasedClassifier, RuleBasedResolver};
use ciq_interaction::{ClaudeApiAgent, DocsSearchClient, DocsSearchConfig, LlmClassifier, LlmParamResolver};

/// Stand-in language model used when no API key is configured. Every
/// invocation fails, which the assistant absorbs through its degraded
/// responses.
struct OfflineLlm;

#[async_trait]
impl LlmInvoke for OfflineLlm {
    async fn invoke(
        &self,
        _system_prompt: &str,
        _user_message: &str,
        _max_tokens: u32,
    ) -> ciq_core::Result<String> {
        Err(ciq_core::CiqError::upstream(
            "no language model configured (set ANTHROPIC_API_KEY)",
        ))
    }
}

/// Claude agent when configured, otherwise the failing stand-in.
pub fn offline_or_env_llm() -> Arc<dyn LlmInvoke> {
    match ClaudeApiAgent::try_from_env() {
        Ok(agent) => Arc::new(agent),
        Err(_) => Arc::new(OfflineLlm),
    }
}

pub fn load_config(config_path: Option<&Path>, blueprint: Option<&Path>) -> Result<CiqConfig> {
    let mut config = match config_path {
        Some(path) => CiqConfig::load(path)?,
        None => CiqConfig::default(),
    };
    if let Some(path) = blueprint {
        config.blueprint_path = path.display().to_string();
    }
    Ok(config)
}

/// Builds the assistant with model-backed collaborators when an API key
/// is available, falling back to the rule-based ones otherwise.
pub fn build_assistant(config: &CiqConfig) -> CiqAssistant {
    let context = Arc::new(BlueprintContext::load(&config.blueprint_path));
    let docs = Arc::new(DocsSearchClient::new(DocsSearchConfig::default()));

    match ClaudeApiAgent::try_from_env() {
        Ok(agent) => {
            let llm: Arc<dyn LlmInvoke> = Arc::new(agent);
            CiqAssistant::new(
                config,
                context,
                Arc::new(LlmClassifier::new(llm.clone())),
                Arc::new(LlmParamResolver::new(llm.clone())),
                llm,
                docs,
            )
        }
        Err(err) => {
            info!(error = %err, "running with rule-based intent handling");
            CiqAssistant::new(
                config,
                context,
                Arc::new(RuleBasedClassifier::new()),
                Arc::new(RuleBasedResolver::new()),
                Arc::new(OfflineLlm),
                docs,
            )
        }
    }
}
