//! Model-backed intent classification and parameter resolution.
//!
//! Both delegate to the [`LlmInvoke`] capability with constrained
//! prompts, and both degrade to deterministic defaults when the upstream
//! call fails: classification falls back to the off-topic intent,
//! resolution to "not found". Tests target the rule-based variants in
//! `ciq-core`; these are the production implementations.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

use ciq_core::capability::LlmInvoke;
use ciq_core::intent::{Intent, IntentClassifier, ParamResolver};

const CLASSIFY_SYSTEM_PROMPT: &str = "You are a supervisor AI that classifies user \
input for a deployment configuration chatbot. Classify the input into one of these \
categories: 'param_answer', 'use_default', 'skip_for_now', 'change_param', \
'tech_query', 'general_silly'. Return ONLY the category name.";

const RESOLVE_SYSTEM_PROMPT: &str = "You are a precise parameter resolver. Given a \
user's request like \"change dnn1\", match it to EXACTLY ONE full parameter path \
from the list below. Return ONLY the full path or \"unknown\".";

const CLASSIFY_MAX_TOKENS: u32 = 20;
const RESOLVE_MAX_TOKENS: u32 = 80;

/// Intent classifier delegating to the LLM capability.
pub struct LlmClassifier {
    llm: Arc<dyn LlmInvoke>,
}

impl LlmClassifier {
    pub fn new(llm: Arc<dyn LlmInvoke>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl IntentClassifier for LlmClassifier {
    async fn classify(
        &self,
        user_input: &str,
        current_param: &str,
        collected_params: &[String],
    ) -> Intent {
        let answered = collected_params.join(", ");
        let user_msg = format!(
            "The user is currently being asked for the value of the parameter: \
             '{current_param}'.\nAlready answered: [{answered}]\nUser input: \"{user_input}\""
        );

        match self
            .llm
            .invoke(CLASSIFY_SYSTEM_PROMPT, &user_msg, CLASSIFY_MAX_TOKENS)
            .await
        {
            Ok(label) => Intent::from_label(&label),
            Err(err) => {
                warn!(error = %err, "intent classification failed, defaulting to off-topic");
                Intent::GeneralSilly
            }
        }
    }
}

/// Parameter-reference resolver delegating to the LLM capability.
///
/// The model must echo back a member of the known path set; anything
/// else (including its "unknown" sentinel) resolves to `None`.
pub struct LlmParamResolver {
    llm: Arc<dyn LlmInvoke>,
}

impl LlmParamResolver {
    pub fn new(llm: Arc<dyn LlmInvoke>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl ParamResolver for LlmParamResolver {
    async fn resolve(&self, user_input: &str, known_params: &[String]) -> Option<String> {
        if known_params.is_empty() {
            return None;
        }

        let listing: String = known_params
            .iter()
            .map(|p| format!("- {p}\n"))
            .collect();
        let user_msg = format!("User said: \"{user_input}\"\nAvailable parameters:\n{listing}");

        match self
            .llm
            .invoke(RESOLVE_SYSTEM_PROMPT, &user_msg, RESOLVE_MAX_TOKENS)
            .await
        {
            Ok(reply) => {
                let candidate = reply.trim();
                known_params.iter().find(|p| *p == candidate).cloned()
            }
            Err(err) => {
                warn!(error = %err, "parameter resolution failed");
                None
            }
        }
    }
}
