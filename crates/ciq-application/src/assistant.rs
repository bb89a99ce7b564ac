//! Turn-processing state machine and session API surface.

use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use ciq_core::capability::{DocsSearch, LlmInvoke};
use ciq_core::config::CiqConfig;
use ciq_core::error::{CiqError, Result};
use ciq_core::intent::{Intent, IntentClassifier, ParamResolver};
use ciq_core::prompt;
use ciq_core::session::{MessageRole, Session, SessionProgress, SessionStore};

use crate::context::BlueprintContext;
use crate::merge_service::MergeService;

const OFF_TOPIC_SYSTEM_PROMPT: &str =
    "Respond warmly to off-topic chat, then gently steer back to the configuration.";
const OFF_TOPIC_MAX_TOKENS: u32 = 120;

/// Result of processing one chat turn.
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    pub response: String,
    pub session_id: String,
    pub progress: SessionProgress,
    pub is_complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_yaml: Option<String>,
}

/// The conversational configuration assistant.
///
/// Owns the session registry and coordinates schema, classification,
/// documentation search and YAML generation per turn. All collaborators
/// are injected; nothing here touches the network directly.
pub struct CiqAssistant {
    store: SessionStore,
    context: Arc<BlueprintContext>,
    classifier: Arc<dyn IntentClassifier>,
    resolver: Arc<dyn ParamResolver>,
    llm: Arc<dyn LlmInvoke>,
    docs: Arc<dyn DocsSearch>,
    merge: MergeService,
}

impl CiqAssistant {
    pub fn new(
        config: &CiqConfig,
        context: Arc<BlueprintContext>,
        classifier: Arc<dyn IntentClassifier>,
        resolver: Arc<dyn ParamResolver>,
        llm: Arc<dyn LlmInvoke>,
        docs: Arc<dyn DocsSearch>,
    ) -> Self {
        Self {
            store: SessionStore::new(&config.session),
            context,
            classifier,
            resolver,
            merge: MergeService::new(llm.clone()),
            llm,
            docs,
        }
    }

    /// Builds a fresh session seeded with the welcome message and the
    /// first question.
    fn new_session(&self, id: String) -> Session {
        let mut session = Session::new(id, self.context.universe());
        session.add_message(MessageRole::Assistant, prompt::WELCOME);
        if let Some(first) = session.current_param.clone() {
            session.add_message(
                MessageRole::Assistant,
                prompt::question_for(&self.context.schema, &first),
            );
        }
        session
    }

    /// Resumes the session when the id is known and fresh, otherwise
    /// transparently creates a new one.
    pub async fn create_or_resume(&self, session_id: Option<&str>) -> Session {
        self.store
            .get_or_create(session_id, |id| self.new_session(id))
            .await
    }

    /// Processes one chat turn: appends the user message, routes it
    /// through the intent transition table, appends the assistant reply
    /// and writes the session back.
    ///
    /// Never fails: upstream errors degrade to canned responses and the
    /// session state stays consistent.
    pub async fn process_turn(&self, session_id: Option<&str>, user_input: &str) -> TurnOutcome {
        let mut session = self.create_or_resume(session_id).await;

        session.add_message(MessageRole::User, user_input);
        let response = self.generate_response(user_input, &mut session).await;
        session.add_message(MessageRole::Assistant, &response);

        self.store.update(session.clone()).await;

        TurnOutcome {
            response,
            session_id: session.id.clone(),
            progress: session.progress(),
            is_complete: session.is_complete,
            final_yaml: session.final_yaml,
        }
    }

    /// Progress for an existing session.
    pub async fn progress(&self, session_id: &str) -> Result<SessionProgress> {
        let session = self
            .store
            .get(session_id)
            .await
            .ok_or_else(|| CiqError::not_found("Session", session_id))?;
        Ok(session.progress())
    }

    /// Returns the final YAML, generating it on first request.
    ///
    /// Generation without intervening parameter changes is idempotent:
    /// the cached document is returned byte-identical.
    pub async fn generate_yaml(&self, session_id: &str) -> Result<String> {
        let mut session = self
            .store
            .get(session_id)
            .await
            .ok_or_else(|| CiqError::not_found("Session", session_id))?;

        if !session.is_complete {
            return Err(CiqError::IncompleteSession(session_id.to_string()));
        }

        if let Some(yaml) = &session.final_yaml {
            return Ok(yaml.clone());
        }

        let yaml = self
            .merge
            .merge(&self.context, &session.collected_values)
            .await;
        session.final_yaml = Some(yaml.clone());
        self.store.update(session).await;
        Ok(yaml)
    }

    /// Deletes a session, returning whether it existed.
    pub async fn delete_session(&self, session_id: &str) -> bool {
        self.store.delete(session_id).await
    }

    /// Number of live sessions in the registry.
    pub async fn session_count(&self) -> usize {
        self.store.count().await
    }

    /// Flattened schema property map for the boundary layer.
    pub fn schema_properties(&self) -> std::collections::BTreeMap<String, serde_json::Value> {
        self.context.schema.schema_properties()
    }

    // ========================================================================
    // Turn routing
    // ========================================================================

    async fn generate_response(&self, user_input: &str, session: &mut Session) -> String {
        if session.is_complete {
            return self.handle_completed(user_input, session).await;
        }

        let Some(current) = session.current_param.clone() else {
            // collecting but nothing prompted: only reachable on an
            // empty parameter universe
            return "All parameters have been collected! Generating final YAML...".to_string();
        };

        let collected: Vec<String> = {
            let mut keys: Vec<String> = session.collected_values.keys().cloned().collect();
            keys.sort();
            keys
        };

        let intent = self
            .classifier
            .classify(user_input, &current, &collected)
            .await;
        info!(session_id = %session.id, ?intent, param = %current, "processing turn");

        let response = match intent {
            Intent::ParamAnswer => self.handle_answer(session, &current, user_input.to_string()),
            Intent::UseDefault => {
                let value = self
                    .context
                    .defaults
                    .get(&current)
                    .cloned()
                    .unwrap_or_else(|| "N/A".to_string());
                let mut response = format!("Using default: **{value}**\n\n");
                response.push_str(&self.handle_answer(session, &current, value.clone()));
                response
            }
            Intent::SkipForNow => self.handle_skip(session),
            Intent::ChangeParam => self.handle_change(user_input, session, &collected).await,
            Intent::TechQuery => self.handle_tech_query(user_input, session, &current).await,
            Intent::GeneralSilly => self.handle_off_topic(user_input, session, &current).await,
        };

        // completing the collection triggers generation right away; a
        // re-completion after a parameter change refreshes the document
        if session.is_complete {
            let yaml = self
                .merge
                .merge(&self.context, &session.collected_values)
                .await;
            session.final_yaml = Some(yaml);
        }

        response
    }

    /// Records a value for `param` and moves to the next prompt, or
    /// marks the run complete.
    fn handle_answer(&self, session: &mut Session, param: &str, value: String) -> String {
        session.collect_parameter(param, value);

        if let Some(next) = session.current_param.clone() {
            format!(
                "Great, I've noted that down.\n\n{}",
                prompt::question_for(&self.context.schema, &next)
            )
        } else {
            "All parameters collected! Generating your deployment YAML...".to_string()
        }
    }

    fn handle_skip(&self, session: &mut Session) -> String {
        if !session.advance_current_param() {
            return prompt::LAST_PARAMETER.to_string();
        }
        let next = session
            .current_param
            .clone()
            .unwrap_or_default();
        format!(
            "No problem, we can come back to that later.\n\n{}",
            prompt::question_for(&self.context.schema, &next)
        )
    }

    async fn handle_change(
        &self,
        user_input: &str,
        session: &mut Session,
        collected: &[String],
    ) -> String {
        let Some(resolved) = self.resolver.resolve(user_input, collected).await else {
            return prompt::UNRESOLVED_CHANGE.to_string();
        };

        let old_value = session
            .collected_values
            .get(&resolved)
            .cloned()
            .unwrap_or_else(|| "N/A".to_string());
        session.reopen_parameter(&resolved);

        format!(
            "Let's update **{}** (was: `{old_value}`).\n\n{}",
            prompt::display_name(&resolved),
            prompt::question_for(&self.context.schema, &resolved)
        )
    }

    async fn handle_tech_query(
        &self,
        user_input: &str,
        session: &Session,
        current: &str,
    ) -> String {
        let description = self
            .context
            .schema
            .get(current)
            .map(|spec| spec.description.clone())
            .unwrap_or_default();
        let query = prompt::contextual_docs_query(user_input, current, &description);
        let question = prompt::question_for(&self.context.schema, current);

        match self.docs.search(&query).await {
            Ok(answer) => format!(
                "Here's what I found:\n\n{answer}\n\nNow, back to the configuration.\n\n{question}"
            ),
            Err(err) => {
                warn!(session_id = %session.id, error = %err, "documentation search failed");
                format!(
                    "I couldn't retrieve information right now. Let's continue with the \
                     configuration.\n\n{question}"
                )
            }
        }
    }

    async fn handle_off_topic(
        &self,
        user_input: &str,
        session: &Session,
        current: &str,
    ) -> String {
        let question = prompt::question_for(&self.context.schema, current);
        match self
            .llm
            .invoke(OFF_TOPIC_SYSTEM_PROMPT, user_input, OFF_TOPIC_MAX_TOKENS)
            .await
        {
            Ok(reply) => format!("{reply}\n\n{question}"),
            Err(err) => {
                warn!(session_id = %session.id, error = %err, "off-topic responder failed");
                format!("{}\n\n{question}", prompt::OFF_TOPIC_REDIRECT)
            }
        }
    }

    /// Messages arriving after completion: regeneration, late edits, or
    /// a fixed acknowledgement.
    async fn handle_completed(&self, user_input: &str, session: &mut Session) -> String {
        let lower = user_input.to_lowercase();
        if lower.contains("regenerate") || lower.contains("generate again") {
            let yaml = self
                .merge
                .merge(&self.context, &session.collected_values)
                .await;
            session.final_yaml = Some(yaml);
            return "I've regenerated the YAML configuration for you!".to_string();
        }

        // a collected parameter can still be edited after completion
        let collected: Vec<String> = {
            let mut keys: Vec<String> = session.collected_values.keys().cloned().collect();
            keys.sort();
            keys
        };
        let intent = self.classifier.classify(user_input, "", &collected).await;
        if intent == Intent::ChangeParam {
            return self.handle_change(user_input, session, &collected).await;
        }

        prompt::ALREADY_COMPLETE.to_string()
    }
}
