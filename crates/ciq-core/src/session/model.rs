//! Session domain model.
//!
//! A [`Session`] tracks one operator's in-progress configuration run:
//! the conversation so far, which parameters are answered, which remain,
//! and the parameter currently being prompted for.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use super::message::{ConversationMessage, MessageRole};

/// Collection progress snapshot exposed at the API surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionProgress {
    pub total_params: usize,
    pub collected_count: usize,
    pub progress_percentage: f64,
    pub missing_params: Vec<String>,
    pub current_param: Option<String>,
    pub is_complete: bool,
}

/// Represents one configuration run in the domain layer.
///
/// Invariants outside a transient change-parameter reopen:
/// - `missing_params` and `collected_values` keys partition the universe,
/// - `current_param` is a member of `missing_params` while collecting,
/// - `is_complete` holds exactly when `missing_params` is empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Unique session identifier (UUID format)
    pub id: String,
    /// Timestamp when the session was created
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last message or parameter mutation
    pub last_activity: DateTime<Utc>,
    /// Append-only conversation history
    pub messages: Vec<ConversationMessage>,
    /// Raw string values supplied or chosen by the operator
    pub collected_values: HashMap<String, String>,
    /// Parameter paths not yet collected; sorted iteration gives the
    /// deterministic prompting order
    pub missing_params: BTreeSet<String>,
    /// The parameter currently being prompted for
    pub current_param: Option<String>,
    /// True exactly when every parameter has been collected
    pub is_complete: bool,
    /// Merged YAML, populated once collection completes
    pub final_yaml: Option<String>,
}

impl Session {
    /// Creates a fresh session over the given parameter universe.
    ///
    /// The first prompted parameter is the lexicographically smallest
    /// path; an empty universe starts complete.
    pub fn new(id: impl Into<String>, universe: impl IntoIterator<Item = String>) -> Self {
        let now = Utc::now();
        let missing_params: BTreeSet<String> = universe.into_iter().collect();
        let current_param = missing_params.iter().next().cloned();
        let is_complete = missing_params.is_empty();
        Self {
            id: id.into(),
            created_at: now,
            last_activity: now,
            messages: Vec::new(),
            collected_values: HashMap::new(),
            missing_params,
            current_param,
            is_complete,
            final_yaml: None,
        }
    }

    /// Appends a message and refreshes the activity timestamp.
    pub fn add_message(&mut self, role: MessageRole, content: impl Into<String>) {
        self.messages.push(ConversationMessage::new(role, content));
        self.touch();
    }

    /// Records a collected value and advances to the lexicographically
    /// smallest remaining parameter, or marks the session complete.
    /// A previously skipped parameter therefore returns with the next
    /// prompt; only an explicit skip moves around the cycle.
    pub fn collect_parameter(&mut self, param: &str, value: impl Into<String>) {
        self.collected_values.insert(param.to_string(), value.into());
        self.missing_params.remove(param);
        self.touch();

        if let Some(next) = self.missing_params.iter().next() {
            self.current_param = Some(next.clone());
        } else {
            self.current_param = None;
            self.is_complete = true;
        }
    }

    /// Re-opens an already-collected parameter for editing.
    ///
    /// The previous value stays in `collected_values` until overwritten
    /// by the next answer; `final_yaml` keeps its stale content until
    /// collection completes again or a regeneration is requested.
    pub fn reopen_parameter(&mut self, param: &str) {
        self.missing_params.insert(param.to_string());
        self.current_param = Some(param.to_string());
        self.is_complete = false;
        self.touch();
    }

    /// Advances `current_param` around the sorted cycle of missing
    /// parameters. Returns false when there is nothing to advance to
    /// (one or zero parameters remain).
    pub fn advance_current_param(&mut self) -> bool {
        if self.missing_params.len() <= 1 {
            return false;
        }
        let ordered: Vec<&String> = self.missing_params.iter().collect();
        let position = self
            .current_param
            .as_ref()
            .and_then(|current| ordered.iter().position(|p| *p == current))
            .unwrap_or(0);
        self.current_param = Some(ordered[(position + 1) % ordered.len()].clone());
        self.touch();
        true
    }

    /// Size of the parameter universe this session runs over.
    pub fn total_params(&self) -> usize {
        // Union rather than a sum: during a reopen the same path sits in
        // both sets.
        let mut universe: BTreeSet<&str> =
            self.missing_params.iter().map(String::as_str).collect();
        universe.extend(self.collected_values.keys().map(String::as_str));
        universe.len()
    }

    /// Current collection progress.
    pub fn progress(&self) -> SessionProgress {
        let total_params = self.total_params();
        let collected_count = total_params.saturating_sub(self.missing_params.len());
        let progress_percentage = if total_params == 0 {
            100.0
        } else {
            (collected_count as f64 / total_params as f64) * 100.0
        };
        SessionProgress {
            total_params,
            collected_count,
            progress_percentage,
            missing_params: self.missing_params.iter().cloned().collect(),
            current_param: self.current_param.clone(),
            is_complete: self.is_complete,
        }
    }

    /// Whether the session has been inactive longer than `ttl`.
    pub fn is_expired(&self, ttl: Duration) -> bool {
        Utc::now() - self.last_activity > ttl
    }

    fn touch(&mut self) {
        self.last_activity = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn universe() -> Vec<String> {
        vec!["x".to_string(), "y".to_string(), "z".to_string()]
    }

    fn assert_partition(session: &Session) {
        for param in &session.missing_params {
            assert!(
                !session.collected_values.contains_key(param)
                    || session.current_param.as_deref() == Some(param),
                "'{param}' in both sets outside a reopen"
            );
        }
        assert_eq!(session.total_params(), 3);
    }

    #[test]
    fn test_new_session_prompts_smallest_path() {
        let session = Session::new("s1", universe());
        assert_eq!(session.current_param.as_deref(), Some("x"));
        assert!(!session.is_complete);
        assert_eq!(session.progress().collected_count, 0);
    }

    #[test]
    fn test_collect_advances_in_sorted_order() {
        let mut session = Session::new("s1", universe());
        session.collect_parameter("x", "foo");
        assert_eq!(session.current_param.as_deref(), Some("y"));
        assert_eq!(session.collected_values["x"], "foo");
        assert_partition(&session);

        session.collect_parameter("y", "bar");
        session.collect_parameter("z", "baz");
        assert!(session.is_complete);
        assert_eq!(session.current_param, None);
        assert_eq!(session.progress().progress_percentage, 100.0);
    }

    #[test]
    fn test_reopen_makes_session_incomplete() {
        let mut session = Session::new("s1", universe());
        for param in ["x", "y", "z"] {
            session.collect_parameter(param, "v");
        }
        assert!(session.is_complete);

        session.reopen_parameter("x");
        assert!(!session.is_complete);
        assert_eq!(session.current_param.as_deref(), Some("x"));
        // old value stays visible until overwritten
        assert_eq!(session.collected_values["x"], "v");
        assert_eq!(session.progress().collected_count, 2);

        session.collect_parameter("x", "v2");
        assert!(session.is_complete);
        assert_eq!(session.collected_values["x"], "v2");
    }

    #[test]
    fn test_advance_wraps_around_cycle() {
        let mut session = Session::new("s1", universe());
        assert!(session.advance_current_param());
        assert_eq!(session.current_param.as_deref(), Some("y"));
        assert!(session.advance_current_param());
        assert_eq!(session.current_param.as_deref(), Some("z"));
        assert!(session.advance_current_param());
        assert_eq!(session.current_param.as_deref(), Some("x"));
    }

    #[test]
    fn test_answer_returns_to_smallest_missing_after_skip() {
        let mut session = Session::new("s1", universe());
        // skip x, then answer y
        assert!(session.advance_current_param());
        session.collect_parameter("y", "v");
        // the skipped parameter comes back with the next prompt
        assert_eq!(session.current_param.as_deref(), Some("x"));
        assert!(!session.is_complete);

        session.collect_parameter("x", "v");
        assert_eq!(session.current_param.as_deref(), Some("z"));
    }

    #[test]
    fn test_advance_refuses_on_last_parameter() {
        let mut session = Session::new("s1", vec!["only".to_string()]);
        assert!(!session.advance_current_param());
        assert_eq!(session.current_param.as_deref(), Some("only"));
    }

    #[test]
    fn test_empty_universe_starts_complete() {
        let session = Session::new("s1", Vec::new());
        assert!(session.is_complete);
        assert_eq!(session.progress().progress_percentage, 100.0);
    }

    #[test]
    fn test_expiry() {
        let mut session = Session::new("s1", universe());
        assert!(!session.is_expired(Duration::seconds(3600)));
        session.last_activity = Utc::now() - Duration::seconds(7200);
        assert!(session.is_expired(Duration::seconds(3600)));
    }
}
