//! Intent classification for turn routing.
//!
//! Every user turn is categorized into exactly one [`Intent`] which
//! drives the state machine transition. Two classifier implementations
//! exist: the deterministic rule-based one in this crate (used by
//! tests) and a model-backed one in `ciq-interaction`.

pub mod rules;

pub use rules::{RuleBasedClassifier, RuleBasedResolver};

use async_trait::async_trait;
use std::str::FromStr;
use strum::{Display, EnumString};

/// The fixed set of recognized turn intents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum Intent {
    /// The input is the value for the currently prompted parameter.
    ParamAnswer,
    /// Keep the blueprint's existing value for the current parameter.
    UseDefault,
    /// Defer the current parameter and move on.
    SkipForNow,
    /// Re-open an already-collected parameter for editing.
    ChangeParam,
    /// A technical question to delegate to documentation search.
    TechQuery,
    /// Off-topic chatter; respond warmly and redirect.
    GeneralSilly,
}

impl Intent {
    /// Parses a classifier label, lower-cased and trimmed first.
    /// Anything outside the known label set maps to the off-topic
    /// default.
    pub fn from_label(label: &str) -> Self {
        Self::from_str(label.trim().to_lowercase().as_str()).unwrap_or(Self::GeneralSilly)
    }
}

/// Categorizes a user utterance given the collection context.
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    /// Returns exactly one intent. Implementations degrade to
    /// [`Intent::GeneralSilly`] instead of failing.
    async fn classify(
        &self,
        user_input: &str,
        current_param: &str,
        collected_params: &[String],
    ) -> Intent;
}

/// Resolves a free-text parameter reference ("change dnn1") against a
/// set of known parameter paths.
#[async_trait]
pub trait ParamResolver: Send + Sync {
    /// Returns a member of `known_params` or `None`, never a guessed
    /// partial path.
    async fn resolve(&self, user_input: &str, known_params: &[String]) -> Option<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_round_trip() {
        assert_eq!(Intent::ParamAnswer.to_string(), "param_answer");
        assert_eq!(Intent::from_label("param_answer"), Intent::ParamAnswer);
        assert_eq!(Intent::from_label("  Skip_For_Now \n"), Intent::SkipForNow);
    }

    #[test]
    fn test_unknown_label_defaults_to_off_topic() {
        assert_eq!(Intent::from_label("banana"), Intent::GeneralSilly);
        assert_eq!(Intent::from_label(""), Intent::GeneralSilly);
    }
}
