//! Deterministic keyword heuristics for intent classification and
//! parameter-reference resolution.

use async_trait::async_trait;

use super::{Intent, IntentClassifier, ParamResolver};

const SKIP_PATTERNS: &[&str] = &["skip", "next", "later", "pass"];
const DEFAULT_PATTERNS: &[&str] = &["default"];
const CHANGE_PATTERNS: &[&str] = &["change ", "update ", "edit ", "modify "];
const TECH_PATTERNS: &[&str] = &["what is", "how do", "how to", "explain", "help", "configure", "setup"];
const QUESTION_PATTERNS: &[&str] = &["?", "what", "how", "why", "when", "where"];

/// Literal substring heuristics evaluated in a fixed priority order:
/// skip, use-default, change, tech, question heuristic, answer.
/// Identical input always yields the same label.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedClassifier;

impl RuleBasedClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Synchronous classification core, also usable outside async code.
    pub fn classify_input(&self, user_input: &str) -> Intent {
        let lower = user_input.trim().to_lowercase();

        if SKIP_PATTERNS.iter().any(|p| lower.contains(p)) {
            return Intent::SkipForNow;
        }
        if DEFAULT_PATTERNS.iter().any(|p| lower.contains(p)) {
            return Intent::UseDefault;
        }
        if CHANGE_PATTERNS.iter().any(|p| lower.contains(p)) {
            return Intent::ChangeParam;
        }
        if TECH_PATTERNS.iter().any(|p| lower.contains(p)) {
            return Intent::TechQuery;
        }
        if QUESTION_PATTERNS.iter().any(|p| lower.contains(p)) {
            return Intent::GeneralSilly;
        }
        Intent::ParamAnswer
    }
}

#[async_trait]
impl IntentClassifier for RuleBasedClassifier {
    async fn classify(
        &self,
        user_input: &str,
        _current_param: &str,
        _collected_params: &[String],
    ) -> Intent {
        self.classify_input(user_input)
    }
}

/// Substring matcher that resolves a reference like "change dnn1" to an
/// exact member of the known path set.
///
/// A path matches when the input mentions its last segment (underscores
/// also tried as spaces) or the full dotted path. The lookup is
/// best-effort: anything but a unique match resolves to `None`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedResolver;

impl RuleBasedResolver {
    pub fn new() -> Self {
        Self
    }

    pub fn resolve_input(&self, user_input: &str, known_params: &[String]) -> Option<String> {
        let lower = user_input.trim().to_lowercase();

        let matches: Vec<&String> = known_params
            .iter()
            .filter(|path| {
                let path_lower = path.to_lowercase();
                let last = path_lower.rsplit('.').next().unwrap_or(&path_lower);
                lower.contains(last)
                    || lower.contains(&last.replace('_', " "))
                    || lower.contains(&path_lower)
            })
            .collect();

        match matches.as_slice() {
            [single] => Some((*single).clone()),
            _ => None,
        }
    }
}

#[async_trait]
impl ParamResolver for RuleBasedResolver {
    async fn resolve(&self, user_input: &str, known_params: &[String]) -> Option<String> {
        self.resolve_input(user_input, known_params)
    }
}
