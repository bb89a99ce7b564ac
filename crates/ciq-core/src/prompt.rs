//! Deterministic prompt and response text built from parameter metadata.

use crate::blueprint::schema::{BlueprintSchema, ParameterSpec};

/// Welcome message seeded into every new session.
pub const WELCOME: &str = "Hi! I'm your deployment copilot. I'll guide you through \
filling the key blueprint parameters step by step.\n\nYou can answer directly, say \
\"use default\" to keep the blueprint value, say \"skip\" to come back later, or say \
\"change <parameter>\" to edit anything you already answered. Let's begin!";

/// Acknowledgement for messages arriving after completion.
pub const ALREADY_COMPLETE: &str = "All parameters have been collected and your YAML \
is ready! You can download it or ask me to regenerate it if needed.";

/// Reply when a change-parameter reference cannot be resolved.
pub const UNRESOLVED_CHANGE: &str = "I couldn't find that parameter. Try something \
like \"change dnn1\" or \"update network name\".";

/// Fallback redirect when the off-topic responder is unavailable.
pub const OFF_TOPIC_REDIRECT: &str = "That's an interesting question! My main focus \
is this deployment configuration though. Let's get back to it.";

/// Encouragement when the operator tries to skip the final parameter.
pub const LAST_PARAMETER: &str = "This is the last parameter we need. Could you \
please provide a value for it?";

/// Short display name for a dotted path: `global.` prefix stripped,
/// underscores as spaces.
pub fn display_name(path: &str) -> String {
    let base = path.rsplit('.').next().unwrap_or(path);
    base.replace('_', " ")
}

/// Renders the prompt for one parameter from its metadata.
///
/// Falls back to a title derived from the path's last segment when the
/// annotation carried none.
pub fn render_question(path: &str, spec: Option<&ParameterSpec>) -> String {
    let empty = ParameterSpec::default();
    let spec = spec.unwrap_or(&empty);

    let title = if spec.title.is_empty() {
        let mut fallback = display_name(path);
        if let Some(first) = fallback.get_mut(0..1) {
            first.make_ascii_uppercase();
        }
        fallback
    } else {
        spec.title.clone()
    };

    let mut question = format!("What value would you like for **{title}**?");
    if !spec.description.is_empty() {
        question.push_str(&format!("\n{}", spec.description));
    }
    if !spec.example.is_empty() {
        question.push_str(&format!("\nExample: `{}`", spec.example));
    }
    question
}

/// Convenience lookup-and-render against the schema.
pub fn question_for(schema: &BlueprintSchema, path: &str) -> String {
    render_question(path, schema.get(path))
}

/// Builds the contextual documentation-search query for a technical
/// question asked while a parameter is being prompted.
pub fn contextual_docs_query(user_input: &str, current_param: &str, description: &str) -> String {
    format!(
        "Context: I'm configuring the deployment parameter '{current_param}' \
which is: {description}\n\nUser Question: {user_input}\n\nPlease provide relevant \
information about this parameter or answer the user's question in the context of \
the deployment configuration."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name() {
        assert_eq!(display_name("global.provisioning.network_name"), "network name");
        assert_eq!(display_name("flat"), "flat");
    }

    #[test]
    fn test_render_question_full_metadata() {
        let spec = ParameterSpec {
            title: "DNN 1".to_string(),
            description: "Data Network Name 1".to_string(),
            example: "internet".to_string(),
        };
        let question = render_question("global.provisioning.dnn1", Some(&spec));
        assert!(question.contains("**DNN 1**"));
        assert!(question.contains("Data Network Name 1"));
        assert!(question.contains("`internet`"));
    }

    #[test]
    fn test_render_question_without_metadata() {
        let question = render_question("global.provisioning.dnn1", None);
        assert!(question.contains("**Dnn1**"));
        assert!(!question.contains("Example:"));
    }

    #[test]
    fn test_contextual_query_carries_param_and_question() {
        let query = contextual_docs_query("what is a DNN?", "global.provisioning.dnn1", "desc");
        assert!(query.contains("'global.provisioning.dnn1'"));
        assert!(query.contains("what is a DNN?"));
    }
}
