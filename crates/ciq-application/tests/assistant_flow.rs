//! End-to-end conversation flows through the assistant.

use async_trait::async_trait;
use std::sync::Arc;

use ciq_application::{BlueprintContext, CiqAssistant, TurnOutcome};
use ciq_core::capability::{DocsSearch, LlmInvoke};
use ciq_core::config::CiqConfig;
use ciq_core::error::Result;
use ciq_core::intent::{RuleBasedClassifier, RuleBasedResolver};

const BLUEPRINT: &str = "\
global:
  provisioning:
    mcc: '310' # CIQ: MCC|Mobile country code|310
    mnc: '410' # CIQ: MNC|Mobile network code|410
    dnn1: internet # CIQ: DNN 1|Primary data network name|internet
  alms:
    endpoint: alms.local # CIQ: ALMS endpoint|Management endpoint hostname
";

struct CannedLlm;

#[async_trait]
impl LlmInvoke for CannedLlm {
    async fn invoke(&self, _system: &str, _user: &str, _max_tokens: u32) -> Result<String> {
        Ok("Sure thing!".to_string())
    }
}

struct CannedDocs;

#[async_trait]
impl DocsSearch for CannedDocs {
    async fn search(&self, _query: &str) -> Result<String> {
        Ok("A DNN names the data network a subscriber attaches to.".to_string())
    }
}

fn assistant() -> CiqAssistant {
    CiqAssistant::new(
        &CiqConfig::default(),
        Arc::new(BlueprintContext::from_source(BLUEPRINT)),
        Arc::new(RuleBasedClassifier::new()),
        Arc::new(RuleBasedResolver::new()),
        Arc::new(CannedLlm),
        Arc::new(CannedDocs),
    )
}

/// The partition invariant must hold after every single turn.
fn assert_consistent(outcome: &TurnOutcome) {
    let progress = &outcome.progress;
    assert_eq!(progress.total_params, 4);
    assert_eq!(
        progress.collected_count + progress.missing_params.len(),
        progress.total_params
    );
    assert_eq!(progress.is_complete, progress.missing_params.is_empty());
    if let Some(current) = &progress.current_param {
        assert!(progress.missing_params.contains(current));
    }
}

async fn drive(
    assistant: &CiqAssistant,
    session_id: Option<&str>,
    inputs: &[&str],
) -> TurnOutcome {
    let mut outcome = assistant.process_turn(session_id, inputs[0]).await;
    assert_consistent(&outcome);
    for input in &inputs[1..] {
        outcome = assistant.process_turn(Some(&outcome.session_id), input).await;
        assert_consistent(&outcome);
    }
    outcome
}

#[tokio::test]
async fn happy_path_collects_in_sorted_order_and_merges() {
    let assistant = assistant();

    // prompting order: alms.endpoint, dnn1, mcc, mnc
    let outcome = drive(&assistant, None, &["alms.example.com", "ims", "US310", "US410"]).await;
    assert!(outcome.is_complete);
    assert_eq!(outcome.progress.progress_percentage, 100.0);
    // the completing turn already carries the merged document
    assert!(outcome.final_yaml.as_deref().unwrap().contains("dnn1: ims"));

    let yaml = assistant.generate_yaml(&outcome.session_id).await.unwrap();
    assert!(yaml.contains("endpoint: alms.example.com"));
    assert!(yaml.contains("dnn1: ims"));
    assert!(yaml.contains("mcc: US310"));
    // untouched blueprint content survives the merge
    assert!(yaml.contains("provisioning:"));
}

#[tokio::test]
async fn skipped_parameter_returns_with_the_next_prompt() {
    let assistant = assistant();

    let skipped = drive(&assistant, None, &["skip"]).await;
    assert_eq!(skipped.progress.collected_count, 0);
    assert_eq!(
        skipped.progress.current_param.as_deref(),
        Some("global.provisioning.dnn1")
    );

    // answering dnn1 brings the smallest missing path, the skipped
    // endpoint, straight back
    let outcome = drive(&assistant, Some(&skipped.session_id), &["ims"]).await;
    assert!(!outcome.is_complete);
    assert_eq!(
        outcome.progress.current_param.as_deref(),
        Some("global.alms.endpoint")
    );

    let done = drive(
        &assistant,
        Some(&outcome.session_id),
        &["alms.local", "310", "410"],
    )
    .await;
    assert!(done.is_complete);
}

#[tokio::test]
async fn tech_query_answers_without_losing_position() {
    let assistant = assistant();

    let before = drive(&assistant, None, &["alms.local"]).await;
    let current = before.progress.current_param.clone();

    let outcome = drive(
        &assistant,
        Some(&before.session_id),
        &["what is a DNN exactly"],
    )
    .await;
    assert!(outcome.response.contains("data network"));
    assert_eq!(outcome.progress.current_param, current);
    assert_eq!(outcome.progress.collected_count, 1);
}

#[tokio::test]
async fn change_after_completion_reopens_and_regenerates() {
    let assistant = assistant();
    let done = drive(&assistant, None, &["alms.local", "ims", "310", "410"]).await;
    assert!(done.is_complete);
    let id = done.session_id.clone();
    let first_yaml = assistant.generate_yaml(&id).await.unwrap();
    assert!(first_yaml.contains("dnn1: ims"));

    let reopened = drive(&assistant, Some(&id), &["change dnn1"]).await;
    assert!(!reopened.is_complete);
    assert_eq!(
        reopened.progress.current_param.as_deref(),
        Some("global.provisioning.dnn1")
    );
    assert!(reopened.response.contains("was: `ims`"));

    // re-completing refreshes the generated document
    let done_again = drive(&assistant, Some(&id), &["internet2"]).await;
    assert!(done_again.is_complete);
    assert!(done_again.final_yaml.as_deref().unwrap().contains("dnn1: internet2"));
    let second_yaml = assistant.generate_yaml(&id).await.unwrap();
    assert!(second_yaml.contains("dnn1: internet2"));

    let regen = drive(&assistant, Some(&id), &["regenerate please"]).await;
    assert!(regen.final_yaml.unwrap().contains("dnn1: internet2"));
}

#[tokio::test]
async fn use_default_takes_blueprint_value() {
    let assistant = assistant();
    let outcome = drive(&assistant, None, &["use the default"]).await;
    // alms.endpoint default comes from the blueprint text
    assert!(outcome.response.contains("**alms.local**"));
    assert_eq!(outcome.progress.collected_count, 1);
}

#[tokio::test]
async fn unknown_session_id_starts_fresh() {
    let assistant = assistant();
    let outcome = assistant.process_turn(Some("not-a-session"), "alms.local").await;
    assert_ne!(outcome.session_id, "not-a-session");
    assert_eq!(assistant.session_count().await, 1);
}

#[tokio::test]
async fn identical_transcripts_produce_identical_yaml() {
    let script = ["alms.local", "skip", "310", "ims", "410"];

    let mut documents = Vec::new();
    for _ in 0..2 {
        let assistant = assistant();
        let outcome = drive(&assistant, None, &script).await;
        assert!(outcome.is_complete);
        documents.push(assistant.generate_yaml(&outcome.session_id).await.unwrap());
    }
    assert_eq!(documents[0], documents[1]);
}
