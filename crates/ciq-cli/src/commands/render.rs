//! One-shot merge of a flat values file into the blueprint.

use anyhow::{Context as _, Result, bail};
use std::collections::HashMap;
use std::path::Path;

use ciq_application::{BlueprintContext, MergeService};
use ciq_core::config::CiqConfig;

use crate::wiring;

pub async fn run(config: &CiqConfig, values_path: &Path) -> Result<()> {
    let text = std::fs::read_to_string(values_path)
        .with_context(|| format!("reading values file {}", values_path.display()))?;
    let values: HashMap<String, String> =
        serde_yaml::from_str(&text).context("values file must be a flat string-to-string map")?;

    let context = BlueprintContext::load(&config.blueprint_path);
    if context.blueprint.is_none() {
        bail!("blueprint {} could not be parsed", config.blueprint_path);
    }

    for path in values.keys() {
        if !context.schema.contains(path) {
            tracing::warn!(%path, "value does not match any annotated parameter");
        }
    }

    let merge = MergeService::new(wiring::offline_or_env_llm());
    println!("{}", merge.merge(&context, &values).await);
    Ok(())
}
