//! Dumps the extracted parameter schema as JSON.

use anyhow::Result;

use ciq_core::blueprint::BlueprintSchema;
use ciq_core::config::CiqConfig;

pub fn run(config: &CiqConfig) -> Result<()> {
    let schema = BlueprintSchema::try_from_file(&config.blueprint_path)?;
    let properties = schema.schema_properties();
    println!("{}", serde_json::to_string_pretty(&properties)?);
    Ok(())
}
