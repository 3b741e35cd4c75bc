//! JSON Schema validation for client config files.
//!
//! Config files are YAML, but they are converted to JSON and checked against
//! `schema/config.schema.json` before deserialization, so a typo'd key is
//! reported with its location instead of being silently ignored.

use std::sync::OnceLock;

/// Embedded config schema (loaded at compile time).
const CONFIG_SCHEMA_JSON: &str = include_str!("../../schema/config.schema.json");

/// Compiled validator (initialized once, reused).
static COMPILED_SCHEMA: OnceLock<Result<jsonschema::Validator, String>> = OnceLock::new();

fn validator() -> Result<&'static jsonschema::Validator, String> {
    let compiled = COMPILED_SCHEMA.get_or_init(|| {
        let schema: serde_json::Value = serde_json::from_str(CONFIG_SCHEMA_JSON)
            .map_err(|e| format!("Invalid schema JSON: {}", e))?;
        jsonschema::options()
            .build(&schema)
            .map_err(|e| format!("Failed to compile schema: {}", e))
    });
    compiled.as_ref().map_err(Clone::clone)
}

/// Validate a config document.
///
/// Returns every violation, each suffixed with its instance path.
pub fn validate_config_schema(config: &serde_json::Value) -> Result<(), Vec<String>> {
    let validator = validator().map_err(|e| vec![e])?;

    let errors: Vec<String> = validator
        .iter_errors(config)
        .map(|e| format!("{} at {}", e, e.instance_path))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
