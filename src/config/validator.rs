//! Configuration validation

use super::GeneratorConfig;
use crate::model::ModelRegistry;
use anyhow::Result;

/// Validate complete configuration
pub fn validate_config(config: &GeneratorConfig) -> Result<()> {
    if config.model.is_none() {
        anyhow::bail!("No model supplied (use -m/--model or 'model' in the config file)");
    }

    if config.max_objects == 0 {
        anyhow::bail!("max objects must be at least 1");
    }

    validate_prefix(&config.prefix)?;

    Ok(())
}

/// Object names end up as whitespace-separated iolog fields
fn validate_prefix(prefix: &str) -> Result<()> {
    if prefix.chars().any(char::is_whitespace) {
        anyhow::bail!("object name prefix '{}' must not contain whitespace", prefix);
    }
    Ok(())
}

/// Check that at least one model can ever be admitted
///
/// If the smallest model needs more objects than the pool allows, the
/// scheduler could never admit anything.
pub fn validate_models(config: &GeneratorConfig, registry: &ModelRegistry) -> Result<()> {
    let Some(smallest) = registry.min_object_count() else {
        anyhow::bail!("no workload models loaded");
    };

    if smallest as usize > config.max_objects {
        anyhow::bail!(
            "smallest model needs {} objects but max objects is {}; nothing could be admitted",
            smallest,
            config.max_objects
        );
    }

    Ok(())
}
