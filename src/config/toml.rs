//! TOML configuration file parsing
//!
//! ```toml
//! [generator]
//! model = "models.txt"
//! output = "trace.iolog"
//! operations = 500000
//! max_objects = 2000
//! prefix = "rbd_data.1234."
//! seed = 42
//! deferral = "retain"
//! ```

use super::cli::Cli;
use super::{ConfigFile, GeneratorConfig};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Parse TOML configuration file
pub fn parse_toml_file(path: &Path) -> Result<GeneratorConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_toml_string(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Parse TOML configuration from string
pub fn parse_toml_string(contents: &str) -> Result<GeneratorConfig> {
    let file: ConfigFile = ::toml::from_str(contents)
        .context("Failed to parse TOML configuration")?;

    Ok(file.generator)
}

/// Merge CLI arguments with a base configuration (CLI takes precedence)
pub fn merge_cli_with_config(cli: &Cli, mut config: GeneratorConfig) -> GeneratorConfig {
    if let Some(ref model) = cli.model {
        config.model = Some(model.clone());
    }
    if let Some(ref output) = cli.output {
        config.output = Some(output.clone());
    }
    if let Some(operations) = cli.operations {
        config.operations = operations;
    }
    if let Some(objects) = cli.objects {
        config.max_objects = objects;
    }
    if let Some(ref prefix) = cli.prefix {
        config.prefix = prefix.clone();
    }
    if let Some(seed) = cli.seed {
        config.seed = Some(seed);
    }
    if let Some(deferral) = cli.deferral {
        config.deferral = deferral;
    }
    if let Some(ref stats_json) = cli.stats_json {
        config.stats_json = Some(stats_json.clone());
    }

    config
}

/// Resolve the effective configuration from defaults, config file and CLI
pub fn resolve_config(cli: &Cli) -> Result<GeneratorConfig> {
    let base = match cli.config {
        Some(ref path) => parse_toml_file(path)?,
        None => GeneratorConfig::default(),
    };
    Ok(merge_cli_with_config(cli, base))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DeferralPolicy;
    use clap::Parser;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_table() {
        let config = parse_toml_string(
            r#"
            [generator]
            model = "models.txt"
            operations = 10
            max_objects = 20
            prefix = "p."
            seed = 7
            deferral = "retain"
            "#,
        )
        .unwrap();

        assert_eq!(config.model, Some(PathBuf::from("models.txt")));
        assert_eq!(config.operations, 10);
        assert_eq!(config.max_objects, 20);
        assert_eq!(config.prefix, "p.");
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.deferral, DeferralPolicy::Retain);
        assert!(config.output.is_none());
    }

    #[test]
    fn test_parse_partial_uses_defaults() {
        let config = parse_toml_string("[generator]\nseed = 1\n").unwrap();
        assert_eq!(config.operations, 1_000_000);
        assert_eq!(config.prefix, "rbd_data.");

        let empty = parse_toml_string("").unwrap();
        assert_eq!(empty, GeneratorConfig::default());
    }

    #[test]
    fn test_parse_rejects_unknown_table() {
        assert!(parse_toml_string("[workers]\nthreads = 4\n").is_err());
    }

    #[test]
    fn test_cli_overrides_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"[generator]\noperations = 10\nprefix = \"file.\"\nseed = 3\n")
            .unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let cli = Cli::try_parse_from(["iosynth", "-c", &path, "--ops", "99", "-m", "m.txt"]).unwrap();
        let config = resolve_config(&cli).unwrap();

        assert_eq!(config.operations, 99);
        assert_eq!(config.prefix, "file.");
        assert_eq!(config.seed, Some(3));
        assert_eq!(config.model, Some(PathBuf::from("m.txt")));
    }

    #[test]
    fn test_missing_config_file() {
        let cli = Cli::try_parse_from(["iosynth", "-c", "/nonexistent/iosynth.toml"]).unwrap();
        let err = resolve_config(&cli).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
