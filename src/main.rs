//! IOSynth CLI entry point

use anyhow::{Context, Result};
use iosynth::config::{cli::Cli, toml as config_toml, validator, GeneratorConfig};
use iosynth::distribution::weighted::WeightedSampler;
use iosynth::model::loader;
use iosynth::output::{json, text};
use std::time::Instant;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Logs go to stderr; stdout may carry the trace
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = config_toml::resolve_config(&cli)?;
    validator::validate_config(&config).context("Configuration validation failed")?;

    let seed = *config.seed.get_or_insert_with(rand::random);

    info!("IOSynth v{}", env!("CARGO_PKG_VERSION"));
    for line in config.to_string().lines() {
        info!("{}", line);
    }

    let model_path = config
        .model
        .clone()
        .context("No model supplied")?;
    let registry = loader::load_models(&model_path)?;
    info!("Loaded {} models from {}", registry.len(), model_path.display());
    validator::validate_models(&config, &registry)?;

    if cli.dry_run {
        let sampler = WeightedSampler::new(registry.models())?;
        eprint!("{}", text::render_distribution(&sampler));
        eprintln!();
        eprintln!("Dry run mode - models and configuration validated successfully");
        return Ok(());
    }

    run(&config, &registry, seed)
}

fn run(config: &GeneratorConfig, registry: &iosynth::ModelRegistry, seed: u64) -> Result<()> {
    let start = Instant::now();
    let stats = iosynth::generate_trace(config, registry)?;
    let elapsed = start.elapsed();

    info!(
        "Generated {} operations from {} instances in {:.3}s",
        stats.drains,
        stats.admissions,
        elapsed.as_secs_f64()
    );
    eprintln!("{}", text::render_summary(&stats, config.max_objects, elapsed));

    if let Some(ref path) = config.stats_json {
        let report = json::JsonReport::new(config, seed, &stats, elapsed.as_secs_f64());
        json::write_json_report(path, &report, true)?;
        info!("Statistics written to {}", path.display());
    }

    Ok(())
}
