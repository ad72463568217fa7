//! CLI argument parsing using clap

use super::DeferralPolicy;
use clap::Parser;
use std::path::PathBuf;

/// IOSynth - generate replayable block-storage IO traces from workload models
///
/// Output is a fio version 2 iolog that can be replayed with fio's
/// --read_iolog option.
#[derive(Parser, Debug)]
#[command(name = "iosynth")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Read workload models from FILE
    #[arg(short = 'm', long, value_name = "FILE")]
    pub model: Option<PathBuf>,

    /// Write the trace to FILE [default: standard output]
    #[arg(short = 'o', long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Generate CNT IO operations, 0 for unbounded [default: 1000000]
    #[arg(long, visible_alias = "ops", value_name = "CNT", value_parser = parse_count)]
    pub operations: Option<u64>,

    /// Maximum number of distinct objects operated on [default: 1000]
    #[arg(long, visible_alias = "obs", value_name = "CNT", value_parser = parse_object_count)]
    pub objects: Option<usize>,

    /// Prefix prepended to object names [default: rbd_data.]
    #[arg(short = 'p', long)]
    pub prefix: Option<String>,

    /// RNG seed for a reproducible trace
    #[arg(long, value_parser = parse_count)]
    pub seed: Option<u64>,

    /// What to do with a model that does not fit the object pool
    #[arg(long, value_enum)]
    pub deferral: Option<DeferralPolicy>,

    /// TOML configuration file (command-line flags take precedence)
    #[arg(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Write generation statistics as JSON to FILE
    #[arg(long, value_name = "FILE")]
    pub stats_json: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Load models and print the selection table without generating
    #[arg(long)]
    pub dry_run: bool,
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// Parse a count in decimal, `0x` hexadecimal or leading-zero octal
pub fn parse_count(s: &str) -> Result<u64, String> {
    let s = s.trim();
    let parsed = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16)
    } else if s.len() > 1 && s.starts_with('0') {
        u64::from_str_radix(&s[1..], 8)
    } else {
        s.parse()
    };
    parsed.map_err(|_| format!("cannot accept `{}'", s))
}

fn parse_object_count(s: &str) -> Result<usize, String> {
    let count = parse_count(s)?;
    usize::try_from(count).map_err(|_| format!("object count {} is too large", count))
}
