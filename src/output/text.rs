//! Human-readable text output
//!
//! Rendered to strings so the caller can send them to stderr; stdout may be
//! carrying the trace itself.

use crate::distribution::weighted::WeightedSampler;
use crate::stats::GenerationStats;
use std::fmt::Write;
use std::time::Duration;

const RULE: &str = "═══════════════════════════════════════════════════════════";

/// Render the generation summary
///
/// Displays:
/// - Drained operations and simulated time span
/// - Admissions, deferrals and how instances ended
/// - Object pool usage
/// - Admissions per model
pub fn render_summary(stats: &GenerationStats, max_objects: usize, elapsed: Duration) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out, "                 GENERATION SUMMARY");
    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out, "Elapsed Time:    {:.3}s", elapsed.as_secs_f64());
    let _ = writeln!(out, "Operations:      {}", format_number(stats.drains));
    let _ = writeln!(out, "Simulated span:  {}", format_micros(stats.final_time));
    let _ = writeln!(out);

    let _ = writeln!(out, "Instances:");
    let _ = writeln!(out, "  Admitted:      {}", format_number(stats.admissions));
    let _ = writeln!(out, "  Deferred:      {}", format_number(stats.deferrals));
    let _ = writeln!(out, "  Completed:     {}", format_number(stats.natural_closes));
    let _ = writeln!(out, "  Closed at end: {}", format_number(stats.shutdown_closes));
    let _ = writeln!(out, "  Peak active:   {}", format_number(stats.peak_active as u64));
    let _ = writeln!(out);

    let pct = if max_objects > 0 {
        stats.objects_used as f64 / max_objects as f64 * 100.0
    } else {
        0.0
    };
    let _ = writeln!(
        out,
        "Objects:         {} / {} ({:.1}%)",
        format_number(stats.objects_used as u64),
        format_number(max_objects as u64),
        pct
    );
    if stats.pool_starved {
        let _ = writeln!(out, "  Stopped early: object pool exhausted");
    }

    if !stats.admissions_by_model.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Admissions by model:");
        for (name, count) in &stats.admissions_by_model {
            let _ = writeln!(out, "  {:<24} {}", name, format_number(*count));
        }
    }

    let _ = write!(out, "{}", RULE);
    out
}

/// Render the model selection table (dry run)
pub fn render_distribution(sampler: &WeightedSampler) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<24} {:>8} {:>8} {:>10} {:>10}",
        "Model", "Length", "Objects", "Weight", "From"
    );
    for ((model, weight), boundary) in sampler
        .models()
        .iter()
        .zip(sampler.weights())
        .zip(sampler.boundaries())
    {
        let _ = writeln!(
            out,
            "{:<24} {:>8} {:>8} {:>10.6} {:>10.6}",
            model.name(),
            model.length(),
            model.object_count(),
            weight,
            boundary
        );
    }
    out
}

/// Format a number with thousands separators
fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();

    for (count, c) in s.chars().rev().enumerate() {
        if count > 0 && count % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }

    result.chars().rev().collect()
}

/// Format a simulated duration given in microseconds
fn format_micros(us: u64) -> String {
    if us >= 1_000_000 {
        format!("{:.3} s", us as f64 / 1_000_000.0)
    } else if us >= 1_000 {
        format!("{:.3} ms", us as f64 / 1_000.0)
    } else {
        format!("{} us", us)
    }
}
