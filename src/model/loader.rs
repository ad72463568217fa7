//! Workload model file loading
//!
//! A model file is plain text holding zero or more records:
//!
//! ```text
//! # comments and blank lines are ignored
//! model small-writer length=10 objects=2
//! 0    write 0 0 4096
//! 150  write 1 0 4096
//! 300  sync  1
//! end
//! ```
//!
//! Each op line is `<at_us> <action> <object> [<offset> <len>]`. Offset and
//! length are required for `read`, `write` and `trim`, optional for `sync`
//! and `datasync`.
//!
//! Records are loaded sequentially. A record that fails to parse is reported
//! and skipped; loading resumes at the next `model` line. The caller decides
//! what a partial load means via [`LoadReport`].

use super::{ModelError, ModelOp, ModelRegistry, OpAction, WorkloadModel};
use crate::Result;
use anyhow::Context;
use std::fs;
use std::path::Path;
use tracing::{debug, error};

/// Outcome of loading a model file
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Successfully parsed models, in file order
    pub models: Vec<WorkloadModel>,
    /// One entry per failed record
    pub failures: Vec<ModelError>,
}

impl LoadReport {
    /// True when every record loaded
    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Load a model file, treating any failed record as fatal
///
/// Every failed record is logged before the error is returned, so the
/// operator sees all problems in one pass. An empty file is also an error
/// since there is nothing to sample from.
pub fn load_models(path: &Path) -> Result<ModelRegistry> {
    let report = load_models_file(path)?;

    for failure in &report.failures {
        error!("{}: {}", path.display(), failure);
    }
    if !report.is_ok() {
        anyhow::bail!(
            "Failed to load models from '{}': {} of {} records failed",
            path.display(),
            report.failures.len(),
            report.failures.len() + report.models.len()
        );
    }
    if report.models.is_empty() {
        anyhow::bail!("Model file '{}' contains no models", path.display());
    }

    debug!("Loaded {} models from {}", report.models.len(), path.display());
    Ok(ModelRegistry::new(report.models))
}

/// Read and parse a model file, collecting per-record failures
pub fn load_models_file(path: &Path) -> Result<LoadReport> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read model file: {}", path.display()))?;
    Ok(parse_models(&content))
}

/// Parse model records from a string
pub fn parse_models(content: &str) -> LoadReport {
    let mut report = LoadReport::default();
    let mut lines = content
        .lines()
        .enumerate()
        .map(|(idx, raw)| (idx + 1, strip_comment(raw)))
        .filter(|(_, line)| !line.is_empty())
        .peekable();

    while let Some((line_no, line)) = lines.next() {
        if !is_record_header(line) {
            report.failures.push(ModelError::Syntax {
                line: line_no,
                message: format!("expected 'model' record header, found '{}'", line),
            });
            // Resynchronise on the next header
            while let Some((_, next)) = lines.peek() {
                if is_record_header(next) {
                    break;
                }
                lines.next();
            }
            continue;
        }

        let mut body = Vec::new();
        let mut terminated = false;
        while let Some(&(body_line_no, body_line)) = lines.peek() {
            if is_record_header(body_line) {
                break;
            }
            lines.next();
            if body_line == "end" {
                terminated = true;
                break;
            }
            body.push((body_line_no, body_line));
        }

        match parse_record(line_no, line, &body, terminated) {
            Ok(model) => report.models.push(model),
            Err(e) => report.failures.push(e),
        }
    }

    report
}

fn strip_comment(raw: &str) -> &str {
    raw.split('#').next().unwrap_or("").trim()
}

fn is_record_header(line: &str) -> bool {
    line.split_whitespace().next() == Some("model")
}

fn parse_record(
    line_no: usize,
    header: &str,
    body: &[(usize, &str)],
    terminated: bool,
) -> std::result::Result<WorkloadModel, ModelError> {
    let mut tokens = header.split_whitespace().skip(1);
    let name = tokens.next().ok_or_else(|| ModelError::Syntax {
        line: line_no,
        message: "model record has no name".to_string(),
    })?;

    let mut length = None;
    let mut objects = None;
    for token in tokens {
        let (key, value) = token.split_once('=').ok_or_else(|| ModelError::Syntax {
            line: line_no,
            message: format!("expected key=value, found '{}'", token),
        })?;
        let parsed = parse_number::<u32>(line_no, key, value)?;
        match key {
            "length" => length = Some(parsed),
            "objects" => objects = Some(parsed),
            other => {
                return Err(ModelError::Syntax {
                    line: line_no,
                    message: format!("unknown model attribute '{}'", other),
                })
            }
        }
    }

    if !terminated {
        return Err(ModelError::Unterminated {
            line: line_no,
            model: name.to_string(),
        });
    }

    let length = length.ok_or_else(|| missing(line_no, name, "length"))?;
    let objects = objects.ok_or_else(|| missing(line_no, name, "objects"))?;

    let ops = body
        .iter()
        .map(|&(op_line, text)| parse_op(op_line, text))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    WorkloadModel::new(name, length, objects, ops)
}

fn missing(line: usize, name: &str, attribute: &str) -> ModelError {
    ModelError::Syntax {
        line,
        message: format!("model '{}' is missing '{}='", name, attribute),
    }
}

fn parse_op(line: usize, text: &str) -> std::result::Result<ModelOp, ModelError> {
    let fields: Vec<&str> = text.split_whitespace().collect();
    if fields.len() < 3 {
        return Err(ModelError::Syntax {
            line,
            message: format!("op needs at least 3 fields, found '{}'", text),
        });
    }

    let at = parse_number::<u64>(line, "time", fields[0])?;
    let action: OpAction = fields[1]
        .parse()
        .map_err(|message| ModelError::Syntax { line, message })?;
    let object = parse_number::<u32>(line, "object", fields[2])?;

    let (offset, len) = match (fields.len(), action.has_range()) {
        (5, _) => (
            parse_number::<u64>(line, "offset", fields[3])?,
            parse_number::<u64>(line, "length", fields[4])?,
        ),
        (3, false) => (0, 0),
        (n, _) => {
            return Err(ModelError::Syntax {
                line,
                message: format!("'{}' op has {} fields", action, n),
            })
        }
    };

    Ok(ModelOp::new(at, action, object, offset, len))
}

fn parse_number<T: std::str::FromStr>(
    line: usize,
    what: &str,
    value: &str,
) -> std::result::Result<T, ModelError> {
    value.parse().map_err(|_| ModelError::Syntax {
        line,
        message: format!("invalid {} '{}'", what, value),
    })
}
