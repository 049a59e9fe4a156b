//!
//! Usage and error recorders.
//!
//! Appends one JSON object per line to daily files under the fixed recorder
//! directories (see [`crate::config::paths`]). Writes are best-effort: a write
//! failure is logged and swallowed, it must never fail the request it's recording.
//!
//! Authors:
//!   Jaro <yarenty@gmail.com>
//!
//! Copyright (c) 2026 SkyCorp

/* --- uses ------------------------------------------------------------------------------------ */

use std::io::Write;
use std::path::PathBuf;

use serde::Serialize;

use crate::config::paths;

/* --- constants --------------------------------------------------------------------------------- */

/// Error records are suppressed for these upstream statuses: user-fault, uninteresting.
const SKIP_STATUS_CODES: &[u16] = &[401, 402, 404, 429];

/* --- types ----------------------------------------------------------------------------------- */

#[derive(Debug, Clone, Serialize)]
pub struct UsageRecord {
    pub timestamp: String,
    pub provider: String,
    pub requested_model: String,
    pub concrete_model: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached_input_tokens: Option<u32>,
    pub streaming: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorRecord {
    pub timestamp: String,
    pub request_id: String,
    pub provider: String,
    pub requested_model: String,
    pub streaming: bool,
    pub error: ErrorRecordBody,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorRecordBody {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
}

/* --- start of code -------------------------------------------------------------------------- */

/// Append a usage record to today's `token_usage` file. Logs and swallows any I/O failure.
pub fn record_usage(record: &UsageRecord) {
    match paths::token_usage_dir() {
        Ok(dir) => append_record(&daily_file(&dir), record),
        Err(e) => tracing::warn!("could not resolve token_usage directory: {}", e),
    }
}

/// Append an error record to today's `error_logs` file, unless `status` is one of
/// [`SKIP_STATUS_CODES`] (suppressed as user-fault and uninteresting).
pub fn record_error(record: &ErrorRecord) {
    if record.error.status.is_some_and(|s| SKIP_STATUS_CODES.contains(&s)) {
        return;
    }

    match paths::error_log_dir() {
        Ok(dir) => append_record(&daily_file(&dir), record),
        Err(e) => tracing::warn!("could not resolve error_logs directory: {}", e),
    }
}

fn daily_file(dir: &std::path::Path) -> PathBuf {
    dir.join(format!("{}.jsonl", today()))
}

fn today() -> String {
    chrono::Utc::now().format("%Y-%m-%d").to_string()
}

fn append_record(path: &std::path::Path, record: &impl Serialize) {
    let line = match serde_json::to_string(record) {
        Ok(line) => line,
        Err(e) => {
            tracing::warn!("failed to serialize recorder line: {}", e);
            return;
        }
    };

    let result = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .and_then(|mut file| writeln!(file, "{}", line));

    if let Err(e) = result {
        tracing::warn!("failed to append recorder line to {}: {}", path.display(), e);
    }
}

/* --- tests ------------------------------------------------------------------------------------ */
