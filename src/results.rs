//! Parsing of `rally task results` payloads
//!
//! The results command prints a JSON array of task records. The harness
//! only supports single-record payloads and reduces the record to three
//! numbers; the raw record stays available for callers that need more.

use serde::Deserialize;

use crate::error::{HarnessError, HarnessResult};

/// One record of the results array.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskRecord {
    pub full_duration: f64,
    pub load_duration: f64,
    #[serde(default)]
    pub result: Vec<Iteration>,
}

/// One scenario iteration inside a task record.
#[derive(Debug, Clone, Deserialize)]
pub struct Iteration {
    #[serde(default)]
    pub error: Vec<serde_json::Value>,
}

/// Summary numbers of one benchmark run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunStats {
    pub full_duration: f64,
    pub load_duration: f64,
    /// Total error count, summed over the error lists of all iterations.
    pub errors: usize,
}

/// Parsed benchmark results: summary plus the raw record.
#[derive(Debug, Clone)]
pub struct RallyResult {
    pub stats: RunStats,
    pub record: TaskRecord,
}

impl RallyResult {
    /// Parse the results text. Payloads with any record count other than
    /// exactly one are unsupported and rejected.
    pub fn parse(raw: &str) -> HarnessResult<Self> {
        let records: Vec<serde_json::Value> = serde_json::from_str(raw)?;
        if records.len() != 1 {
            return Err(HarnessError::ResultShape(records.len()));
        }
        let record: TaskRecord = serde_json::from_value(records.into_iter().next().unwrap())?;
        let errors = record.result.iter().map(|iter| iter.error.len()).sum();
        Ok(Self {
            stats: RunStats {
                full_duration: record.full_duration,
                load_duration: record.load_duration,
                errors,
            },
            record,
        })
    }
}
