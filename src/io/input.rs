//! Issue export loading.
//!
//! The engine consumes already-fetched issue records; this reader accepts
//! the two shapes tracker exports come in: a bare JSON array of records, or
//! an object with an `issues` array (the REST search envelope). Record-level
//! validation is the normalizer's job; only a document that is neither shape
//! is an error here.

use crate::core::{TrainmapError, TrainmapResult};
use serde_json::Value;
use std::path::Path;

/// Load raw issue records from a JSON export file.
pub fn load_records(path: &Path) -> TrainmapResult<Vec<Value>> {
    let contents = std::fs::read_to_string(path)?;
    let records = parse_records(&contents)?;
    log::debug!("loaded {} records from {}", records.len(), path.display());
    Ok(records)
}

/// Parse an export document into its record list.
pub fn parse_records(contents: &str) -> TrainmapResult<Vec<Value>> {
    let document: Value = serde_json::from_str(contents)
        .map_err(|e| TrainmapError::InvalidExport(format!("not valid JSON: {e}")))?;

    match document {
        Value::Array(records) => Ok(records),
        Value::Object(mut envelope) => match envelope.remove("issues") {
            Some(Value::Array(records)) => Ok(records),
            Some(_) => Err(TrainmapError::InvalidExport(
                "\"issues\" is not an array".to_string(),
            )),
            None => Err(TrainmapError::InvalidExport(
                "expected an array of records or an object with an \"issues\" array".to_string(),
            )),
        },
        _ => Err(TrainmapError::InvalidExport(
            "expected an array of records or an object with an \"issues\" array".to_string(),
        )),
    }
}
