//! CSV Ingestion - turns raw comma-separated text into rows and column metadata
//!
//! The reader is deliberately naive: lines are split on `\n`, fields on `,`,
//! and there is no quoting or escaping. Lines whose field count does not
//! match the header are skipped rather than failing the whole upload.
//!
//! Column types are sniffed from the first surviving row only. A column whose
//! first value is numeric is a number column even if later rows hold text.

use crate::dataset::{parse_number, CellValue, ColumnMetadata, ColumnType, Dataset, Row};
use crate::error::{DashboardError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%b %d %Y",
    "%d %B %Y",
    "%d %b %Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
];

/// Parse CSV text into a [`Dataset`].
pub fn parse(text: &str) -> Result<Dataset> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(DashboardError::EmptyInput);
    }

    let mut lines = trimmed.split('\n');
    let header_line = lines.next().unwrap_or_default();

    // A header with nothing under it is a well-formed file without rows.
    let data_lines: Vec<&str> = lines.collect();
    if data_lines.is_empty() {
        return Err(DashboardError::NoRowsParsed);
    }

    let raw_header: Vec<String> = header_line.split(',').map(|h| h.trim().to_string()).collect();

    // Repeated names collapse onto their first position; the last field wins.
    let mut distinct: Vec<String> = Vec::with_capacity(raw_header.len());
    let slots: Vec<usize> = raw_header
        .iter()
        .map(|name| match distinct.iter().position(|d| d == name) {
            Some(slot) => slot,
            None => {
                distinct.push(name.clone());
                distinct.len() - 1
            }
        })
        .collect();
    if distinct.len() < raw_header.len() {
        warn!(
            "Header repeats {} column name(s); later fields overwrite earlier ones",
            raw_header.len() - distinct.len()
        );
    }
    let header: Arc<[String]> = distinct.into();

    let mut rows = Vec::with_capacity(data_lines.len());
    let mut skipped = 0usize;
    for (idx, line) in data_lines.iter().enumerate() {
        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() != raw_header.len() {
            // Line numbers are 1-based and count the header.
            debug!(
                "Skipping line {}: expected {} fields, found {}",
                idx + 2,
                raw_header.len(),
                fields.len()
            );
            skipped += 1;
            continue;
        }
        let mut values = vec![CellValue::Text(String::new()); header.len()];
        for (slot, field) in slots.iter().zip(fields) {
            values[*slot] = coerce_cell(field);
        }
        rows.push(Row::new(Arc::clone(&header), values));
    }

    let Some(first) = rows.first() else {
        return Err(DashboardError::NoRowsParsed);
    };

    let columns = header
        .iter()
        .map(|name| ColumnMetadata::new(name.clone(), infer_column_type(first.get(name))))
        .collect();

    info!(
        "Parsed {} rows across {} columns ({} malformed lines skipped)",
        rows.len(),
        header.len(),
        skipped
    );

    Ok(Dataset::new(rows, columns))
}

/// Read a UTF-8 file from disk and parse it.
pub fn parse_file(path: impl AsRef<Path>) -> Result<Dataset> {
    let path = path.as_ref();
    info!("Loading CSV from {}", path.display());
    let text = std::fs::read_to_string(path)?;
    parse(&text)
}

fn coerce_cell(raw: &str) -> CellValue {
    let trimmed = raw.trim();
    match parse_number(trimmed) {
        Some(n) => CellValue::Number(n),
        None => CellValue::Text(trimmed.to_string()),
    }
}

fn infer_column_type(sample: Option<&CellValue>) -> ColumnType {
    match sample {
        Some(CellValue::Number(_)) => ColumnType::Number,
        Some(CellValue::Text(s)) if looks_like_date(s) => ColumnType::Date,
        _ => ColumnType::String,
    }
}

/// Calendar-date sniffing for the first-row heuristic.
pub fn looks_like_date(text: &str) -> bool {
    let text = text.trim();
    if text.is_empty() {
        return false;
    }
    DateTime::parse_from_rfc3339(text).is_ok()
        || DateTime::parse_from_rfc2822(text).is_ok()
        || DATE_FORMATS
            .iter()
            .any(|fmt| NaiveDate::parse_from_str(text, fmt).is_ok())
        || DATETIME_FORMATS
            .iter()
            .any(|fmt| NaiveDateTime::parse_from_str(text, fmt).is_ok())
}
