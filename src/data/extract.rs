use std::time::{Duration, Instant};

use super::loader::RowSource;
use super::model::CleanRecord;
use crate::diagnostics::Diagnostics;
use crate::error::SourceError;

// ---------------------------------------------------------------------------
// Numeric parsing
// ---------------------------------------------------------------------------

/// Parse a cell such as `" 42% "` into a number.
///
/// Every `%` is removed, surrounding whitespace trimmed, and the rest
/// parsed as a decimal or scientific-notation float with an optional sign.
/// Non-finite results (`inf`, `nan`) are rejected.
pub fn parse_numeric(raw: &str) -> Option<f64> {
    let cleaned = raw.replace('%', "");
    cleaned
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

// ---------------------------------------------------------------------------
// Row extraction
// ---------------------------------------------------------------------------

/// The two columns scanned from the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPair {
    /// Join field; its text becomes the bar label.
    pub key: String,
    /// Numeric field that is plotted.
    pub value: String,
}

impl FieldPair {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        FieldPair {
            key: key.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractOptions {
    /// Abort the scan (as a source failure) once this much time has passed.
    /// Checked before each row.
    pub deadline: Option<Duration>,
}

/// Result of a completed scan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    /// Clean records in encounter order (not yet truncated).
    pub records: Vec<CleanRecord>,
    /// Rows whose value did not parse; each produced one warning.
    pub rejected: usize,
    /// Rows with a null key or value; skipped without a diagnostic.
    pub missing: usize,
}

/// Scan `source` and keep every row whose value parses as a number.
///
/// * null key or value → skipped silently
/// * unparsable value  → one warning naming the raw value, row skipped
/// * source cannot be opened or read → one error diagnostic, `Err`
pub fn extract_records<S, D>(
    source: &S,
    fields: &FieldPair,
    options: ExtractOptions,
    diag: &mut D,
) -> Result<Extraction, SourceError>
where
    S: RowSource + ?Sized,
    D: Diagnostics,
{
    match scan(source, fields, options, diag) {
        Ok(extraction) => Ok(extraction),
        Err(e) => {
            diag.error(format!("Error reading data for plotting: {e}"));
            Err(e)
        }
    }
}

fn scan<S, D>(
    source: &S,
    fields: &FieldPair,
    options: ExtractOptions,
    diag: &mut D,
) -> Result<Extraction, SourceError>
where
    S: RowSource + ?Sized,
    D: Diagnostics,
{
    let started = Instant::now();
    let rows = source.open(&fields.key, &fields.value)?;
    let mut out = Extraction::default();

    for row in rows {
        if let Some(limit) = options.deadline {
            if started.elapsed() >= limit {
                return Err(SourceError::Timeout(limit));
            }
        }

        let row = row?;
        let (Some(key), Some(raw)) = (row.key, row.value) else {
            out.missing += 1;
            continue;
        };

        match parse_numeric(&raw) {
            Some(value) => out.records.push(CleanRecord { label: key, value }),
            None => {
                diag.warning(format!(
                    "Skipping value '{raw}' - unable to convert to float."
                ));
                out.rejected += 1;
            }
        }
    }

    log::debug!(
        "scanned {}: {} kept, {} rejected, {} missing",
        source.describe(),
        out.records.len(),
        out.rejected,
        out.missing
    );
    Ok(out)
}
