use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{Array, AsArray};
use arrow::datatypes::{DataType, Float32Type, Float64Type, Int32Type, Int64Type};
use arrow::util::display::{ArrayFormatter, FormatOptions};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{AttributeTable, AttributeValue, RawRecord, Row};
use crate::error::SourceError;

// ---------------------------------------------------------------------------
// Row sources
// ---------------------------------------------------------------------------

/// Lazy stream of (key, value) rows. A read failure ends the scan.
pub type RowIter<'a> = Box<dyn Iterator<Item = Result<RawRecord, SourceError>> + 'a>;

/// Something that can be scanned row by row on two named fields.
pub trait RowSource {
    /// Human-readable name used in diagnostics.
    fn describe(&self) -> String;

    /// Open a scan over `key_field` and `value_field`.
    ///
    /// Fails when the source cannot be opened or either field is missing.
    /// Dropping the iterator releases the underlying reader.
    fn open(&self, key_field: &str, value_field: &str) -> Result<RowIter<'_>, SourceError>;
}

impl RowSource for AttributeTable {
    fn describe(&self) -> String {
        format!("in-memory table ({} rows)", self.len())
    }

    fn open(&self, key_field: &str, value_field: &str) -> Result<RowIter<'_>, SourceError> {
        for field in [key_field, value_field] {
            if !self.has_column(field) {
                return Err(SourceError::MissingField(field.to_string()));
            }
        }
        let (key_field, value_field) = (key_field.to_string(), value_field.to_string());
        Ok(Box::new(
            self.rows.iter().map(move |row| {
                Ok::<_, SourceError>(record_from_row(row, &key_field, &value_field))
            }),
        ))
    }
}

fn record_from_row(row: &Row, key_field: &str, value_field: &str) -> RawRecord {
    RawRecord {
        key: row.get(key_field).and_then(AttributeValue::as_text),
        value: row.get(value_field).and_then(AttributeValue::as_text),
    }
}

/// A table stored on disk. CSV files are streamed; other formats are
/// loaded whole and then iterated.
#[derive(Debug, Clone)]
pub struct TableFile {
    pub path: PathBuf,
}

impl TableFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        TableFile { path: path.into() }
    }
}

impl RowSource for TableFile {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn open(&self, key_field: &str, value_field: &str) -> Result<RowIter<'_>, SourceError> {
        if table_format(&self.path)? == TableFormat::Csv {
            return open_csv_rows(&self.path, key_field, value_field);
        }

        let table = load_table(&self.path)?;
        for field in [key_field, value_field] {
            if !table.has_column(field) {
                return Err(SourceError::MissingField(field.to_string()));
            }
        }
        let (key_field, value_field) = (key_field.to_string(), value_field.to_string());
        Ok(Box::new(
            table.rows.into_iter().map(move |row| {
                Ok::<_, SourceError>(record_from_row(&row, &key_field, &value_field))
            }),
        ))
    }
}

fn open_csv_rows<'a>(
    path: &Path,
    key_field: &str,
    value_field: &str,
) -> Result<RowIter<'a>, SourceError> {
    let mut reader = csv_reader(path)?;
    let headers = reader.headers()?.clone();
    let position = |field: &str| {
        headers
            .iter()
            .position(|h| h == field)
            .ok_or_else(|| SourceError::MissingField(field.to_string()))
    };
    let key_idx = position(key_field)?;
    let value_idx = position(value_field)?;

    Ok(Box::new(reader.into_records().map(
        move |result| -> Result<RawRecord, SourceError> {
            let record = result?;
            let cell = |idx: usize| {
                record
                    .get(idx)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
            };
            Ok(RawRecord {
                key: cell(key_idx),
                value: cell(value_idx),
            })
        },
    )))
}

// ---------------------------------------------------------------------------
// Public entry-point for whole-table loading
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TableFormat {
    Csv,
    Json,
    Parquet,
}

fn table_format(path: &Path) -> Result<TableFormat, SourceError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" | "txt" => Ok(TableFormat::Csv),
        "json" => Ok(TableFormat::Json),
        "parquet" | "pq" => Ok(TableFormat::Parquet),
        other => Err(SourceError::UnsupportedFormat(other.to_string())),
    }
}

/// Load an attribute table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row with column names, one record per line
/// * `.json`    – `[{ "region_id": "R01", "share": "12%" }, ...]`
/// * `.parquet` – flat scalar columns
pub fn load_table(path: &Path) -> Result<AttributeTable, SourceError> {
    match table_format(path)? {
        TableFormat::Csv => load_csv(path),
        TableFormat::Json => load_json(path),
        TableFormat::Parquet => load_parquet(path),
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> SourceError + '_ {
    move |source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn csv_reader(path: &Path) -> Result<csv::Reader<File>, SourceError> {
    let file = File::open(path).map_err(io_error(path))?;
    Ok(csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(file))
}

/// CSV layout: header row with column names; cells are kept as text.
fn load_csv(path: &Path) -> Result<AttributeTable, SourceError> {
    let mut reader = csv_reader(path)?;
    let column_names: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let row: Row = column_names
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let value = AttributeValue::from_text(record.get(idx).unwrap_or(""));
                (name.clone(), value)
            })
            .collect();
        rows.push(row);
    }

    Ok(AttributeTable { column_names, rows })
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "region_id": "R01", "name": "North", "share": "12.5%" },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<AttributeTable, SourceError> {
    let text = std::fs::read_to_string(path).map_err(io_error(path))?;
    let root: JsonValue = serde_json::from_str(&text)?;

    let records = root
        .as_array()
        .ok_or_else(|| SourceError::Malformed("expected a top-level JSON array".into()))?;

    let mut rows = Vec::with_capacity(records.len());
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .ok_or_else(|| SourceError::Malformed(format!("row {i} is not a JSON object")))?;
        let row: Row = obj
            .iter()
            .map(|(key, val)| (key.clone(), json_to_attribute(val)))
            .collect();
        rows.push(row);
    }

    Ok(AttributeTable::from_rows(rows))
}

/// Convert a JSON scalar into a table cell.
pub fn json_to_attribute(val: &JsonValue) -> AttributeValue {
    match val {
        JsonValue::String(s) => AttributeValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                AttributeValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                AttributeValue::Float(f)
            } else {
                AttributeValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => AttributeValue::Bool(*b),
        JsonValue::Null => AttributeValue::Null,
        other => AttributeValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with flat scalar columns.
fn load_parquet(path: &Path) -> Result<AttributeTable, SourceError> {
    let file = File::open(path).map_err(io_error(path))?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let column_names: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build()?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result?;
        let columns = batch.columns();

        for row in 0..batch.num_rows() {
            let mut cells = Row::new();
            for (name, col) in column_names.iter().zip(columns) {
                cells.insert(name.clone(), extract_attribute_value(col, row)?);
            }
            rows.push(cells);
        }
    }

    Ok(AttributeTable { column_names, rows })
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_attribute_value(col: &Arc<dyn Array>, row: usize) -> Result<AttributeValue, SourceError> {
    if col.is_null(row) {
        return Ok(AttributeValue::Null);
    }
    let value = match col.data_type() {
        DataType::Utf8 => col
            .as_string_opt::<i32>()
            .map(|s| AttributeValue::String(s.value(row).to_string())),
        DataType::LargeUtf8 => col
            .as_string_opt::<i64>()
            .map(|s| AttributeValue::String(s.value(row).to_string())),
        DataType::Int32 => col
            .as_primitive_opt::<Int32Type>()
            .map(|a| AttributeValue::Integer(a.value(row) as i64)),
        DataType::Int64 => col
            .as_primitive_opt::<Int64Type>()
            .map(|a| AttributeValue::Integer(a.value(row))),
        DataType::Float32 => col
            .as_primitive_opt::<Float32Type>()
            .map(|a| AttributeValue::Float(a.value(row) as f64)),
        DataType::Float64 => col
            .as_primitive_opt::<Float64Type>()
            .map(|a| AttributeValue::Float(a.value(row))),
        DataType::Boolean => col
            .as_boolean_opt()
            .map(|a| AttributeValue::Bool(a.value(row))),
        _ => None,
    };
    match value {
        Some(v) => Ok(v),
        // Dates, decimals, dictionaries: keep their display text.
        None => {
            let formatter = ArrayFormatter::try_new(col.as_ref(), &FormatOptions::default())?;
            Ok(AttributeValue::String(formatter.value(row).to_string()))
        }
    }
}
