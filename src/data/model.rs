use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Maximum number of bars drawn in one chart.
pub const SAMPLE_CAP: usize = 20;

// ---------------------------------------------------------------------------
// AttributeValue – a single cell of an attribute table
// ---------------------------------------------------------------------------

/// A dynamically-typed table cell, decoded once at the source boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::String(s) => write!(f, "{s}"),
            AttributeValue::Integer(i) => write!(f, "{i}"),
            AttributeValue::Float(v) => write!(f, "{v}"),
            AttributeValue::Bool(b) => write!(f, "{b}"),
            AttributeValue::Null => write!(f, "<null>"),
        }
    }
}

impl AttributeValue {
    /// Text form of the cell, `None` for nulls.
    pub fn as_text(&self) -> Option<String> {
        match self {
            AttributeValue::Null => None,
            other => Some(other.to_string()),
        }
    }

    /// A text cell kept verbatim; empty cells are nulls.
    ///
    /// Text cells are never type-guessed: `"007"` must stay `"007"` to match
    /// join keys stored as text.
    pub fn from_text(s: &str) -> Self {
        if s.is_empty() {
            AttributeValue::Null
        } else {
            AttributeValue::String(s.to_string())
        }
    }
}

impl From<&AttributeValue> for serde_json::Value {
    fn from(value: &AttributeValue) -> Self {
        match value {
            AttributeValue::String(s) => serde_json::Value::String(s.clone()),
            AttributeValue::Integer(i) => serde_json::Value::from(*i),
            AttributeValue::Float(v) => serde_json::Number::from_f64(*v)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            AttributeValue::Bool(b) => serde_json::Value::Bool(*b),
            AttributeValue::Null => serde_json::Value::Null,
        }
    }
}

// ---------------------------------------------------------------------------
// AttributeTable – the complete loaded table
// ---------------------------------------------------------------------------

/// One row: column name → cell.
pub type Row = BTreeMap<String, AttributeValue>;

/// A loaded attribute table with its column order.
#[derive(Debug, Clone, Default)]
pub struct AttributeTable {
    /// Column names in source order.
    pub column_names: Vec<String>,
    pub rows: Vec<Row>,
}

impl AttributeTable {
    /// Build a table from rows whose keys may differ (JSON records).
    /// Columns are the sorted union of all keys.
    pub fn from_rows(rows: Vec<Row>) -> Self {
        let mut column_names_set: BTreeSet<String> = BTreeSet::new();
        for row in &rows {
            column_names_set.extend(row.keys().cloned());
        }
        AttributeTable {
            column_names: column_names_set.into_iter().collect(),
            rows,
        }
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_names.iter().any(|c| c == name)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Records flowing from the extractor to the chart
// ---------------------------------------------------------------------------

/// A (key, value) pair as read from the table; either side may be absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub key: Option<String>,
    pub value: Option<String>,
}

impl RawRecord {
    pub fn new(key: Option<&str>, value: Option<&str>) -> Self {
        RawRecord {
            key: key.map(str::to_string),
            value: value.map(str::to_string),
        }
    }
}

/// A label with a successfully parsed value.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanRecord {
    pub label: String,
    pub value: f64,
}

/// The ordered prefix of clean records that is actually charted.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sample {
    records: Vec<CleanRecord>,
}

impl Sample {
    /// Keep the first [`SAMPLE_CAP`] records in encounter order.
    pub fn from_records(mut records: Vec<CleanRecord>) -> Self {
        records.truncate(SAMPLE_CAP);
        Sample { records }
    }

    pub fn records(&self) -> &[CleanRecord] {
        &self.records
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.label.as_str())
    }

    pub fn values(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.value).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
