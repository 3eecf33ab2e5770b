//! GeoJSON features and the attribute join.
//!
//! Features are read with the `geojson` crate and joined to an attribute
//! table on a shared key. The join keeps every feature: matched features
//! gain the table's columns, unmatched ones gain the same columns as nulls.

use std::collections::{BTreeSet, HashMap};
use std::io::Write;
use std::path::Path;

use geojson::{Feature, FeatureCollection, GeoJson};
use serde_json::Value as JsonValue;

use crate::data::loader::json_to_attribute;
use crate::data::model::AttributeTable;
use crate::error::{Error, Result, SourceError};

/// Counts reported after a join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinSummary {
    pub features: usize,
    pub matched: usize,
}

/// Read a GeoJSON file into a flat list of features.
///
/// A bare geometry becomes one feature without properties.
pub fn load_features(path: &Path) -> Result<Vec<Feature>> {
    let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let features = match text.parse::<GeoJson>()? {
        GeoJson::FeatureCollection(collection) => collection.features,
        GeoJson::Feature(feature) => vec![feature],
        GeoJson::Geometry(geometry) => vec![Feature::from(geometry)],
    };
    Ok(features)
}

/// Text form of a feature's key property, comparable with table keys.
fn key_text(value: &JsonValue) -> Option<String> {
    json_to_attribute(value).as_text()
}

/// Join `table` onto `features` by `join_field`.
///
/// The first table row with a given key wins. A table column whose name
/// is already a feature property is written as `<table_name>_<column>`.
pub fn join_attributes(
    features: &mut [Feature],
    table: &AttributeTable,
    join_field: &str,
    table_name: &str,
) -> std::result::Result<JoinSummary, SourceError> {
    if !table.has_column(join_field) {
        return Err(SourceError::MissingField(join_field.to_string()));
    }

    let mut index: HashMap<String, usize> = HashMap::new();
    for (i, row) in table.rows.iter().enumerate() {
        if let Some(key) = row.get(join_field).and_then(|v| v.as_text()) {
            index.entry(key).or_insert(i);
        }
    }

    let existing: BTreeSet<String> = features
        .iter()
        .filter_map(|f| f.properties.as_ref())
        .flat_map(|props| props.keys().cloned())
        .collect();
    let targets: Vec<(&str, String)> = table
        .column_names
        .iter()
        .filter(|c| c.as_str() != join_field)
        .map(|c| {
            let target = if existing.contains(c) {
                format!("{table_name}_{c}")
            } else {
                c.clone()
            };
            (c.as_str(), target)
        })
        .collect();

    let mut matched = 0;
    for feature in features.iter_mut() {
        let row = feature
            .property(join_field)
            .and_then(key_text)
            .and_then(|key| index.get(&key))
            .map(|&i| &table.rows[i]);
        if row.is_some() {
            matched += 1;
        }
        for (column, target) in &targets {
            let value = row
                .and_then(|r| r.get(*column))
                .map(JsonValue::from)
                .unwrap_or(JsonValue::Null);
            feature.set_property(target.clone(), value);
        }
    }

    Ok(JoinSummary {
        features: features.len(),
        matched,
    })
}

/// Write features as a FeatureCollection, replacing `path` atomically.
pub fn write_features(features: Vec<Feature>, path: &Path) -> Result<()> {
    let io_err = |source| Error::Io {
        path: path.to_path_buf(),
        source,
    };
    let collection: FeatureCollection = features.into_iter().collect();
    let text = GeoJson::from(collection).to_string();

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(text.as_bytes()).map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}
