use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, Value};
use parquet::arrow::ArrowWriter;
use serde::Serialize;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }
}

/// One row of the attribute table as written to CSV.
#[derive(Debug, Serialize)]
struct RegionRow {
    region_id: String,
    name: String,
    /// Percent text such as `"12.5%"`; occasionally blank or not a number.
    share: String,
}

const GRID: (usize, usize) = (6, 4);
const CELL_DEGREES: f64 = 0.5;
const NAMES: [&str; 6] = ["North", "South", "East", "West", "Upper", "Lower"];

fn square(col: usize, row: usize) -> Geometry {
    let x0 = -3.0 + col as f64 * CELL_DEGREES;
    let y0 = 50.0 + row as f64 * CELL_DEGREES;
    let (x1, y1) = (x0 + CELL_DEGREES, y0 + CELL_DEGREES);
    Geometry::new(Value::Polygon(vec![vec![
        vec![x0, y0],
        vec![x1, y0],
        vec![x1, y1],
        vec![x0, y1],
        vec![x0, y0],
    ]]))
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);

    let mut features = Vec::new();
    let mut rows = Vec::new();

    for row in 0..GRID.1 {
        for col in 0..GRID.0 {
            let id = format!("R{:02}", row * GRID.0 + col + 1);

            let mut feature = Feature::from(square(col, row));
            feature.set_property("region_id", id.clone());
            features.push(feature);

            // Roughly one cell in eight is blank or junk.
            let roll = rng.next_f64();
            let share = if roll < 0.06 {
                String::new()
            } else if roll < 0.12 {
                "n/a".to_string()
            } else {
                format!("{:.1}%", rng.next_f64() * 60.0)
            };
            rows.push(RegionRow {
                name: format!("{} {}", NAMES[col], row + 1),
                region_id: id,
                share,
            });
        }
    }

    // GeoJSON layer
    let layer = GeoJson::from(features.into_iter().collect::<FeatureCollection>());
    std::fs::write("sample_regions.geojson", layer.to_string())
        .context("writing sample_regions.geojson")?;

    // CSV table
    let mut writer = csv::Writer::from_path("sample_regions.csv").context("creating CSV")?;
    for r in &rows {
        writer.serialize(r)?;
    }
    writer.flush()?;

    // Parquet table: share as a plain number, blanks as nulls
    let schema = Arc::new(Schema::new(vec![
        Field::new("region_id", DataType::Utf8, false),
        Field::new("name", DataType::Utf8, false),
        Field::new("share", DataType::Float64, true),
    ]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.region_id.as_str()))),
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.name.as_str()))),
            Arc::new(Float64Array::from(
                rows.iter()
                    .map(|r| r.share.trim_end_matches('%').parse::<f64>().ok())
                    .collect::<Vec<_>>(),
            )),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create("sample_regions.parquet").context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;

    println!(
        "Wrote {} regions to sample_regions.{{geojson,csv,parquet}}",
        rows.len()
    );
    Ok(())
}
