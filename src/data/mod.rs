/// Data layer: table model, loading, and numeric extraction.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  RowSource → lazy (key, value) rows
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ extract   │  strip '%', parse, skip bad rows → Vec<CleanRecord>
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Sample   │  first 20 records, encounter order
///   └──────────┘
/// ```

pub mod extract;
pub mod loader;
pub mod model;
