use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::chart::{render_png, BarPlan, ChartSpec};
use crate::color::StyleMode;
use crate::data::extract::{extract_records, ExtractOptions, FieldPair};
use crate::data::loader::{load_table, RowSource, TableFile};
use crate::data::model::Sample;
use crate::diagnostics::Diagnostics;
use crate::error::{Error, Result};
use crate::join::{join_attributes, load_features, write_features};

// ---------------------------------------------------------------------------
// Job configuration
// ---------------------------------------------------------------------------

/// Everything one run needs. Nothing is read from ambient state.
#[derive(Debug, Clone, PartialEq)]
pub struct JobConfig {
    /// Attribute table (`.csv`, `.json` or `.parquet`).
    pub table: PathBuf,
    /// Optional GeoJSON layer to join the table onto.
    pub geometry: Option<PathBuf>,
    /// Directory receiving the joined layer.
    pub workspace: PathBuf,
    pub join_field: String,
    pub numeric_field: String,
    /// Display option token, e.g. `"Graduated colors"`.
    pub style: String,
    /// PNG chart path.
    pub output: PathBuf,
    pub title: Option<String>,
    /// Replace existing outputs instead of failing.
    pub overwrite: bool,
    pub scan_timeout: Option<Duration>,
}

impl JobConfig {
    pub fn new(
        table: impl Into<PathBuf>,
        workspace: impl Into<PathBuf>,
        join_field: impl Into<String>,
        numeric_field: impl Into<String>,
        output: impl Into<PathBuf>,
    ) -> Self {
        JobConfig {
            table: table.into(),
            geometry: None,
            workspace: workspace.into(),
            join_field: join_field.into(),
            numeric_field: numeric_field.into(),
            style: StyleMode::SINGLE_TOKEN.to_string(),
            output: output.into(),
            title: None,
            overwrite: true,
            scan_timeout: None,
        }
    }

    pub fn style_mode(&self) -> StyleMode {
        StyleMode::from_token(&self.style)
    }

    /// Where the joined layer is written, when a geometry input is set.
    pub fn joined_layer_path(&self) -> Option<PathBuf> {
        let geometry = self.geometry.as_ref()?;
        Some(
            self.workspace
                .join(format!("{}_joined.geojson", file_stem(geometry))),
        )
    }

    /// Axis text and title; the title defaults to `"<field> Distribution (<style>)"`.
    pub fn chart_spec(&self) -> ChartSpec {
        let title = self
            .title
            .clone()
            .unwrap_or_else(|| format!("{} Distribution ({})", self.numeric_field, self.style));
        ChartSpec::new(self.style_mode(), &self.join_field, &self.numeric_field).with_title(title)
    }

    fn fields(&self) -> FieldPair {
        FieldPair::new(&self.join_field, &self.numeric_field)
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "layer".to_string())
}

// ---------------------------------------------------------------------------
// Running
// ---------------------------------------------------------------------------

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Chart written with this many bars.
    Rendered { path: PathBuf, bars: usize },
    /// Nothing parsed; no image was written. Not a failure.
    NoData,
    /// The attribute table could not be read; reported as an error diagnostic.
    Aborted,
}

/// Join (when a geometry is configured), extract and chart.
pub fn run<D: Diagnostics>(config: &JobConfig, diag: &mut D) -> Result<RunOutcome> {
    let outputs = std::iter::once(config.output.clone()).chain(config.joined_layer_path());
    for path in outputs {
        if !config.overwrite && path.exists() {
            diag.error(format!("Output {} already exists.", path.display()));
            return Err(Error::OutputExists(path));
        }
    }

    std::fs::create_dir_all(&config.workspace).map_err(|source| Error::Io {
        path: config.workspace.clone(),
        source,
    })?;

    if let (Some(geometry), Some(layer_path)) = (&config.geometry, config.joined_layer_path()) {
        diag.info("Converting GeoJSON to features...");
        let mut features = match load_features(geometry) {
            Ok(features) => features,
            Err(e) => {
                diag.error(format!("Error converting GeoJSON: {e}"));
                return Err(e);
            }
        };

        diag.info("Copying attribute table...");
        let joined = load_table(&config.table).and_then(|table| {
            join_attributes(&mut features, &table, &config.join_field, &file_stem(&config.table))
        });
        let summary = match joined {
            Ok(summary) => summary,
            Err(e) => {
                diag.error(format!("Error reading attribute table: {e}"));
                return Ok(RunOutcome::Aborted);
            }
        };
        diag.info(format!(
            "Joined {} of {} features on '{}'.",
            summary.matched, summary.features, config.join_field
        ));

        if let Err(e) = write_features(features, &layer_path) {
            diag.error(format!("Error writing joined layer: {e}"));
            return Err(e);
        }
        diag.info(format!("Joined layer saved to: {}", layer_path.display()));
    }

    diag.info(format!("Display option selected: {}", config.style));

    let options = ExtractOptions {
        deadline: config.scan_timeout,
    };
    plot_rows(
        &TableFile::new(&config.table),
        &config.fields(),
        &config.chart_spec(),
        &config.output,
        options,
        diag,
    )
}

/// Extract `fields` from `source` and chart them at `output`.
///
/// For callers that already own a joined table.
pub fn plot_rows<S, D>(
    source: &S,
    fields: &FieldPair,
    spec: &ChartSpec,
    output: &Path,
    options: ExtractOptions,
    diag: &mut D,
) -> Result<RunOutcome>
where
    S: RowSource + ?Sized,
    D: Diagnostics,
{
    diag.info(format!(
        "Reading data from {} for plotting...",
        source.describe()
    ));
    let Ok(extraction) = extract_records(source, fields, options, diag) else {
        return Ok(RunOutcome::Aborted);
    };

    if extraction.records.is_empty() {
        diag.warning("No valid data found for plotting. Nothing was rendered.");
        return Ok(RunOutcome::NoData);
    }

    let sample = Sample::from_records(extraction.records);
    diag.info(spec.style.narration());
    let plan = BarPlan::build(&sample, spec);

    if let Err(e) = render_png(&plan, output) {
        diag.error(format!("Error rendering chart: {e}"));
        return Err(e.into());
    }
    diag.info(format!("Graph saved to: {}", output.display()));

    Ok(RunOutcome::Rendered {
        path: output.to_path_buf(),
        bars: plan.bars.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_title_names_field_and_style() {
        let mut config = JobConfig::new("t.csv", "ws", "region_id", "share", "out.png");
        config.style = "Graduated colors".into();
        let spec = config.chart_spec();
        assert_eq!(spec.style, StyleMode::Graduated);
        assert_eq!(spec.x_label, "region_id");
        assert_eq!(spec.y_label, "share");
        assert_eq!(spec.title.as_deref(), Some("share Distribution (Graduated colors)"));
    }

    #[test]
    fn explicit_title_wins() {
        let mut config = JobConfig::new("t.csv", "ws", "id", "v", "out.png");
        config.title = Some("Custom".into());
        assert_eq!(config.chart_spec().title.as_deref(), Some("Custom"));
    }

    #[test]
    fn unknown_style_token_is_single() {
        let mut config = JobConfig::new("t.csv", "ws", "id", "v", "out.png");
        config.style = "Proportional symbols".into();
        assert_eq!(config.style_mode(), StyleMode::Single);
    }

    #[test]
    fn joined_layer_lives_in_workspace() {
        let mut config = JobConfig::new("t.csv", "ws", "id", "v", "out.png");
        assert_eq!(config.joined_layer_path(), None);
        config.geometry = Some(PathBuf::from("data/regions.geojson"));
        assert_eq!(
            config.joined_layer_path(),
            Some(PathBuf::from("ws").join("regions_joined.geojson"))
        );
    }
}
