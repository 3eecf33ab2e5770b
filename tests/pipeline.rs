use std::path::{Path, PathBuf};

use joinplot::color::{viridis_midpoint, SINGLE_COLOR};
use joinplot::data::extract::{ExtractOptions, FieldPair};
use joinplot::data::loader::TableFile;
use joinplot::{plot_rows, run, ChartSpec, Error, JobConfig, MessageLog, RunOutcome, Severity, StyleMode};
use tempfile::TempDir;

const LAYER: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {"type": "Feature", "properties": {"id": "a"},
     "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,1],[0,0]]]}},
    {"type": "Feature", "properties": {"id": "b"},
     "geometry": {"type": "Polygon", "coordinates": [[[1,0],[2,0],[2,1],[1,1],[1,0]]]}},
    {"type": "Feature", "properties": {"id": "zz"},
     "geometry": {"type": "Polygon", "coordinates": [[[2,0],[3,0],[3,1],[2,1],[2,0]]]}}
  ]
}"#;

fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

fn config(dir: &TempDir, table: &Path, style: &str) -> JobConfig {
    let mut config = JobConfig::new(
        table,
        dir.path().join("workspace"),
        "id",
        "value",
        dir.path().join("chart.png"),
    );
    config.style = style.to_string();
    config
}

fn pixel_count(path: &Path, color: palette::Srgb<u8>) -> usize {
    image::open(path)
        .unwrap()
        .to_rgb8()
        .pixels()
        .filter(|p| p.0 == [color.red, color.green, color.blue])
        .count()
}

#[test]
fn mixed_rows_render_two_bars_with_one_warning() {
    let dir = tempfile::tempdir().unwrap();
    let table = write(&dir, "data.csv", "id,value\na,10\nb,20%\nc,bad\n,5\nd,\n");
    let config = config(&dir, &table, "Single symbol");

    let mut log = MessageLog::new();
    let outcome = run(&config, &mut log).unwrap();

    assert_eq!(
        outcome,
        RunOutcome::Rendered {
            path: config.output.clone(),
            bars: 2
        }
    );
    assert_eq!(
        log.messages(Severity::Warning),
        vec!["Skipping value 'bad' - unable to convert to float."]
    );
    assert_eq!(log.count(Severity::Error), 0);
    assert!(pixel_count(&config.output, SINGLE_COLOR) > 1000);
}

#[test]
fn twenty_five_rows_chart_the_first_twenty() {
    let dir = tempfile::tempdir().unwrap();
    let mut csv = String::from("id,value\n");
    for i in 1..=25 {
        csv.push_str(&format!("row{i},{i}\n"));
    }
    let table = write(&dir, "data.csv", &csv);
    let config = config(&dir, &table, "Unique values");

    let mut log = MessageLog::new();
    let outcome = run(&config, &mut log).unwrap();
    assert!(matches!(outcome, RunOutcome::Rendered { bars: 20, .. }));
    assert!(log
        .messages(Severity::Info)
        .contains(&"Applying Unique values style (Categorical colors) to plot."));
}

#[test]
fn header_only_table_is_a_successful_no_op() {
    let dir = tempfile::tempdir().unwrap();
    let table = write(&dir, "data.csv", "id,value\n");
    let config = config(&dir, &table, "Single symbol");

    let mut log = MessageLog::new();
    let outcome = run(&config, &mut log).unwrap();

    assert_eq!(outcome, RunOutcome::NoData);
    assert!(!config.output.exists());
    assert_eq!(log.count(Severity::Warning), 1);
    assert!(log.messages(Severity::Warning)[0]
        .to_lowercase()
        .contains("no valid data"));
    assert_eq!(log.count(Severity::Error), 0);
}

#[test]
fn only_bad_rows_also_end_without_rendering() {
    let dir = tempfile::tempdir().unwrap();
    let table = write(&dir, "data.csv", "id,value\na,x\nb,\n");
    let config = config(&dir, &table, "Graduated colors");

    let mut log = MessageLog::new();
    assert_eq!(run(&config, &mut log).unwrap(), RunOutcome::NoData);
    // One for the bad value, one for the empty result.
    assert_eq!(log.count(Severity::Warning), 2);
    assert!(!config.output.exists());
}

#[test]
fn equal_values_under_graduated_share_one_color() {
    let dir = tempfile::tempdir().unwrap();
    let table = write(&dir, "data.csv", "id,value\na,5\nb,5%\nc, 5 \n");
    let config = config(&dir, &table, "Graduated colors");

    let mut log = MessageLog::new();
    let outcome = run(&config, &mut log).unwrap();
    assert!(matches!(outcome, RunOutcome::Rendered { bars: 3, .. }));
    assert!(pixel_count(&config.output, viridis_midpoint()) > 3000);
}

#[test]
fn unreadable_table_aborts_with_one_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(&dir, &dir.path().join("missing.csv"), "Single symbol");

    let mut log = MessageLog::new();
    let outcome = run(&config, &mut log).unwrap();

    assert_eq!(outcome, RunOutcome::Aborted);
    assert_eq!(log.count(Severity::Error), 1);
    assert_eq!(log.count(Severity::Warning), 0);
    assert!(!config.output.exists());
}

#[test]
fn unreadable_table_with_geometry_aborts_before_joining() {
    let dir = tempfile::tempdir().unwrap();
    let layer = write(&dir, "regions.geojson", LAYER);
    let mut config = config(&dir, &dir.path().join("missing.csv"), "Single symbol");
    config.geometry = Some(layer);

    let mut log = MessageLog::new();
    assert_eq!(run(&config, &mut log).unwrap(), RunOutcome::Aborted);
    assert_eq!(log.count(Severity::Error), 1);
    assert_eq!(log.count(Severity::Warning), 0);
    assert!(!config.output.exists());
    assert!(!config.joined_layer_path().unwrap().exists());
}

#[test]
fn missing_numeric_field_aborts() {
    let dir = tempfile::tempdir().unwrap();
    let table = write(&dir, "data.csv", "id,other\na,1\n");
    let config = config(&dir, &table, "Single symbol");

    let mut log = MessageLog::new();
    assert_eq!(run(&config, &mut log).unwrap(), RunOutcome::Aborted);
    assert!(log.messages(Severity::Error)[0].contains("'value'"));
}

#[test]
fn geometry_join_writes_layer_then_chart() {
    let dir = tempfile::tempdir().unwrap();
    let layer = write(&dir, "regions.geojson", LAYER);
    let table = write(&dir, "data.csv", "id,value\na,10\nb,20%\n");
    let mut config = config(&dir, &table, "Graduated colors");
    config.geometry = Some(layer);

    let mut log = MessageLog::new();
    let outcome = run(&config, &mut log).unwrap();
    assert!(matches!(outcome, RunOutcome::Rendered { bars: 2, .. }));

    let joined_path = config.joined_layer_path().unwrap();
    let features = joinplot::join::load_features(&joined_path).unwrap();
    assert_eq!(features.len(), 3);
    assert_eq!(
        features[1].property("value"),
        Some(&serde_json::Value::from("20%"))
    );
    assert_eq!(features[2].property("value"), Some(&serde_json::Value::Null));

    let info = log.messages(Severity::Info);
    assert_eq!(info[0], "Converting GeoJSON to features...");
    assert!(info.contains(&"Joined 2 of 3 features on 'id'."));
    assert!(info.contains(&"Display option selected: Graduated colors"));
    assert!(info
        .last()
        .unwrap()
        .starts_with("Graph saved to: "));
}

#[test]
fn existing_output_is_replaced_by_default() {
    let dir = tempfile::tempdir().unwrap();
    let table = write(&dir, "data.csv", "id,value\na,1\n");
    let config = config(&dir, &table, "Single symbol");
    std::fs::write(&config.output, b"stale").unwrap();

    run(&config, &mut MessageLog::new()).unwrap();
    assert!(image::open(&config.output).is_ok());
}

#[test]
fn existing_output_is_kept_when_overwrite_is_off() {
    let dir = tempfile::tempdir().unwrap();
    let table = write(&dir, "data.csv", "id,value\na,1\n");
    let mut config = config(&dir, &table, "Single symbol");
    config.overwrite = false;
    std::fs::write(&config.output, b"stale").unwrap();

    let err = run(&config, &mut MessageLog::new()).unwrap_err();
    assert!(matches!(err, Error::OutputExists(_)));
    assert_eq!(std::fs::read(&config.output).unwrap(), b"stale");
}

#[test]
fn unknown_style_token_renders_single_color() {
    let dir = tempfile::tempdir().unwrap();
    let table = write(&dir, "data.csv", "id,value\na,1\nb,9\n");
    let config = config(&dir, &table, "Heat map");

    let mut log = MessageLog::new();
    run(&config, &mut log).unwrap();
    assert!(log
        .messages(Severity::Info)
        .contains(&"Applying Single symbol style to plot."));
    assert!(pixel_count(&config.output, SINGLE_COLOR) > 1000);
}

#[test]
fn json_tables_plot_like_csv() {
    let dir = tempfile::tempdir().unwrap();
    let table = write(
        &dir,
        "data.json",
        r#"[{"id": "a", "value": "10%"}, {"id": "b", "value": 3.5}, {"id": null, "value": 1}]"#,
    );
    let output = dir.path().join("json.png");

    let mut log = MessageLog::new();
    let outcome = plot_rows(
        &TableFile::new(&table),
        &FieldPair::new("id", "value"),
        &ChartSpec::new(StyleMode::Single, "id", "value"),
        &output,
        ExtractOptions::default(),
        &mut log,
    )
    .unwrap();
    assert_eq!(outcome, RunOutcome::Rendered { path: output, bars: 2 });
    assert_eq!(log.count(Severity::Warning), 0);
}
