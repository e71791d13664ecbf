//! Ground weather-station CSV loading.
//!
//! Raw files are semicolon-delimited latin-1 exports with eleven
//! preamble lines, a literal `null` sentinel, and seventeen positional
//! columns. One file per station, named `dados_{CODE}_*.csv`.

use crate::error::{PipelineError, Result};
use crate::loader::{LoadStats, canonicalize, log_null_ratios, timestamp::ground_timestamp_ms};
use crate::models::Station;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Positional names for the seventeen raw columns.
const RAW_COLUMNS: [&str; 17] = [
    "date",
    "hour",
    "precipitation",
    "pressure",
    "pressure_max",
    "pressure_min",
    "global_radiation",
    "air_temp",
    "temp_max",
    "temp_min",
    "humidity_max",
    "humidity_min",
    "rel_humidity",
    "wind_dir",
    "wind_gust",
    "wind_speed",
    "discard",
];

/// Measurements surviving into the canonical series.
const MEASUREMENT_COLUMNS: [&str; 6] = [
    "air_temp",
    "rel_humidity",
    "pressure",
    "wind_speed",
    "wind_dir",
    "precipitation",
];

/// Canonical ground schema, in column order.
pub const FINAL_COLUMNS: [&str; 10] = [
    "timestamp",
    "station_id",
    "latitude",
    "longitude",
    "air_temp",
    "rel_humidity",
    "pressure",
    "wind_speed",
    "wind_dir",
    "precipitation",
];

const PREAMBLE_LINES: usize = 11;

/// Load one station's ground file into its canonical hourly series.
pub fn load_station(ground_dir: &Path, station: &Station) -> Result<(DataFrame, LoadStats)> {
    let path = station_file(ground_dir, &station.id)?;
    debug!("Loading ground file {}", path.display());

    let mut df = read_raw(&path)?;
    log_null_ratios(&station.id, &df);

    let dates = string_values(&df, "date")?;
    let hours = string_values(&df, "hour")?;
    let ts_ms: Vec<Option<i64>> = dates
        .iter()
        .zip(hours.iter())
        .map(|(date, hour)| match (date, hour) {
            (Some(date), Some(hour)) => ground_timestamp_ms(date, hour),
            _ => None,
        })
        .collect();

    df = df
        .lazy()
        .with_columns(
            MEASUREMENT_COLUMNS
                .iter()
                .map(|c| col(*c).cast(DataType::Float64))
                .collect::<Vec<_>>(),
        )
        .collect()?;

    canonicalize(df, &ts_ms, station, &FINAL_COLUMNS)
}

/// Resolve the station's raw file by its naming convention.
fn station_file(ground_dir: &Path, station_id: &str) -> Result<PathBuf> {
    let pattern = ground_dir.join(format!("dados_{station_id}_*.csv"));
    let mut matches: Vec<PathBuf> = glob::glob(&pattern.to_string_lossy())
        .map_err(|e| PipelineError::configuration_mismatch(format!("bad glob pattern: {e}")))?
        .filter_map(std::result::Result::ok)
        .collect();
    matches.sort();
    matches
        .into_iter()
        .next()
        .ok_or_else(|| PipelineError::source_unavailable(pattern))
}

fn read_raw(path: &Path) -> Result<DataFrame> {
    let parse_options = CsvParseOptions::default()
        .with_separator(b';')
        .with_encoding(CsvEncoding::LossyUtf8)
        .with_null_values(Some(NullValues::AllColumnsSingle("null".into())));
    let mut df = CsvReadOptions::default()
        .with_has_header(false)
        .with_skip_rows(PREAMBLE_LINES)
        .with_parse_options(parse_options)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    if df.width() != RAW_COLUMNS.len() {
        return Err(PipelineError::invalid_format(
            path,
            format!("expected {} columns, found {}", RAW_COLUMNS.len(), df.width()),
        ));
    }
    df.set_column_names(RAW_COLUMNS)?;
    Ok(df)
}

fn string_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let series = df
        .column(name)?
        .as_materialized_series()
        .cast(&DataType::String)?;
    Ok(series
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}
