//! Satellite-derived irradiance CSV loading.
//!
//! Each station has a lowercase subdirectory holding one CSV per year,
//! with two metadata lines before the header. Time arrives as integer
//! Year/Month/Day/Hour/Minute columns; measurements carry the
//! provider's display names.

use crate::error::{PipelineError, Result};
use crate::loader::{LoadStats, canonicalize, log_null_ratios, timestamp::satellite_timestamp_ms};
use crate::models::Station;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Provider header name to canonical column name.
const RENAME_MAP: [(&str, &str); 8] = [
    ("GHI", "ghi"),
    ("DNI", "dni"),
    ("DHI", "dhi"),
    ("Temperature", "air_temp_sat"),
    ("Relative Humidity", "rel_humidity_sat"),
    ("Wind Speed", "wind_speed_sat"),
    ("Cloud Type", "cloud_type"),
    ("Pressure", "pressure_sat"),
];

const TIME_COLUMNS: [&str; 5] = ["Year", "Month", "Day", "Hour", "Minute"];

/// Canonical satellite schema, in column order.
pub const FINAL_COLUMNS: [&str; 12] = [
    "timestamp",
    "station_id",
    "latitude",
    "longitude",
    "ghi",
    "dni",
    "dhi",
    "air_temp_sat",
    "rel_humidity_sat",
    "wind_speed_sat",
    "cloud_type",
    "pressure_sat",
];

const METADATA_LINES: usize = 2;

/// Load one station's yearly satellite files into its canonical
/// hourly series. A year file that fails to read is skipped with a
/// warning; a station with no readable files is unavailable.
pub fn load_station(satellite_dir: &Path, station: &Station) -> Result<(DataFrame, LoadStats)> {
    let station_dir = satellite_dir.join(station.id.to_lowercase());
    if !station_dir.is_dir() {
        return Err(PipelineError::source_unavailable(station_dir));
    }

    let mut frames: Vec<DataFrame> = Vec::new();
    let mut ts_ms: Vec<Option<i64>> = Vec::new();
    for path in year_files(&station_dir)? {
        debug!("Loading satellite file {}", path.display());
        let raw = match read_year(&path) {
            Ok(df) => df,
            Err(e) => {
                warn!("Skipping unreadable satellite file {}: {e}", path.display());
                continue;
            }
        };
        match year_timestamps(&raw, &path) {
            Ok(ts) => ts_ms.extend(ts),
            Err(e) => {
                warn!("Skipping satellite file {}: {e}", path.display());
                continue;
            }
        }
        frames.push(normalize_year(raw, &path)?);
    }

    if frames.is_empty() {
        return Err(PipelineError::source_unavailable(station_dir));
    }

    let mut df = frames.remove(0);
    for frame in frames {
        df.vstack_mut(&frame)?;
    }
    log_null_ratios(&station.id, &df);

    canonicalize(df, &ts_ms, station, &FINAL_COLUMNS)
}

/// Year CSVs in sorted filename order.
fn year_files(station_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(station_dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "csv"))
        .collect();
    files.sort();
    Ok(files)
}

fn read_year(path: &Path) -> Result<DataFrame> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_skip_rows(METADATA_LINES)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;
    Ok(df)
}

/// Compose epoch-millisecond timestamps from the integer time columns.
fn year_timestamps(df: &DataFrame, path: &Path) -> Result<Vec<Option<i64>>> {
    let mut parts: Vec<Vec<Option<i64>>> = Vec::with_capacity(TIME_COLUMNS.len());
    for name in TIME_COLUMNS {
        let column = df.column(name).map_err(|_| {
            PipelineError::invalid_format(path, format!("missing time column '{name}'"))
        })?;
        let values: Vec<Option<i64>> = column
            .as_materialized_series()
            .cast(&DataType::Int64)?
            .i64()?
            .into_iter()
            .collect();
        parts.push(values);
    }

    Ok((0..df.height())
        .map(|i| {
            match (parts[0][i], parts[1][i], parts[2][i], parts[3][i], parts[4][i]) {
                (Some(y), Some(mo), Some(d), Some(h), Some(mi)) => {
                    satellite_timestamp_ms(y, mo, d, h, mi)
                }
                _ => None,
            }
        })
        .collect())
}

/// Rename the provider's headers to canonical names and cast every
/// measurement to Float64. A missing measurement column is filled with
/// nulls so the yearly frames stack.
fn normalize_year(df: DataFrame, path: &Path) -> Result<DataFrame> {
    let present: Vec<String> = df
        .get_column_names_str()
        .into_iter()
        .map(str::to_string)
        .collect();

    let mut exprs = Vec::with_capacity(RENAME_MAP.len());
    for (raw, canon) in RENAME_MAP {
        if present.iter().any(|name| name == raw) {
            exprs.push(col(raw).cast(DataType::Float64).alias(canon));
        } else {
            warn!(
                "Column '{raw}' missing from {}; filling with nulls",
                path.display()
            );
            exprs.push(lit(NULL).cast(DataType::Float64).alias(canon));
        }
    }
    let df = df.lazy().select(exprs).collect()?;
    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use tempfile::TempDir;

    const HEADER: &str =
        "Year,Month,Day,Hour,Minute,GHI,DNI,DHI,Temperature,Relative Humidity,Wind Speed,Cloud Type,Pressure";

    fn write_year(dir: &Path, name: &str, rows: &[&str]) {
        let mut file = std::fs::File::create(dir.join(name)).unwrap();
        writeln!(file, "Source,Location ID,Latitude").unwrap();
        writeln!(file, "NSRDB,123456,-5.84").unwrap();
        writeln!(file, "{HEADER}").unwrap();
        for row in rows {
            writeln!(file, "{row}").unwrap();
        }
    }

    fn station() -> Station {
        Station::new("A304", -5.837222, -35.208056)
    }

    #[test]
    fn test_load_station_across_years() {
        let dir = TempDir::new().unwrap();
        let station_dir = dir.path().join("a304");
        std::fs::create_dir(&station_dir).unwrap();
        write_year(
            &station_dir,
            "2023.csv",
            &["2023,6,15,12,0,500,700,100,27.5,70,3.2,4,1010"],
        );
        write_year(
            &station_dir,
            "2022.csv",
            &["2022,6,15,12,0,480,690,95,26.8,72,3.0,1,1011"],
        );

        let (df, stats) = load_station(dir.path(), &station()).unwrap();
        assert_eq!(stats.rows_read, 2);
        assert_eq!(df.height(), 2);
        assert_eq!(df.get_column_names_str(), FINAL_COLUMNS.to_vec());

        // 2022 sorts before 2023 regardless of file read order.
        let ghi: Vec<f64> = df
            .column("ghi")
            .unwrap()
            .f64()
            .unwrap()
            .into_no_null_iter()
            .collect();
        assert_eq!(ghi, vec![480.0, 500.0]);
    }

    #[test]
    fn test_missing_station_dir_is_source_unavailable() {
        let dir = TempDir::new().unwrap();
        let err = load_station(dir.path(), &station()).unwrap_err();
        assert!(matches!(err, PipelineError::SourceUnavailable { .. }));
    }
}
