//! Configuration for the fusion pipeline.
//!
//! Provides the immutable `PipelineConfig` structure holding station
//! definitions, correction thresholds, feature settings and split
//! boundaries. Stages receive a reference and never mutate it.

use crate::models::Station;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Daylight window and plausibility threshold for the satellite
/// anomaly pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyConfig {
    /// First local hour (inclusive) treated as daylight.
    pub daylight_start_hour: u32,

    /// Last local hour (inclusive) treated as daylight.
    pub daylight_end_hour: u32,

    /// GHI values below this during daylight flag the whole
    /// irradiance triple as anomalous.
    pub ghi_threshold: f64,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            daylight_start_hour: 7,
            daylight_end_hour: 17,
            ghi_threshold: 10.0,
        }
    }
}

/// Lag and rolling-window settings for feature synthesis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Columns to lag, each with its list of hour offsets.
    pub lag_hours: Vec<(String, Vec<i64>)>,

    /// Columns receiving rolling mean/std over preceding values.
    pub rolling_columns: Vec<String>,

    /// Rolling window length in rows. The current row is excluded,
    /// so a window of 3 averages the three previous observations.
    pub rolling_window: usize,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            lag_hours: vec![
                ("ghi".to_string(), vec![1, 2, 3, 24]),
                ("dni".to_string(), vec![1, 2, 3, 24]),
                ("air_temp".to_string(), vec![1, 24]),
            ],
            rolling_columns: vec![
                "ghi".to_string(),
                "dni".to_string(),
                "air_temp".to_string(),
            ],
            rolling_window: 3,
        }
    }
}

/// Chronological partition boundaries for the dataset split.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Rows before this date form the training partition.
    pub validation_start: NaiveDate,

    /// Rows at/after this date form the test partition.
    pub test_start: NaiveDate,

    /// Rows at/after this date are discarded before splitting.
    pub coverage_cutoff: NaiveDate,

    /// Target columns separated into the `y_*` tables.
    pub target_columns: Vec<String>,

    /// Columns withheld from the feature tables in addition to
    /// the targets.
    pub withheld_columns: Vec<String>,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            // NaiveDate::from_ymd_opt only fails on out-of-range
            // dates; these literals are valid.
            validation_start: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or(NaiveDate::MIN),
            test_start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or(NaiveDate::MIN),
            coverage_cutoff: NaiveDate::from_ymd_opt(2025, 7, 1).unwrap_or(NaiveDate::MAX),
            target_columns: vec!["ghi".to_string(), "dni".to_string()],
            withheld_columns: vec!["station_id".to_string(), "dhi".to_string()],
        }
    }
}

/// Global configuration for one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Stations contributing to the dataset.
    pub stations: Vec<Station>,

    /// Directory holding raw ground CSV files, one per station.
    pub ground_dir: String,

    /// Directory holding per-station satellite subdirectories.
    pub satellite_dir: String,

    /// Directory where all parquet artifacts are written.
    pub output_dir: String,

    /// Satellite anomaly-correction settings.
    pub anomaly: AnomalyConfig,

    /// Largest gap, in hours, the fuse-stage interpolation will
    /// bridge within one station's series.
    pub max_interpolation_gap_hours: i64,

    /// Feature synthesis settings.
    pub features: FeatureConfig,

    /// Dataset split settings.
    pub split: SplitConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stations: vec![
                Station::new("A304", -5.837222, -35.208056),
                Station::new("A316", -6.467500, -37.085000),
                Station::new("A372", -5.535000, -36.872222),
                Station::new("A340", -5.626677, -37.815000),
            ],
            ground_dir: "data/inmet".to_string(),
            satellite_dir: "data/nsrdb".to_string(),
            output_dir: "output".to_string(),
            anomaly: AnomalyConfig::default(),
            max_interpolation_gap_hours: 6,
            features: FeatureConfig::default(),
            split: SplitConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Replace the station set.
    pub fn with_stations(mut self, stations: Vec<Station>) -> Self {
        self.stations = stations;
        self
    }

    /// Set the ground CSV directory.
    pub fn with_ground_dir(mut self, dir: impl Into<String>) -> Self {
        self.ground_dir = dir.into();
        self
    }

    /// Set the satellite CSV directory.
    pub fn with_satellite_dir(mut self, dir: impl Into<String>) -> Self {
        self.satellite_dir = dir.into();
        self
    }

    /// Set the artifact output directory.
    pub fn with_output_dir(mut self, dir: impl Into<String>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Override the anomaly GHI threshold.
    pub fn with_ghi_threshold(mut self, threshold: f64) -> Self {
        self.anomaly.ghi_threshold = threshold;
        self
    }

    /// Override the daylight window (inclusive hours).
    pub fn with_daylight_window(mut self, start: u32, end: u32) -> Self {
        self.anomaly.daylight_start_hour = start;
        self.anomaly.daylight_end_hour = end;
        self
    }

    /// Override the rolling window length.
    pub fn with_rolling_window(mut self, window: usize) -> Self {
        self.features.rolling_window = window;
        self
    }

    /// Override the interpolation gap bound.
    pub fn with_max_interpolation_gap_hours(mut self, hours: i64) -> Self {
        self.max_interpolation_gap_hours = hours;
        self
    }

    /// Look up a configured station by code.
    pub fn station(&self, id: &str) -> Option<&Station> {
        self.stations.iter().find(|s| s.id == id)
    }
}
