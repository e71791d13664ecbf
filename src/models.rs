//! Core data structures and types for the fusion pipeline.
//!
//! Defines station metadata, source identification and the per-stage
//! statistics objects used for console reporting.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A ground observation point with a fixed code and coordinates.
///
/// The station code doubles as the join key between the ground and
/// satellite sources, so both loaders stamp it onto every record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Station {
    pub fn new(id: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            id: id.into(),
            latitude,
            longitude,
        }
    }
}

/// The two observation sources fused by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceKind {
    /// Hourly ground weather-station observations.
    Ground,
    /// Hourly satellite-derived irradiance and meteorology.
    Satellite,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Ground => write!(f, "ground"),
            SourceKind::Satellite => write!(f, "satellite"),
        }
    }
}

/// Statistics from loading and unifying one source's station files.
#[derive(Debug, Default)]
pub struct UnifyStats {
    pub stations_loaded: usize,
    pub stations_skipped: usize,
    pub rows_total: usize,
    pub rows_dropped_unparsable: usize,
}

/// Statistics from the satellite anomaly-correction pass.
#[derive(Debug, Default)]
pub struct AnomalyStats {
    pub rows_total: usize,
    pub anomalies_nulled: usize,
    pub values_interpolated: usize,
    pub values_unrecoverable: usize,
}

/// Statistics from joining and reconciling the two master series.
#[derive(Debug, Default)]
pub struct FuseStats {
    pub rows_joined: usize,
    pub duplicate_groups_collapsed: usize,
    pub imputed_per_column: Vec<(String, usize, usize)>,
    pub values_interpolated: usize,
    pub rows_dropped_incomplete: usize,
    pub rows_final: usize,
}

/// Statistics from feature synthesis.
#[derive(Debug, Default)]
pub struct FeatureStats {
    pub rows_in: usize,
    pub columns_added: usize,
    pub rows_dropped_incomplete: usize,
    pub rows_final: usize,
}

/// Row counts for the three chronological partitions.
#[derive(Debug, Default)]
pub struct SplitStats {
    pub rows_beyond_cutoff: usize,
    pub train_rows: usize,
    pub validation_rows: usize,
    pub test_rows: usize,
}

impl SplitStats {
    pub fn total(&self) -> usize {
        self.train_rows + self.validation_rows + self.test_rows
    }

    /// Proportion of the retained dataset held by each partition.
    pub fn proportions(&self) -> (f64, f64, f64) {
        let total = self.total();
        if total == 0 {
            return (0.0, 0.0, 0.0);
        }
        let total = total as f64;
        (
            self.train_rows as f64 / total,
            self.validation_rows as f64 / total,
            self.test_rows as f64 / total,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_proportions() {
        let stats = SplitStats {
            rows_beyond_cutoff: 10,
            train_rows: 600,
            validation_rows: 250,
            test_rows: 150,
        };
        let (train, val, test) = stats.proportions();
        assert!((train - 0.6).abs() < 1e-12);
        assert!((val - 0.25).abs() < 1e-12);
        assert!((test - 0.15).abs() < 1e-12);
        assert_eq!(stats.total(), 1000);
    }

    #[test]
    fn test_split_proportions_empty() {
        let stats = SplitStats::default();
        assert_eq!(stats.proportions(), (0.0, 0.0, 0.0));
    }

    #[test]
    fn test_source_kind_display() {
        assert_eq!(SourceKind::Ground.to_string(), "ground");
        assert_eq!(SourceKind::Satellite.to_string(), "satellite");
    }
}
