//! Source unification.
//!
//! Concatenates every configured station's canonical series for one
//! source into that source's master series, ordered by (timestamp,
//! station_id). Stations whose data cannot be found are skipped with a
//! warning; producing no rows at all is a hard failure.

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::loader::{ground, satellite};
use crate::models::{SourceKind, UnifyStats};
use indicatif::{ProgressBar, ProgressStyle};
use polars::prelude::*;
use std::path::Path;
use tracing::{info, warn};

/// Build one source's master series across all configured stations.
pub fn build_master(config: &PipelineConfig, source: SourceKind) -> Result<(DataFrame, UnifyStats)> {
    let mut stats = UnifyStats::default();
    let mut master: Option<DataFrame> = None;

    let bar = ProgressBar::new(config.stations.len() as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        bar.set_style(style.progress_chars("#>-"));
    }
    for station in &config.stations {
        bar.set_message(station.id.clone());
        let loaded = match source {
            SourceKind::Ground => ground::load_station(Path::new(&config.ground_dir), station),
            SourceKind::Satellite => {
                satellite::load_station(Path::new(&config.satellite_dir), station)
            }
        };
        match loaded {
            Ok((frame, load)) => {
                stats.rows_total += frame.height();
                stats.rows_dropped_unparsable += load.rows_dropped_unparsable;
                if frame.height() == 0 {
                    warn!("Station {} has no usable {source} rows; skipping", station.id);
                    stats.stations_skipped += 1;
                } else {
                    stats.stations_loaded += 1;
                    match master.as_mut() {
                        Some(acc) => {
                            acc.vstack_mut(&frame)?;
                        }
                        None => master = Some(frame),
                    }
                }
            }
            Err(PipelineError::SourceUnavailable { path }) => {
                warn!(
                    "No {source} data for configured station {} at {}; skipping",
                    station.id,
                    path.display()
                );
                stats.stations_skipped += 1;
            }
            Err(e) => return Err(e),
        }
        bar.inc(1);
    }
    bar.finish_and_clear();

    let master = master.ok_or_else(|| PipelineError::empty_result(format!("unify-{source}")))?;

    // Stable sort keeps each station's internal order; duplicate
    // timestamps across stations are expected and preserved.
    let master = master
        .lazy()
        .sort(
            ["timestamp", "station_id"],
            SortMultipleOptions::default().with_maintain_order(true),
        )
        .collect()?;

    info!(
        "Unified {} {source} rows from {} stations ({} skipped)",
        master.height(),
        stats.stations_loaded,
        stats.stations_skipped
    );
    Ok((master, stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Station;
    use std::io::Write as _;
    use tempfile::TempDir;

    fn write_ground_fixture(dir: &Path, station_id: &str, rows: &[&str]) {
        let path = dir.join(format!("dados_{station_id}_H_2018-01-01_2025-06-30.csv"));
        let mut file = std::fs::File::create(path).unwrap();
        for _ in 0..11 {
            writeln!(file, "Metadado: valor").unwrap();
        }
        for row in rows {
            writeln!(file, "{row}").unwrap();
        }
    }

    fn config(dir: &Path) -> PipelineConfig {
        PipelineConfig::default()
            .with_stations(vec![
                Station::new("A304", -5.837222, -35.208056),
                Station::new("A316", -6.467500, -37.085000),
            ])
            .with_ground_dir(dir.to_string_lossy())
    }

    #[test]
    fn test_master_ordered_by_timestamp_then_station() {
        let dir = TempDir::new().unwrap();
        write_ground_fixture(
            dir.path(),
            "A304",
            &["2023-06-15;1300;0;1010;1011;1009;2100;26.1;27;25;80;70;74;120;4;2.2;"],
        );
        write_ground_fixture(
            dir.path(),
            "A316",
            &[
                "2023-06-15;1300;0;1008;1009;1007;2400;29.0;30;28;60;50;55;100;5;3.0;",
                "2023-06-15;1200;0;1008;1009;1007;2600;28.1;29;27;62;52;57;98;5;2.9;",
            ],
        );

        let (master, stats) = build_master(&config(dir.path()), SourceKind::Ground).unwrap();
        assert_eq!(stats.stations_loaded, 2);
        assert_eq!(stats.stations_skipped, 0);
        assert_eq!(master.height(), 3);

        let ids: Vec<&str> = master
            .column("station_id")
            .unwrap()
            .str()
            .unwrap()
            .into_no_null_iter()
            .collect();
        // 12:00 A316, then the two 13:00 rows ordered by station code.
        assert_eq!(ids, vec!["A316", "A304", "A316"]);
    }

    #[test]
    fn test_missing_station_skipped() {
        let dir = TempDir::new().unwrap();
        write_ground_fixture(
            dir.path(),
            "A304",
            &["2023-06-15;1200;0;1010;1011;1009;2500;25.4;26;25;82;71;75;118;4;2.1;"],
        );

        let (master, stats) = build_master(&config(dir.path()), SourceKind::Ground).unwrap();
        assert_eq!(stats.stations_loaded, 1);
        assert_eq!(stats.stations_skipped, 1);
        assert_eq!(master.height(), 1);
    }

    #[test]
    fn test_no_stations_at_all_is_empty_result() {
        let dir = TempDir::new().unwrap();
        let err = build_master(&config(dir.path()), SourceKind::Ground).unwrap_err();
        assert!(matches!(err, PipelineError::EmptyResult { .. }));
    }
}
