//! Satellite anomaly correction.
//!
//! Satellite retrievals occasionally report near-zero irradiance in
//! the middle of the day, usually a retrieval dropout rather than
//! weather. Any daylight row whose GHI falls below the plausibility
//! threshold has its whole irradiance triple nulled, then each
//! station's series is reconstructed by time-weighted interpolation.
//! Edge values that cannot anchor on both sides stay null.

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::interpolate::{FillOptions, fill_station_frame};
use crate::models::AnomalyStats;
use polars::prelude::*;
use tracing::info;

const IRRADIANCE_COLUMNS: [&str; 3] = ["ghi", "dni", "dhi"];

/// Correct daytime irradiance dropouts in the satellite master.
pub fn correct(df: DataFrame, config: &PipelineConfig) -> Result<(DataFrame, AnomalyStats)> {
    let mut stats = AnomalyStats {
        rows_total: df.height(),
        ..Default::default()
    };
    if df.height() == 0 {
        return Ok((df, stats));
    }

    let hour = col("timestamp").dt().hour();
    let daylight = hour
        .clone()
        .gt_eq(lit(config.anomaly.daylight_start_hour))
        .and(hour.lt_eq(lit(config.anomaly.daylight_end_hour)));
    let anomalous = daylight
        .and(col("ghi").lt(lit(config.anomaly.ghi_threshold)))
        .fill_null(lit(false));

    let flagged = df
        .lazy()
        .with_column(anomalous.alias("anomalous"))
        .with_columns(
            IRRADIANCE_COLUMNS
                .iter()
                .map(|c| {
                    when(col("anomalous"))
                        .then(lit(NULL))
                        .otherwise(col(*c))
                        .alias(*c)
                })
                .collect::<Vec<_>>(),
        )
        .collect()?;

    stats.anomalies_nulled = flagged
        .column("anomalous")?
        .as_materialized_series()
        .bool()?
        .sum()
        .unwrap_or(0) as usize;
    let flagged = flagged.drop("anomalous")?;

    // Reconstruct each station along its own chronological index; no
    // cross-station blending.
    let mut partitions = flagged.partition_by_stable(["station_id"], true)?;
    for partition in &mut partitions {
        stats.values_interpolated +=
            fill_station_frame(partition, &IRRADIANCE_COLUMNS, FillOptions::unbounded())?;
    }

    let mut corrected = partitions.remove(0);
    for partition in &partitions {
        corrected.vstack_mut(partition)?;
    }
    let corrected = corrected
        .lazy()
        .sort(
            ["timestamp", "station_id"],
            SortMultipleOptions::default().with_maintain_order(true),
        )
        .collect()?;

    stats.values_unrecoverable = IRRADIANCE_COLUMNS
        .iter()
        .map(|c| corrected.column(c).map(|col| col.null_count()))
        .sum::<std::result::Result<usize, _>>()?;

    info!(
        "Anomaly pass: {} rows nulled, {} values reconstructed, {} unrecoverable",
        stats.anomalies_nulled, stats.values_interpolated, stats.values_unrecoverable
    );
    Ok((corrected, stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::timestamp::satellite_timestamp_ms;

    fn frame(hours: &[i64], ghi: &[Option<f64>]) -> DataFrame {
        let ts: Vec<i64> = hours
            .iter()
            .map(|h| satellite_timestamp_ms(2023, 6, 15, *h, 0).unwrap())
            .collect();
        let n = ts.len();
        let ts = Int64Chunked::from_vec("timestamp".into(), ts)
            .into_datetime(TimeUnit::Milliseconds, None)
            .into_series();
        let mut df = DataFrame::new(vec![ts.into()]).unwrap();
        df.with_column(Series::new("station_id".into(), vec!["A304"; n]))
            .unwrap();
        df.with_column(Series::new("ghi".into(), ghi.to_vec())).unwrap();
        // DNI/DHI mirror GHI so the triple-nulling is observable.
        df.with_column(Series::new("dni".into(), ghi.to_vec())).unwrap();
        df.with_column(Series::new("dhi".into(), ghi.to_vec())).unwrap();
        df
    }

    #[test]
    fn test_daytime_dropout_reconstructed() {
        let df = frame(&[12, 13, 14], &[Some(400.0), Some(5.0), Some(420.0)]);
        let (out, stats) = correct(df, &PipelineConfig::default()).unwrap();

        assert_eq!(stats.anomalies_nulled, 1);
        assert_eq!(stats.values_interpolated, 3);
        assert_eq!(stats.values_unrecoverable, 0);

        let ghi: Vec<f64> = out
            .column("ghi")
            .unwrap()
            .f64()
            .unwrap()
            .into_no_null_iter()
            .collect();
        assert!((ghi[1] - 410.0).abs() < 1e-9);
    }

    #[test]
    fn test_night_rows_untouched() {
        // 02:00 is outside the daylight window; zero GHI is legitimate.
        let df = frame(&[1, 2, 3], &[Some(0.0), Some(0.0), Some(0.0)]);
        let (out, stats) = correct(df, &PipelineConfig::default()).unwrap();
        assert_eq!(stats.anomalies_nulled, 0);
        assert_eq!(out.column("ghi").unwrap().null_count(), 0);
    }

    #[test]
    fn test_edge_anomaly_stays_null() {
        // Anomaly at the end of the series has no right anchor.
        let df = frame(&[12, 13], &[Some(400.0), Some(5.0)]);
        let (out, stats) = correct(df, &PipelineConfig::default()).unwrap();
        assert_eq!(stats.anomalies_nulled, 1);
        assert_eq!(stats.values_unrecoverable, 3);
        assert!(out.column("ghi").unwrap().f64().unwrap().get(1).is_none());
    }

    #[test]
    fn test_threshold_boundary_not_anomalous() {
        // GHI exactly at the threshold is plausible.
        let config = PipelineConfig::default().with_ghi_threshold(10.0);
        let df = frame(&[12, 13], &[Some(10.0), Some(400.0)]);
        let (_, stats) = correct(df, &config).unwrap();
        assert_eq!(stats.anomalies_nulled, 0);
    }
}
