//! Chronological dataset splitting.
//!
//! Trims rows past the coverage cutoff, partitions the feature table
//! at two boundary dates into train/validation/test, and separates
//! features from targets. Every retained row lands in exactly one
//! partition; the timestamp column is carried in both tables of a
//! partition as the shared row identity.

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::models::SplitStats;
use chrono::NaiveDate;
use polars::prelude::*;
use tracing::info;

/// The six persisted tables of one split.
#[derive(Debug)]
pub struct SplitTables {
    pub x_train: DataFrame,
    pub y_train: DataFrame,
    pub x_val: DataFrame,
    pub y_val: DataFrame,
    pub x_test: DataFrame,
    pub y_test: DataFrame,
}

/// Partition the feature table chronologically and separate targets.
pub fn split(df: DataFrame, config: &PipelineConfig) -> Result<(SplitTables, SplitStats)> {
    let cfg = &config.split;
    if cfg.validation_start >= cfg.test_start || cfg.test_start >= cfg.coverage_cutoff {
        return Err(PipelineError::configuration_mismatch(
            "split boundaries must be ordered: validation_start < test_start < coverage_cutoff",
        ));
    }

    let mut stats = SplitStats::default();
    let rows_in = df.height();

    let retained = filter_ts(df.clone(), |ts| ts.lt(lit(date_ms(cfg.coverage_cutoff))))?;
    stats.rows_beyond_cutoff = rows_in - retained.height();
    if retained.height() == 0 {
        return Err(PipelineError::empty_result("split"));
    }

    let val_ms = date_ms(cfg.validation_start);
    let test_ms = date_ms(cfg.test_start);
    let train = filter_ts(retained.clone(), |ts| ts.lt(lit(val_ms)))?;
    let val = filter_ts(retained.clone(), |ts| {
        ts.clone().gt_eq(lit(val_ms)).and(ts.lt(lit(test_ms)))
    })?;
    let test = filter_ts(retained, |ts| ts.gt_eq(lit(test_ms)))?;

    stats.train_rows = train.height();
    stats.validation_rows = val.height();
    stats.test_rows = test.height();

    let (x_train, y_train) = separate(train, config)?;
    let (x_val, y_val) = separate(val, config)?;
    let (x_test, y_test) = separate(test, config)?;

    let (p_train, p_val, p_test) = stats.proportions();
    info!(
        "Split: train {} ({:.1}%), validation {} ({:.1}%), test {} ({:.1}%); {} rows beyond cutoff",
        stats.train_rows,
        p_train * 100.0,
        stats.validation_rows,
        p_val * 100.0,
        stats.test_rows,
        p_test * 100.0,
        stats.rows_beyond_cutoff
    );

    Ok((
        SplitTables {
            x_train,
            y_train,
            x_val,
            y_val,
            x_test,
            y_test,
        },
        stats,
    ))
}

fn date_ms(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp_millis())
        .unwrap_or(i64::MAX)
}

fn filter_ts(df: DataFrame, predicate: impl Fn(Expr) -> Expr) -> Result<DataFrame> {
    let ts = col("timestamp").cast(DataType::Int64);
    let df = df.lazy().filter(predicate(ts)).collect()?;
    Ok(df)
}

/// Separate one partition into its features and targets tables. Both
/// keep the timestamp column.
fn separate(df: DataFrame, config: &PipelineConfig) -> Result<(DataFrame, DataFrame)> {
    let cfg = &config.split;
    let excluded: Vec<&String> = cfg
        .target_columns
        .iter()
        .chain(cfg.withheld_columns.iter())
        .collect();

    let feature_columns: Vec<Expr> = df
        .get_column_names_str()
        .into_iter()
        .filter(|name| !excluded.iter().any(|e| e.as_str() == *name))
        .map(col)
        .collect();
    let target_columns: Vec<Expr> = std::iter::once("timestamp".to_string())
        .chain(cfg.target_columns.iter().cloned())
        .map(|name| col(name.as_str()))
        .collect();

    let x = df.clone().lazy().select(feature_columns).collect()?;
    let y = df.lazy().select(target_columns).collect()?;
    Ok((x, y))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(dates: &[(i32, u32, u32)]) -> DataFrame {
        let ms: Vec<i64> = dates
            .iter()
            .map(|(y, m, d)| {
                NaiveDate::from_ymd_opt(*y, *m, *d)
                    .unwrap()
                    .and_hms_opt(12, 0, 0)
                    .unwrap()
                    .and_utc()
                    .timestamp_millis()
            })
            .collect();
        let n = ms.len();
        let ts = Int64Chunked::from_vec("timestamp".into(), ms)
            .into_datetime(TimeUnit::Milliseconds, None)
            .into_series();
        let mut df = DataFrame::new(vec![ts.into()]).unwrap();
        df.with_column(Series::new("station_id".into(), vec!["A304"; n])).unwrap();
        df.with_column(Series::new("ghi".into(), vec![500.0; n])).unwrap();
        df.with_column(Series::new("dni".into(), vec![700.0; n])).unwrap();
        df.with_column(Series::new("dhi".into(), vec![100.0; n])).unwrap();
        df.with_column(Series::new("air_temp".into(), vec![26.0; n])).unwrap();
        df
    }

    #[test]
    fn test_partitions_disjoint_and_ordered() {
        let df = frame(&[
            (2018, 3, 1),
            (2022, 12, 31),
            (2023, 1, 1),
            (2023, 6, 1),
            (2024, 1, 1),
            (2024, 8, 1),
            (2025, 8, 1), // beyond the 2025-07-01 cutoff
        ]);
        let (tables, stats) = split(df, &PipelineConfig::default()).unwrap();

        assert_eq!(stats.rows_beyond_cutoff, 1);
        assert_eq!(stats.train_rows, 2);
        assert_eq!(stats.validation_rows, 2);
        assert_eq!(stats.test_rows, 2);
        assert_eq!(stats.total(), 6);

        // Boundary rows land on the later side: 2023-01-01 is
        // validation, 2024-01-01 is test.
        assert_eq!(tables.x_train.height(), 2);
        assert_eq!(tables.y_val.height(), 2);
        assert_eq!(tables.x_test.height(), 2);
    }

    #[test]
    fn test_targets_and_withheld_separated() {
        let df = frame(&[(2022, 6, 1)]);
        let (tables, _) = split(df, &PipelineConfig::default()).unwrap();

        let x_names = tables.x_train.get_column_names_str();
        assert!(x_names.contains(&"timestamp"));
        assert!(x_names.contains(&"air_temp"));
        for hidden in ["ghi", "dni", "dhi", "station_id"] {
            assert!(!x_names.contains(&hidden), "{hidden} leaked into features");
        }

        assert_eq!(
            tables.y_train.get_column_names_str(),
            vec!["timestamp", "ghi", "dni"]
        );
    }

    #[test]
    fn test_all_rows_beyond_cutoff_is_empty_result() {
        let df = frame(&[(2025, 8, 1)]);
        let err = split(df, &PipelineConfig::default()).unwrap_err();
        assert!(matches!(err, PipelineError::EmptyResult { .. }));
    }

    #[test]
    fn test_misordered_boundaries_rejected() {
        let mut config = PipelineConfig::default();
        config.split.validation_start = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let err = split(frame(&[(2022, 6, 1)]), &config).unwrap_err();
        assert!(matches!(err, PipelineError::ConfigurationMismatch { .. }));
    }
}
