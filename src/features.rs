//! Feature synthesis over the fused dataset.
//!
//! Adds cyclical time encodings, per-station lag columns resolved by
//! exact timestamp arithmetic, and per-station rolling statistics over
//! strictly preceding values. A lag or rolling window never crosses a
//! station boundary, and a row's own value never contributes to its
//! own rolling statistic. Rows left incomplete by missing history are
//! dropped at the end.

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::models::FeatureStats;
use polars::prelude::*;
use std::f64::consts::TAU;
use tracing::{info, warn};

const HOURS_PER_DAY: f64 = 24.0;
const DAYS_PER_YEAR: f64 = 365.25;
const MS_PER_HOUR: i64 = 3_600_000;

/// Synthesize the model-ready feature table.
pub fn synthesize(df: DataFrame, config: &PipelineConfig) -> Result<(DataFrame, FeatureStats)> {
    if df.height() == 0 {
        return Err(PipelineError::empty_result("features"));
    }
    let mut stats = FeatureStats {
        rows_in: df.height(),
        ..Default::default()
    };
    let width_in = df.width();
    let present: Vec<String> = df
        .get_column_names_str()
        .into_iter()
        .map(str::to_string)
        .collect();

    let mut lf = df.clone().lazy().with_columns(cyclical_exprs());

    for (column, offsets) in &config.features.lag_hours {
        if !present.contains(column) {
            warn!("Lag column '{column}' not in dataset; skipping");
            continue;
        }
        for offset in offsets {
            lf = join_lag(lf, &df, column, *offset);
        }
    }
    // Joins may perturb row order; restore per-station chronology
    // before the rolling pass depends on it.
    let with_lags = lf
        .sort(["station_id", "timestamp"], SortMultipleOptions::default())
        .collect()?;

    let rolling: Vec<&str> = config
        .features
        .rolling_columns
        .iter()
        .filter(|column| {
            let ok = present.contains(column);
            if !ok {
                warn!("Rolling column '{column}' not in dataset; skipping");
            }
            ok
        })
        .map(String::as_str)
        .collect();

    let mut partitions = with_lags.partition_by_stable(["station_id"], true)?;
    for partition in partitions.iter_mut() {
        *partition = add_rolling(partition.clone(), &rolling, config.features.rolling_window)?;
    }
    let mut features = partitions.remove(0);
    for partition in &partitions {
        features.vstack_mut(partition)?;
    }

    let before_drop = features.height();
    let features = features
        .lazy()
        .drop_nulls(None)
        .sort(
            ["timestamp", "station_id"],
            SortMultipleOptions::default().with_maintain_order(true),
        )
        .collect()?;

    stats.columns_added = features.width() - width_in;
    stats.rows_dropped_incomplete = before_drop - features.height();
    stats.rows_final = features.height();

    info!(
        "Synthesized {} feature columns; {} rows kept ({} dropped for missing history)",
        stats.columns_added, stats.rows_final, stats.rows_dropped_incomplete
    );
    Ok((features, stats))
}

/// Sine/cosine encodings of hour-of-day and day-of-year.
fn cyclical_exprs() -> Vec<Expr> {
    let hour = col("timestamp").dt().hour().cast(DataType::Float64);
    let doy = col("timestamp").dt().ordinal_day().cast(DataType::Float64);
    vec![
        (hour.clone() * lit(TAU / HOURS_PER_DAY)).sin().alias("hour_sin"),
        (hour * lit(TAU / HOURS_PER_DAY)).cos().alias("hour_cos"),
        (doy.clone() * lit(TAU / DAYS_PER_YEAR)).sin().alias("doy_sin"),
        (doy * lit(TAU / DAYS_PER_YEAR)).cos().alias("doy_cos"),
    ]
}

/// Left-join the dataset against itself shifted forward by `offset`
/// hours, so each row picks up the same station's value from exactly
/// `offset` hours earlier, or null when that hour is absent.
fn join_lag(lf: LazyFrame, df: &DataFrame, column: &str, offset: i64) -> LazyFrame {
    let name = format!("{column}_lag{offset}h");
    let shifted = df.clone().lazy().select([
        (col("timestamp").cast(DataType::Int64) + lit(offset * MS_PER_HOUR))
            .cast(DataType::Datetime(TimeUnit::Milliseconds, None))
            .alias("timestamp"),
        col("station_id"),
        col(column).alias(name),
    ]);
    lf.join(
        shifted,
        [col("timestamp"), col("station_id")],
        [col("timestamp"), col("station_id")],
        JoinArgs::new(JoinType::Left),
    )
}

/// Rolling mean and standard deviation over the `window` values
/// strictly before each row of one station's sorted frame.
fn add_rolling(df: DataFrame, columns: &[&str], window: usize) -> Result<DataFrame> {
    if columns.is_empty() {
        return Ok(df);
    }
    let opts = RollingOptionsFixedWindow {
        window_size: window,
        min_periods: window,
        ..Default::default()
    };
    let mut exprs = Vec::with_capacity(columns.len() * 2);
    for column in columns {
        exprs.push(
            col(*column)
                .shift(lit(1))
                .rolling_mean(opts.clone())
                .alias(format!("{column}_rollmean{window}")),
        );
        exprs.push(
            col(*column)
                .shift(lit(1))
                .rolling_std(opts.clone())
                .alias(format!("{column}_rollstd{window}")),
        );
    }
    let df = df.lazy().with_columns(exprs).collect()?;
    Ok(df)
}
