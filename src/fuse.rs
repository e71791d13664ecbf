//! Fusion of the ground and satellite masters.
//!
//! The two masters are joined on (timestamp, station_id) with a full
//! outer join, collapsed to one row per key, reconciled by
//! cross-imputation of the four shared measurements, gap-filled per
//! station, and stripped of any row still incomplete. The result is
//! the modelling dataset.

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::interpolate::{FillOptions, fill_station_frame};
use crate::models::FuseStats;
use polars::prelude::*;
use tracing::info;

/// Ground column and the satellite column that backfills it.
const IMPUTE_PAIRS: [(&str, &str); 4] = [
    ("air_temp", "air_temp_sat"),
    ("rel_humidity", "rel_humidity_sat"),
    ("wind_speed", "wind_speed_sat"),
    ("pressure", "pressure_sat"),
];

/// Satellite columns spent after imputation.
const SUPPORT_COLUMNS: [&str; 6] = [
    "latitude_sat",
    "longitude_sat",
    "air_temp_sat",
    "rel_humidity_sat",
    "wind_speed_sat",
    "pressure_sat",
];

const KEY_COLUMNS: [&str; 2] = ["timestamp", "station_id"];

/// Fuse the two masters into the complete hourly dataset.
pub fn fuse(
    ground: DataFrame,
    satellite: DataFrame,
    config: &PipelineConfig,
) -> Result<(DataFrame, FuseStats)> {
    let mut stats = FuseStats::default();

    let joined = ground
        .lazy()
        .join(
            satellite.lazy(),
            [col("timestamp"), col("station_id")],
            [col("timestamp"), col("station_id")],
            JoinArgs::new(JoinType::Full)
                .with_coalesce(JoinCoalesce::CoalesceColumns)
                .with_suffix(Some("_sat".into())),
        )
        .collect()?;
    stats.rows_joined = joined.height();

    // One row per (timestamp, station_id); duplicate observations are
    // averaged rather than arbitrarily picked.
    let value_columns: Vec<String> = joined
        .get_column_names_str()
        .into_iter()
        .filter(|name| !KEY_COLUMNS.contains(name))
        .map(str::to_string)
        .collect();
    let collapsed = joined
        .lazy()
        .group_by_stable([col("timestamp"), col("station_id")])
        .agg(
            value_columns
                .iter()
                .map(|name| col(name.as_str()).mean().alias(name.as_str()))
                .collect::<Vec<_>>(),
        )
        .sort(
            ["timestamp", "station_id"],
            SortMultipleOptions::default().with_maintain_order(true),
        )
        .collect()?;
    stats.duplicate_groups_collapsed = stats.rows_joined - collapsed.height();

    let imputed = cross_impute(collapsed, &mut stats)?;
    let trimmed = imputed.drop_many(SUPPORT_COLUMNS);
    if trimmed.height() == 0 {
        return Err(crate::error::PipelineError::empty_result("fuse"));
    }

    let fill_columns: Vec<String> = trimmed
        .get_column_names_str()
        .into_iter()
        .filter(|name| !KEY_COLUMNS.contains(name))
        .map(str::to_string)
        .collect();
    let fill_refs: Vec<&str> = fill_columns.iter().map(String::as_str).collect();

    let mut partitions = trimmed.partition_by_stable(["station_id"], true)?;
    let opts = FillOptions::bounded_with_padding(config.max_interpolation_gap_hours);
    for partition in &mut partitions {
        stats.values_interpolated += fill_station_frame(partition, &fill_refs, opts)?;
    }
    let mut filled = partitions.remove(0);
    for partition in &partitions {
        filled.vstack_mut(partition)?;
    }

    let before_drop = filled.height();
    let dataset = filled
        .lazy()
        .drop_nulls(None)
        .sort(
            ["timestamp", "station_id"],
            SortMultipleOptions::default().with_maintain_order(true),
        )
        .collect()?;
    stats.rows_dropped_incomplete = before_drop - dataset.height();
    stats.rows_final = dataset.height();

    info!(
        "Fused {} rows ({} duplicate groups collapsed, {} interpolated, {} incomplete dropped)",
        stats.rows_final,
        stats.duplicate_groups_collapsed,
        stats.values_interpolated,
        stats.rows_dropped_incomplete
    );
    Ok((dataset, stats))
}

/// Backfill each ground measurement from its satellite counterpart,
/// reporting filled and still-missing counts per column.
fn cross_impute(df: DataFrame, stats: &mut FuseStats) -> Result<DataFrame> {
    let nulls_before: Vec<usize> = IMPUTE_PAIRS
        .iter()
        .map(|(target, _)| df.column(target).map(|c| c.null_count()))
        .collect::<std::result::Result<_, _>>()?;

    let df = df
        .lazy()
        .with_columns(
            IMPUTE_PAIRS
                .iter()
                .map(|(target, source)| col(*target).fill_null(col(*source)).alias(*target))
                .collect::<Vec<_>>(),
        )
        .collect()?;

    for ((target, _), before) in IMPUTE_PAIRS.iter().zip(nulls_before) {
        let remaining = df.column(target)?.null_count();
        let filled = before - remaining;
        info!("Column '{target}': {filled} values filled ({remaining} nulls remaining)");
        stats
            .imputed_per_column
            .push((target.to_string(), filled, remaining));
    }
    Ok(df)
}
