//! Raw station file loading.
//!
//! Turns one station's raw CSV records into a canonical hourly series:
//! timestamp composed from the source's split time columns, station
//! metadata attached, columns renamed and restricted, rows sorted by
//! timestamp with the first record kept per duplicate hour.

pub mod ground;
pub mod satellite;
pub mod timestamp;

use crate::error::Result;
use crate::models::Station;
use polars::prelude::*;
use tracing::debug;

/// Counters from loading one station's files.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoadStats {
    pub rows_read: usize,
    pub rows_dropped_unparsable: usize,
}

/// Attach the composed timestamp and station metadata, restrict to the
/// final schema, and enforce the ordering invariant (ascending unique
/// timestamps, first record wins).
pub(crate) fn canonicalize(
    df: DataFrame,
    ts_ms: &[Option<i64>],
    station: &Station,
    final_columns: &[&str],
) -> Result<(DataFrame, LoadStats)> {
    let rows_read = df.height();
    let parsable: Vec<bool> = ts_ms.iter().map(|t| t.is_some()).collect();
    let mask = BooleanChunked::from_slice("parsable".into(), &parsable);
    let mut df = df.filter(&mask)?;

    let ts = Int64Chunked::from_vec(
        "timestamp".into(),
        ts_ms.iter().copied().flatten().collect(),
    )
    .into_datetime(TimeUnit::Milliseconds, None)
    .into_series();
    let height = df.height();
    df.with_column(ts)?;
    df.with_column(Series::new(
        "station_id".into(),
        vec![station.id.as_str(); height],
    ))?;
    df.with_column(Series::new("latitude".into(), vec![station.latitude; height]))?;
    df.with_column(Series::new(
        "longitude".into(),
        vec![station.longitude; height],
    ))?;

    let df = df
        .lazy()
        .select(final_columns.iter().map(|c| col(*c)).collect::<Vec<_>>())
        .sort(
            ["timestamp"],
            SortMultipleOptions::default().with_maintain_order(true),
        )
        .filter(
            col("timestamp")
                .neq(col("timestamp").shift(lit(1)))
                .fill_null(lit(true)),
        )
        .collect()?;

    let stats = LoadStats {
        rows_read,
        rows_dropped_unparsable: rows_read - height,
    };
    Ok((df, stats))
}

/// Log each column's null ratio at debug level, matching the manual
/// coverage survey done when the stations were selected.
pub(crate) fn log_null_ratios(station_id: &str, df: &DataFrame) {
    if df.height() == 0 {
        return;
    }
    for column in df.get_columns() {
        let ratio = column.null_count() as f64 / df.height() as f64 * 100.0;
        debug!(
            "{}: column '{}' is {:.1}% null",
            station_id,
            column.name(),
            ratio
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonicalize_sorts_dedups_and_drops_unparsable() {
        let station = Station::new("A304", -5.837222, -35.208056);
        let df = df!(
            "air_temp" => [27.0, 25.0, 26.0, 24.0],
        )
        .unwrap();
        // Out of order, one unparsable, hours 2 and 1 with 1 duplicated.
        let hour = 3_600_000i64;
        let ts = vec![Some(2 * hour), Some(hour), None, Some(hour)];

        let (out, stats) =
            canonicalize(df, &ts, &station, &["timestamp", "station_id", "air_temp"]).unwrap();

        assert_eq!(stats.rows_read, 4);
        assert_eq!(stats.rows_dropped_unparsable, 1);
        assert_eq!(out.height(), 2);
        assert_eq!(
            out.get_column_names_str(),
            vec!["timestamp", "station_id", "air_temp"]
        );
        // Sorted ascending; the first record at hour 1 (25.0) wins over
        // the later duplicate (24.0).
        let temps: Vec<f64> = out
            .column("air_temp")
            .unwrap()
            .f64()
            .unwrap()
            .into_no_null_iter()
            .collect();
        assert_eq!(temps, vec![25.0, 27.0]);
    }

    #[test]
    fn test_many_duplicates_keep_file_order_first() {
        let station = Station::new("A316", -6.467500, -37.085000);
        let df = df!(
            "air_temp" => [21.0, 22.0, 23.0, 24.0, 30.0],
        )
        .unwrap();
        // Four records share one hour; the stable sort must keep the
        // record that appeared first in the file.
        let hour = 3_600_000i64;
        let ts = vec![Some(hour), Some(hour), Some(hour), Some(hour), Some(2 * hour)];

        let (out, _) =
            canonicalize(df, &ts, &station, &["timestamp", "station_id", "air_temp"]).unwrap();

        assert_eq!(out.height(), 2);
        let temps: Vec<f64> = out
            .column("air_temp")
            .unwrap()
            .f64()
            .unwrap()
            .into_no_null_iter()
            .collect();
        assert_eq!(temps, vec![21.0, 30.0]);
    }
}
