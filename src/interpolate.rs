//! Time-weighted gap filling for hourly series.
//!
//! Operates on one station's chronologically sorted values at a time.
//! Interpolation is linear in time, so an irregular gap between the
//! bounding observations weights the reconstruction by how far the
//! missing hour sits between them.

use crate::error::{PipelineError, Result};
use polars::prelude::*;

/// How a gap between two valid observations may be bridged.
#[derive(Debug, Clone, Copy)]
pub struct FillOptions {
    /// Largest bridgeable gap in milliseconds between the bounding
    /// observations. `None` bridges any gap.
    pub max_gap_ms: Option<i64>,

    /// Pad leading/trailing nulls from the nearest valid value.
    /// When false those positions stay null.
    pub pad_edges: bool,
}

impl FillOptions {
    /// Unbounded interior interpolation, edges left null.
    pub fn unbounded() -> Self {
        Self {
            max_gap_ms: None,
            pad_edges: false,
        }
    }

    /// Interpolation bounded at `max_gap_hours`, edges padded both
    /// directions from the nearest valid value.
    pub fn bounded_with_padding(max_gap_hours: i64) -> Self {
        Self {
            max_gap_ms: Some(max_gap_hours * 3_600_000),
            pad_edges: true,
        }
    }
}

/// Fill nulls in `values` by linear interpolation against `timestamps`
/// (epoch milliseconds, ascending). Returns the number of positions
/// filled. Slices must be equal length.
pub fn fill_gaps(timestamps: &[i64], values: &mut [Option<f64>], opts: FillOptions) -> usize {
    debug_assert_eq!(timestamps.len(), values.len());
    let n = values.len();
    let mut filled = 0;

    // Interior gaps: for each null run bounded by valid values on
    // both sides, reconstruct each point by its time offset.
    let mut prev_valid: Option<usize> = None;
    let mut i = 0;
    while i < n {
        if values[i].is_some() {
            prev_valid = Some(i);
            i += 1;
            continue;
        }
        // Run of nulls starting at i.
        let run_start = i;
        while i < n && values[i].is_none() {
            i += 1;
        }
        let (Some(lo), true) = (prev_valid, i < n) else {
            continue;
        };
        let hi = i;
        let gap = timestamps[hi] - timestamps[lo];
        if let Some(max_gap) = opts.max_gap_ms
            && gap > max_gap
        {
            continue;
        }
        let (Some(v_lo), Some(v_hi)) = (values[lo], values[hi]) else {
            continue;
        };
        for j in run_start..hi {
            let frac = if gap > 0 {
                (timestamps[j] - timestamps[lo]) as f64 / gap as f64
            } else {
                0.0
            };
            values[j] = Some(v_lo + (v_hi - v_lo) * frac);
            filled += 1;
        }
    }

    if opts.pad_edges {
        // Leading nulls take the first valid value.
        if let Some(first_idx) = values.iter().position(|v| v.is_some()) {
            let first = values[first_idx];
            for v in values[..first_idx].iter_mut() {
                *v = first;
                filled += 1;
            }
        }
        // Trailing nulls take the last valid value.
        if let Some(last_idx) = values.iter().rposition(|v| v.is_some()) {
            let last = values[last_idx];
            for v in values[last_idx + 1..].iter_mut() {
                *v = last;
                filled += 1;
            }
        }
    }

    filled
}

/// Fill the named columns of one station's chronologically sorted
/// frame in place, returning the number of values filled across all
/// columns.
pub fn fill_station_frame(
    df: &mut DataFrame,
    columns: &[&str],
    opts: FillOptions,
) -> Result<usize> {
    let ts_column = df
        .column("timestamp")?
        .as_materialized_series()
        .cast(&DataType::Int64)?;
    if ts_column.null_count() > 0 {
        return Err(PipelineError::configuration_mismatch(
            "timestamp column holds nulls; cannot interpolate against it",
        ));
    }
    let timestamps: Vec<i64> = ts_column.i64()?.into_no_null_iter().collect();

    let mut filled = 0;
    for name in columns {
        let mut values: Vec<Option<f64>> = df
            .column(name)?
            .as_materialized_series()
            .cast(&DataType::Float64)?
            .f64()?
            .into_iter()
            .collect();
        filled += fill_gaps(&timestamps, &mut values, opts);
        df.with_column(Series::new((*name).into(), values))?;
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: i64 = 3_600_000;

    fn hourly(n: usize) -> Vec<i64> {
        (0..n as i64).map(|i| i * HOUR).collect()
    }

    #[test]
    fn test_interior_gap_time_weighted() {
        let ts = hourly(3);
        let mut vals = vec![Some(400.0), None, Some(420.0)];
        let filled = fill_gaps(&ts, &mut vals, FillOptions::unbounded());
        assert_eq!(filled, 1);
        assert!((vals[1].unwrap() - 410.0).abs() < 1e-9);
    }

    #[test]
    fn test_irregular_spacing_weights_by_time() {
        // Valid at t=0h and t=4h, missing at t=1h: expect 1/4 of the way.
        let ts = vec![0, HOUR, 4 * HOUR];
        let mut vals = vec![Some(0.0), None, Some(100.0)];
        fill_gaps(&ts, &mut vals, FillOptions::unbounded());
        assert!((vals[1].unwrap() - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_edges_stay_null_without_padding() {
        let ts = hourly(4);
        let mut vals = vec![None, Some(1.0), Some(2.0), None];
        let filled = fill_gaps(&ts, &mut vals, FillOptions::unbounded());
        assert_eq!(filled, 0);
        assert!(vals[0].is_none());
        assert!(vals[3].is_none());
    }

    #[test]
    fn test_edge_padding() {
        let ts = hourly(4);
        let mut vals = vec![None, Some(1.0), Some(2.0), None];
        let filled = fill_gaps(&ts, &mut vals, FillOptions::bounded_with_padding(6));
        assert_eq!(filled, 2);
        assert_eq!(vals[0], Some(1.0));
        assert_eq!(vals[3], Some(2.0));
    }

    #[test]
    fn test_gap_bound_respected() {
        // 8-hour gap with a 6-hour bound: left unfilled.
        let ts = vec![0, 4 * HOUR, 8 * HOUR];
        let mut vals = vec![Some(10.0), None, Some(20.0)];
        let filled = fill_gaps(&ts, &mut vals, FillOptions::bounded_with_padding(6));
        assert_eq!(filled, 0);
        assert!(vals[1].is_none());
    }

    #[test]
    fn test_all_null_series_untouched() {
        let ts = hourly(3);
        let mut vals = vec![None, None, None];
        let filled = fill_gaps(&ts, &mut vals, FillOptions::bounded_with_padding(6));
        assert_eq!(filled, 0);
        assert!(vals.iter().all(|v| v.is_none()));
    }
}
