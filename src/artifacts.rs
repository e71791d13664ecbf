//! Parquet artifact persistence.
//!
//! Every stage boundary is a snappy-compressed parquet file; a stage
//! reads its predecessor's artifact by well-known name and refuses to
//! start when it is missing.

use crate::error::{PipelineError, Result};
use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::info;

pub const GROUND_MASTER: &str = "ground_master.parquet";
pub const SATELLITE_MASTER: &str = "satellite_master.parquet";
pub const DATASET: &str = "dataset.parquet";
pub const FEATURES: &str = "features.parquet";
pub const X_TRAIN: &str = "X_train.parquet";
pub const Y_TRAIN: &str = "y_train.parquet";
pub const X_VAL: &str = "X_val.parquet";
pub const Y_VAL: &str = "y_val.parquet";
pub const X_TEST: &str = "X_test.parquet";
pub const Y_TEST: &str = "y_test.parquet";

/// Read a stage artifact, failing with `SourceUnavailable` when the
/// file does not exist.
pub fn read_artifact(dir: &Path, name: &str) -> Result<DataFrame> {
    let path = dir.join(name);
    if !path.exists() {
        return Err(PipelineError::source_unavailable(path));
    }
    let file = File::open(&path)?;
    let df = ParquetReader::new(file).finish()?;
    Ok(df)
}

/// Write a stage artifact with snappy compression, creating the
/// output directory on first use.
pub fn write_artifact(dir: &Path, name: &str, df: &mut DataFrame) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(name);
    let file = File::create(&path)?;
    ParquetWriter::new(file)
        .with_compression(ParquetCompression::Snappy)
        .finish(df)?;
    info!("Wrote {} rows to {}", df.height(), path.display());
    Ok(path)
}
