//! Solarfuse Library
//!
//! A Rust library for building hourly solar-irradiance forecasting
//! datasets. Fuses ground weather-station observations with
//! satellite-derived irradiance into leakage-safe Parquet feature
//! tables.
//!
//! The pipeline runs as a synchronous ETL chain:
//! - Load each station's raw CSV records into a canonical hourly series
//! - Unify stations into per-source master series
//! - Correct daytime irradiance dropouts in the satellite master
//! - Fuse the two masters with cross-imputation and gap filling
//! - Synthesize cyclical, lag and rolling features per station
//! - Split chronologically into train/validation/test feature tables

pub mod anomaly;
pub mod artifacts;
pub mod config;
pub mod error;
pub mod features;
pub mod fuse;
pub mod interpolate;
pub mod loader;
pub mod models;
pub mod split;
pub mod unify;

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use config::PipelineConfig;
pub use error::{PipelineError, Result};
pub use models::{SourceKind, Station};
