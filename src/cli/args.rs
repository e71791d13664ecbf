//! Command-line argument definitions for the fusion pipeline.
//!
//! Defines the CLI interface using the clap derive API: one subcommand
//! per pipeline stage plus `run` for the whole chain.

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI arguments for the solar dataset builder
///
/// Fuses ground weather-station and satellite-derived hourly
/// observations into Parquet feature tables ready for irradiance
/// forecasting models.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "solarfuse",
    version,
    about = "Build hourly solar-irradiance forecasting datasets from ground and satellite observations"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Directory holding raw ground CSV files (one per station)
    #[arg(long = "ground-dir", value_name = "PATH", global = true)]
    pub ground_dir: Option<PathBuf>,

    /// Directory holding per-station satellite subdirectories
    #[arg(long = "satellite-dir", value_name = "PATH", global = true)]
    pub satellite_dir: Option<PathBuf>,

    /// Directory for all Parquet artifacts
    #[arg(short = 'o', long = "output", value_name = "PATH", global = true)]
    pub output_dir: Option<PathBuf>,

    /// Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        global = true
    )]
    pub verbose: u8,

    /// Suppress output except errors
    #[arg(
        short = 'q',
        long = "quiet",
        global = true,
        conflicts_with = "verbose"
    )]
    pub quiet: bool,
}

/// Pipeline stages, each runnable as an independent batch step
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Load and unify ground station files into the ground master
    Ground,
    /// Load, unify and anomaly-correct the satellite master
    Satellite,
    /// Join the two masters into the complete hourly dataset
    Fuse,
    /// Synthesize cyclical, lag and rolling features
    Features,
    /// Split chronologically and separate features from targets
    Split,
    /// Run every stage in order
    Run,
}

impl Args {
    /// Merge CLI path overrides into the default configuration.
    pub fn to_config(&self) -> PipelineConfig {
        let mut config = PipelineConfig::default();
        if let Some(dir) = &self.ground_dir {
            config = config.with_ground_dir(dir.to_string_lossy());
        }
        if let Some(dir) = &self.satellite_dir {
            config = config.with_satellite_dir(dir.to_string_lossy());
        }
        if let Some(dir) = &self.output_dir {
            config = config.with_output_dir(dir.to_string_lossy());
        }
        config
    }

    /// Check that any explicitly provided input directory exists.
    pub fn validate(&self) -> Result<()> {
        for dir in [&self.ground_dir, &self.satellite_dir].into_iter().flatten() {
            if !dir.is_dir() {
                return Err(PipelineError::configuration_mismatch(format!(
                    "Input path is not a directory: {}",
                    dir.display()
                )));
            }
        }
        Ok(())
    }

    /// Determine the appropriate log level based on verbosity flags.
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }
}
