//! Error handling for pipeline operations.
//!
//! Provides error types with context for file loading, fusion,
//! and feature-synthesis failures. Parse-level problems are recovered
//! locally (the offending row is dropped); everything here represents a
//! structural failure that halts the current stage.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Required source not available: {path}")]
    SourceUnavailable { path: PathBuf },

    #[error("Stage '{stage}' produced no usable rows")]
    EmptyResult { stage: String },

    #[error("Configuration mismatch: {message}")]
    ConfigurationMismatch { message: String },

    #[error("Invalid file format in {path}: {reason}")]
    InvalidFormat { path: PathBuf, reason: String },
}

impl PipelineError {
    pub fn source_unavailable(path: impl Into<PathBuf>) -> Self {
        Self::SourceUnavailable { path: path.into() }
    }

    pub fn empty_result(stage: impl Into<String>) -> Self {
        Self::EmptyResult {
            stage: stage.into(),
        }
    }

    pub fn configuration_mismatch(message: impl Into<String>) -> Self {
        Self::ConfigurationMismatch {
            message: message.into(),
        }
    }

    pub fn invalid_format(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidFormat {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
