//! Command execution for the fusion pipeline CLI.
//!
//! Dispatches each subcommand to its stage, persists the stage
//! artifact, and prints a colored summary. A structural failure
//! propagates out before anything is written, so a failed stage never
//! leaves a partial artifact behind.

use crate::artifacts;
use crate::cli::args::{Args, Commands};
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::models::SourceKind;
use crate::{anomaly, features, fuse, split, unify};
use colored::*;
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// Run the parsed command to completion.
pub fn run(args: Args) -> Result<()> {
    setup_logging(&args)?;
    args.validate()?;
    let config = args.to_config();
    let started = Instant::now();

    match args.command {
        Commands::Ground => cmd_ground(&config)?,
        Commands::Satellite => cmd_satellite(&config)?,
        Commands::Fuse => cmd_fuse(&config)?,
        Commands::Features => cmd_features(&config)?,
        Commands::Split => cmd_split(&config)?,
        Commands::Run => {
            cmd_ground(&config)?;
            cmd_satellite(&config)?;
            cmd_fuse(&config)?;
            cmd_features(&config)?;
            cmd_split(&config)?;
        }
    }

    info!("Finished in {:.1?}", started.elapsed());
    Ok(())
}

fn setup_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("solarfuse={}", args.get_log_level())));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .init();
    Ok(())
}

fn output_dir(config: &PipelineConfig) -> &Path {
    Path::new(&config.output_dir)
}

fn cmd_ground(config: &PipelineConfig) -> Result<()> {
    println!("{}", "Building ground master...".bright_yellow());
    let (mut master, stats) = unify::build_master(config, SourceKind::Ground)?;
    let path = artifacts::write_artifact(output_dir(config), artifacts::GROUND_MASTER, &mut master)?;

    println!("{}", "Ground master complete".bright_green().bold());
    println!(
        "  {} {} rows from {} stations ({} skipped, {} unparsable rows dropped)",
        "Unified:".bright_cyan(),
        master.height().to_string().bright_white().bold(),
        stats.stations_loaded,
        stats.stations_skipped,
        stats.rows_dropped_unparsable
    );
    println!("  {} {}", "Artifact:".bright_cyan(), path.display());
    Ok(())
}

fn cmd_satellite(config: &PipelineConfig) -> Result<()> {
    println!("{}", "Building satellite master...".bright_yellow());
    let (master, stats) = unify::build_master(config, SourceKind::Satellite)?;
    let (mut corrected, anomaly_stats) = anomaly::correct(master, config)?;
    let path =
        artifacts::write_artifact(output_dir(config), artifacts::SATELLITE_MASTER, &mut corrected)?;

    println!("{}", "Satellite master complete".bright_green().bold());
    println!(
        "  {} {} rows from {} stations ({} skipped)",
        "Unified:".bright_cyan(),
        corrected.height().to_string().bright_white().bold(),
        stats.stations_loaded,
        stats.stations_skipped
    );
    println!(
        "  {} {} anomalous rows nulled, {} values reconstructed, {} unrecoverable",
        "Anomalies:".bright_cyan(),
        anomaly_stats.anomalies_nulled,
        anomaly_stats.values_interpolated,
        anomaly_stats.values_unrecoverable
    );
    println!("  {} {}", "Artifact:".bright_cyan(), path.display());
    Ok(())
}

fn cmd_fuse(config: &PipelineConfig) -> Result<()> {
    println!("{}", "Fusing masters...".bright_yellow());
    let out = output_dir(config);
    let ground = artifacts::read_artifact(out, artifacts::GROUND_MASTER)?;
    let satellite = artifacts::read_artifact(out, artifacts::SATELLITE_MASTER)?;
    let (mut dataset, stats) = fuse::fuse(ground, satellite, config)?;
    let path = artifacts::write_artifact(out, artifacts::DATASET, &mut dataset)?;

    println!("{}", "Fusion complete".bright_green().bold());
    println!(
        "  {} {} rows ({} duplicate groups collapsed, {} incomplete dropped)",
        "Dataset:".bright_cyan(),
        stats.rows_final.to_string().bright_white().bold(),
        stats.duplicate_groups_collapsed,
        stats.rows_dropped_incomplete
    );
    for (column, filled, remaining) in &stats.imputed_per_column {
        println!(
            "  {} '{}': {} values filled ({} nulls remaining)",
            "Imputed".bright_cyan(),
            column,
            filled,
            remaining
        );
    }
    println!("  {} {}", "Artifact:".bright_cyan(), path.display());
    Ok(())
}

fn cmd_features(config: &PipelineConfig) -> Result<()> {
    println!("{}", "Synthesizing features...".bright_yellow());
    let out = output_dir(config);
    let dataset = artifacts::read_artifact(out, artifacts::DATASET)?;
    let (mut table, stats) = features::synthesize(dataset, config)?;
    let path = artifacts::write_artifact(out, artifacts::FEATURES, &mut table)?;

    println!("{}", "Feature synthesis complete".bright_green().bold());
    println!(
        "  {} {} columns added, {} rows kept ({} dropped for missing history)",
        "Features:".bright_cyan(),
        stats.columns_added,
        stats.rows_final.to_string().bright_white().bold(),
        stats.rows_dropped_incomplete
    );
    println!("  {} {}", "Artifact:".bright_cyan(), path.display());
    Ok(())
}

fn cmd_split(config: &PipelineConfig) -> Result<()> {
    println!("{}", "Splitting dataset...".bright_yellow());
    let out = output_dir(config);
    let table = artifacts::read_artifact(out, artifacts::FEATURES)?;
    let (mut tables, stats) = split::split(table, config)?;

    artifacts::write_artifact(out, artifacts::X_TRAIN, &mut tables.x_train)?;
    artifacts::write_artifact(out, artifacts::Y_TRAIN, &mut tables.y_train)?;
    artifacts::write_artifact(out, artifacts::X_VAL, &mut tables.x_val)?;
    artifacts::write_artifact(out, artifacts::Y_VAL, &mut tables.y_val)?;
    artifacts::write_artifact(out, artifacts::X_TEST, &mut tables.x_test)?;
    artifacts::write_artifact(out, artifacts::Y_TEST, &mut tables.y_test)?;

    let (p_train, p_val, p_test) = stats.proportions();
    println!("{}", "Split complete".bright_green().bold());
    println!(
        "  {} {} rows ({:.1}%)",
        "Train:".bright_cyan(),
        stats.train_rows.to_string().bright_white().bold(),
        p_train * 100.0
    );
    println!(
        "  {} {} rows ({:.1}%)",
        "Validation:".bright_cyan(),
        stats.validation_rows.to_string().bright_white().bold(),
        p_val * 100.0
    );
    println!(
        "  {} {} rows ({:.1}%)",
        "Test:".bright_cyan(),
        stats.test_rows.to_string().bright_white().bold(),
        p_test * 100.0
    );
    println!(
        "  {} {} rows beyond coverage cutoff",
        "Excluded:".bright_cyan(),
        stats.rows_beyond_cutoff
    );
    Ok(())
}
