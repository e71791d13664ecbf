use clap::Parser;
use colored::*;
use solarfuse::cli::{args::Args, commands};
use std::process;

fn main() {
    let args = Args::parse();

    if let Err(error) = commands::run(args) {
        eprintln!("{} {error}", "Error:".bright_red().bold());
        process::exit(1);
    }
}
