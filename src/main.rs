mod cli;

use std::process;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{CommandFactory, Parser};
use cli::commands::{Cli, Commands};
use cli::progress::CliReporter;
use colored::*;
use dotenv::dotenv;
use tidy_downloads::{AppConfig, Organizer, ScanReport, SweepReport};
use tracing::{error, info};

fn main() {
    dotenv().ok();

    let _guard = cli::logging::init_logger();

    let args = Cli::parse();

    let config = match tidy_downloads::config::load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            process::exit(2);
        }
    };

    let result = match args.command {
        Some(Commands::Organize) => run_organize(config),
        Some(Commands::Sweep) => run_sweep(config),
        Some(Commands::Run) => run_all(config),
        Some(Commands::Pending) => run_pending(config),
        Some(Commands::PrintConfig) => print_config(&config),
        None => {
            let _ = Cli::command().print_long_help();
            Ok(())
        }
    };

    if let Err(err) = result {
        error!("Error: {:#}", err);
        process::exit(1);
    }
}

fn run_organize(config: AppConfig) -> anyhow::Result<()> {
    let organizer = Organizer::new(config);
    let report = organizer.organize(&CliReporter::new())?;
    print_scan_summary(&report);
    Ok(())
}

fn run_sweep(config: AppConfig) -> anyhow::Result<()> {
    let organizer = Organizer::new(config);
    let report = organizer.sweep(&CliReporter::new())?;
    print_sweep_summary(&report);
    Ok(())
}

fn run_all(config: AppConfig) -> anyhow::Result<()> {
    let organizer = Organizer::new(config);
    let (scan, sweep) = organizer.run(&CliReporter::new())?;
    print_scan_summary(&scan);
    print_sweep_summary(&sweep);
    Ok(())
}

fn run_pending(config: AppConfig) -> anyhow::Result<()> {
    let retention = config.retention_seconds();
    let organizer = Organizer::new(config);
    let tracker = organizer.pending();
    let now = Utc::now().timestamp();

    if tracker.is_empty() {
        info!("No unknown files are being tracked");
        return Ok(());
    }

    for (path, first_seen) in tracker.entries() {
        let due = first_seen.saturating_add(retention);
        let due_label = DateTime::<Utc>::from_timestamp(due, 0)
            .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| due.to_string());
        let status = if now >= due {
            "expired".red()
        } else {
            "waiting".yellow()
        };
        println!("{} {} (due {})", status, path.display(), due_label);
    }
    info!("{} unknown files tracked", tracker.len());
    Ok(())
}

fn print_config(config: &AppConfig) -> anyhow::Result<()> {
    let text = toml::to_string_pretty(config).context("rendering configuration")?;
    println!("{}", text);
    Ok(())
}

fn print_scan_summary(report: &ScanReport) {
    println!();
    info!(
        "{} files seen, {} moved, {} duplicates, {} unknown",
        format!("{}", report.total_files_seen).cyan(),
        format!("{}", report.total_moved()).green(),
        format!("{}", report.duplicates.len()).red(),
        format!("{}", report.unknown.len()).yellow(),
    );
    for (category, count) in &report.moved {
        info!("  {}: {}", category, count);
    }
    if !report.errors.is_empty() {
        info!(
            "{} files could not be processed (see report)",
            format!("{}", report.errors.len()).red()
        );
    }
}

fn print_sweep_summary(report: &SweepReport) {
    info!(
        "{} unknown files deleted, {} already gone, {} failed",
        format!("{}", report.deleted.len()).green(),
        format!("{}", report.vanished.len()).yellow(),
        format!("{}", report.failed.len()).red(),
    );
}
