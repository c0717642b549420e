mod config;
mod elements;
mod observations;
mod predict;
mod web;

use chrono::Utc;
use clap::{Parser, Subcommand};
use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;
use thiserror::Error;

use crate::config::{Config, ConfigError};
use crate::elements::{ElementsFetcher, FetchError, HttpTransport, TransportError};
use crate::observations::{
    export, load_predictions, save_predictions, summarize, ExportKind, NewObservation,
    ObservationError, ObservationLog, Weather,
};
use crate::predict::{
    extract_passes, filter_by_altitude, PassRecord, PredictError, PredictionWindow,
    Sgp4Propagator, MAX_WINDOW_DAYS,
};

#[derive(Parser)]
#[command(name = "pass-o-mat")]
#[command(about = "Satellite pass prediction and observation log")]
struct Cli {
    /// YAML configuration file
    #[arg(short, long, global = true)]
    config: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch current elements and predict passes
    Predict {
        /// Days to predict (1 to 14)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_WINDOW_DAYS)))]
        days: Option<u32>,
        /// Minimum culmination elevation (degrees)
        #[arg(long)]
        min_elevation: Option<f64>,
        /// Only print passes peaking at or above this elevation (degrees)
        #[arg(long)]
        threshold: Option<f64>,
        /// Where to write the predictions table
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Log an observation of a predicted pass
    Log {
        #[arg(long)]
        pass_id: u32,
        /// clear, partly-cloudy, cloudy, overcast or rainy
        #[arg(long, default_value = "clear")]
        weather: Weather,
        /// The pass was not seen
        #[arg(long)]
        failed: bool,
        #[arg(long, default_value = "")]
        notes: String,
        /// Observed peak elevation (degrees)
        #[arg(long)]
        altitude: Option<f64>,
    },
    /// Export a table as CSV
    Export {
        #[arg(long, value_enum)]
        kind: ExportKind,
        #[arg(long)]
        out: PathBuf,
    },
    /// Print observation statistics
    Stats,
    /// Run the HTTP API
    Serve,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("config: {0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Transport(#[from] TransportError),
    #[error("{0}")]
    Fetch(#[from] FetchError),
    #[error("{0}")]
    Predict(#[from] PredictError),
    #[error("{0}")]
    Observation(#[from] ObservationError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("no predictions stored; run `predict` first")]
    NoPredictions,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Predict {
            days,
            min_elevation,
            threshold,
            out,
        } => predict(&config, days, min_elevation, threshold, out).await,
        Commands::Log {
            pass_id,
            weather,
            failed,
            notes,
            altitude,
        } => log_observation(
            &config,
            NewObservation {
                pass_id,
                weather,
                successful: !failed,
                notes,
                actual_altitude: altitude,
            },
        ),
        Commands::Export { kind, out } => export_table(&config, kind, out),
        Commands::Stats => stats(&config),
        Commands::Serve => Ok(web::run_server(config).await?),
    }
}

async fn predict(
    config: &Config,
    days: Option<u32>,
    min_elevation: Option<f64>,
    threshold: Option<f64>,
    out: Option<PathBuf>,
) -> Result<(), CliError> {
    let window = PredictionWindow::new(
        Utc::now(),
        days.unwrap_or(config.prediction.days),
        min_elevation.unwrap_or(config.prediction.min_elevation_deg),
    )?;
    let threshold_deg = threshold.unwrap_or(config.prediction.threshold_deg);

    let fetcher = ElementsFetcher::new(HttpTransport::new()?, config.fetch.clone());
    let elements = fetcher.fetch(&config.target).await?;
    let propagator = Sgp4Propagator::from_elements(&elements)?;
    let passes = extract_passes(&propagator, &config.observer, &window, &config.brightness)?;

    let out = out.unwrap_or_else(|| config.storage.predictions_csv.clone());
    save_predictions(&out, &passes)?;

    let visible = filter_by_altitude(&passes, threshold_deg);
    if visible.is_empty() {
        println!(
            "No passes found for {} in the next {} days at or above {}°",
            elements.name, window.days, threshold_deg
        );
        return Ok(());
    }

    println!(
        "{} of {} passes of {} peak at or above {}°",
        visible.len(),
        passes.len(),
        elements.name,
        threshold_deg
    );
    print_passes(&visible);
    println!("Saved {} predictions to {}", passes.len(), out.display());
    Ok(())
}

fn print_passes(passes: &[PassRecord]) {
    println!(
        "  {:>3}  {:<17}  {:>8}  {:>8}  {:>8}  {:>9}  {:>10}",
        "id", "rise (UTC)", "max alt", "rise az", "set az", "duration", "brightness"
    );
    for pass in passes {
        println!(
            "  {:>3}  {:<17}  {:>7.2}°  {:>7.2}°  {:>7.2}°  {:>5.1} min  {:>10.2}",
            pass.pass_id,
            pass.rise_time.format("%Y-%m-%d %H:%M"),
            pass.max_altitude,
            pass.rise_azimuth,
            pass.set_azimuth,
            pass.duration_minutes,
            pass.brightness
        );
    }
}

fn log_observation(config: &Config, observation: NewObservation) -> Result<(), CliError> {
    let predictions = load_predictions(&config.storage.predictions_csv)?;
    if predictions.is_empty() {
        return Err(CliError::NoPredictions);
    }

    let path = &config.storage.observations_csv;
    let mut log = ObservationLog::load(path)?;
    let entry = log.append(&predictions, observation, Utc::now())?;
    println!(
        "Logged pass {} ({}, {})",
        entry.pass_id,
        entry.weather,
        if entry.successful { "seen" } else { "not seen" }
    );
    log.save(path)?;
    Ok(())
}

fn export_table(config: &Config, kind: ExportKind, out: PathBuf) -> Result<(), CliError> {
    let predictions = load_predictions(&config.storage.predictions_csv)?;
    let log = ObservationLog::load(&config.storage.observations_csv)?;

    export(kind, File::create(&out)?, &predictions, log.entries())?;
    println!("Exported {:?} to {}", kind, out.display());
    Ok(())
}

fn stats(config: &Config) -> Result<(), CliError> {
    let predictions = load_predictions(&config.storage.predictions_csv)?;
    let log = ObservationLog::load(&config.storage.observations_csv)?;
    let summary = summarize(&predictions, log.entries());

    println!("Predicted passes: {}", predictions.len());
    println!("Observed: {}", summary.total_observed);
    println!("Successful: {}", summary.successful);
    match summary.success_rate {
        Some(rate) => println!("Success rate: {:.1}%", rate * 100.0),
        None => println!("Success rate: n/a"),
    }
    for stats in &summary.by_weather {
        println!(
            "  {:<14} {:>3} observed, {:.0}% successful",
            stats.weather.to_string(),
            stats.count,
            stats.success_rate * 100.0
        );
    }
    if !summary.passes_per_day.is_empty() {
        println!("Passes per day:");
        for day in &summary.passes_per_day {
            println!("  {}  {:>3}", day.date, day.passes);
        }
    }
    Ok(())
}
