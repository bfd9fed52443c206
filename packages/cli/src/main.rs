#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line entry point for the disease heat map.
//!
//! With no subcommand, asks interactively which tool to run. Uses
//! `indicatif-log-bridge` (via [`disease_map_cli_utils::init_logger`]) to
//! route `log` output through `indicatif::MultiProgress` so that log lines
//! and the geocoding progress bar never fight for the terminal.

mod heatmap;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use dialoguer::{Input, Select};
use disease_map_database::{db, queries};
use disease_map_diagnosis_models::Disease;

use crate::heatmap::HeatmapArgs;

#[derive(Parser)]
#[command(name = "disease_map", about = "Disease heat map tools")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a heat map from a CSV of diagnoses and print the ranked cities
    Heatmap {
        /// CSV with `userId,diseaseName,latitude,longitude` columns
        #[arg(long)]
        input: PathBuf,
        /// Disease to map (prompted for if omitted)
        #[arg(long)]
        disease: Option<String>,
        /// Skip reverse geocoding; every city is reported as "Unknown"
        #[arg(long)]
        offline: bool,
        /// TOML file overriding the pipeline defaults
        #[arg(long)]
        config: Option<PathBuf>,
        /// Write the full `City,Cases` list to this path
        #[arg(long)]
        cities_csv: Option<PathBuf>,
        /// Write the ranked `Name,Value,Percentage` summary to this path
        #[arg(long)]
        ranked_csv: Option<PathBuf>,
    },
    /// Start the API server
    Serve {
        /// TOML file overriding the pipeline defaults
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Delete diagnoses past their retention window
    Purge,
    /// List the selectable diseases and their retention windows
    Diseases,
}

/// Top-level tool selection when no subcommand is given.
enum Tool {
    Heatmap,
    Serve,
    Purge,
    Diseases,
}

impl Tool {
    const ALL: &[Self] = &[Self::Heatmap, Self::Serve, Self::Purge, Self::Diseases];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Heatmap => "Build heat map from CSV",
            Self::Serve => "Start server",
            Self::Purge => "Purge expired diagnoses",
            Self::Diseases => "List diseases",
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = disease_map_cli_utils::init_logger();
    let cli = Cli::parse();

    let command = match cli.command {
        Some(command) => command,
        None => prompt_command()?,
    };

    match command {
        Commands::Heatmap {
            input,
            disease,
            offline,
            config,
            cities_csv,
            ranked_csv,
        } => {
            let disease = match disease {
                Some(disease) => disease,
                None => prompt_disease()?,
            };
            let args = HeatmapArgs {
                input,
                disease,
                offline,
                config,
                cities_csv,
                ranked_csv,
            };
            heatmap::run(&args, &multi).await?;
        }
        Commands::Serve { config } => serve(config).await?,
        Commands::Purge => {
            let db = db::connect_from_env().await?;
            let deleted = queries::purge_expired(db.as_ref(), chrono::Utc::now()).await?;
            println!("Deleted {deleted} expired diagnoses");
        }
        Commands::Diseases => {
            for disease in Disease::all() {
                let name = disease.to_string();
                println!("{name:<14} kept for {}", disease.retention());
            }
        }
    }

    Ok(())
}

async fn serve(config: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    // actix-web brings its own runtime; run it on a blocking thread so it
    // doesn't nest inside this tokio runtime.
    tokio::task::spawn_blocking(move || {
        actix_web::rt::System::new()
            .block_on(disease_map_server::run_server(config.as_deref()))
            .map_err(|e| e.to_string())
    })
    .await?
    .map_err(Into::into)
}

fn prompt_command() -> Result<Commands, Box<dyn std::error::Error>> {
    println!("Disease Map");
    println!();

    let labels: Vec<&str> = Tool::ALL.iter().map(Tool::label).collect();
    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    Ok(match Tool::ALL[idx] {
        Tool::Heatmap => {
            let input: String = Input::new()
                .with_prompt("Diagnoses CSV path")
                .interact_text()?;
            let offline = Select::new()
                .with_prompt("Reverse geocoding")
                .items(&["Online", "Offline (all cities Unknown)"])
                .default(0)
                .interact()?
                == 1;
            Commands::Heatmap {
                input: PathBuf::from(input),
                disease: None,
                offline,
                config: None,
                cities_csv: None,
                ranked_csv: None,
            }
        }
        Tool::Serve => Commands::Serve { config: None },
        Tool::Purge => Commands::Purge,
        Tool::Diseases => Commands::Diseases,
    })
}

fn prompt_disease() -> Result<String, Box<dyn std::error::Error>> {
    let labels: Vec<String> = Disease::all().iter().map(ToString::to_string).collect();
    let idx = Select::new()
        .with_prompt("Select a disease")
        .items(&labels)
        .default(0)
        .interact()?;
    Ok(labels[idx].clone())
}
