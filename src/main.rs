//! Plant Diagnostics CLI
//!
//! Runs the waste, machine health and leak diagnostics against plant data.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rusqlite::Connection;
use serde_json::json;

use plant_diagnostics::models::{NetworkSnapshot, Pipe};
use plant_diagnostics::network::BaselinePolicy;
use plant_diagnostics::{db, ingest, machines, waste, Config};

#[derive(Parser)]
#[command(name = "plant-diagnostics")]
#[command(about = "Process-efficiency diagnostics for water/production plants")]
struct Cli {
    /// Directory holding the plant data files
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Path to the SQLite database (defaults to <data-dir>/diagnostics.db)
    #[arg(short, long)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Invisible waste per batch, machine and shift
    Waste {
        /// Batch CSV (defaults to <data-dir>/production_data.csv)
        file: Option<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Mass/energy balance and repair recommendations per machine
    Machines {
        /// Telemetry JSON (defaults to <data-dir>/machine_health.json)
        file: Option<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Load or save the pipe network snapshot
    Network {
        #[command(subcommand)]
        action: NetworkAction,
    },

    /// Initialize empty database with schema
    Init,

    /// Store a sample network snapshot for testing
    LoadSample,
}

#[derive(Subcommand)]
enum NetworkAction {
    /// Print the stored snapshot as JSON
    Load,

    /// Detect leaks on a network payload and store it
    Save {
        /// Network payload JSON with `nodes` and `pipes`
        file: PathBuf,

        /// Refuse to save unless the stored snapshot has this version
        #[arg(long)]
        expect_version: Option<i64>,

        /// Where pipe baselines come from
        #[arg(long, value_enum, default_value_t = BaselinePolicy::Payload)]
        baseline: BaselinePolicy,
    },

    /// Remove the stored snapshot
    Clear,
}

fn main() -> Result<()> {
    plant_diagnostics::init_logging();
    let cli = Cli::parse();

    let mut config = Config::new(&cli.data_dir);
    if let Some(database) = cli.database {
        config = config.with_database(database);
    }

    match cli.command {
        Commands::Waste { file, json } => {
            let path = file.unwrap_or_else(|| config.production_csv());
            let batches = ingest::read_batches(&path)
                .with_context(|| format!("Failed to read batch records from {}", path.display()))?;
            let report = waste::analyze(&batches)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", report);
            }
        }

        Commands::Machines { file, json } => {
            let path = file.unwrap_or_else(|| config.machine_json());
            let telemetry = ingest::read_machines(&path)
                .with_context(|| format!("Failed to read machine telemetry from {}", path.display()))?;
            let results = machines::evaluate(&telemetry)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                println!("{}", machines::MachineReport(&results));
            }
        }

        Commands::Network { action } => {
            let mut conn = open_database(&config)?;
            match action {
                NetworkAction::Load => {
                    let snapshot = db::load_network(&conn)?;
                    println!("{}", serde_json::to_string_pretty(&snapshot)?);
                }

                NetworkAction::Save {
                    file,
                    expect_version,
                    baseline,
                } => {
                    config = config.with_baseline_policy(baseline);
                    let payload = ingest::read_network(&file)
                        .with_context(|| format!("Failed to read network payload from {}", file.display()))?;
                    let outcome =
                        db::save_network(&mut conn, payload, config.baseline_policy, expect_version)?;

                    println!(
                        "{}",
                        json!({
                            "status": "saved",
                            "version": outcome.version,
                            "pipes": outcome.pipes,
                            "leaks": outcome.leaks,
                        })
                    );
                }

                NetworkAction::Clear => {
                    db::clear_snapshot(&conn)?;
                    println!("Network snapshot cleared");
                }
            }
        }

        Commands::Init => {
            open_database(&config)?;
            println!("Database initialized at: {}", config.database.display());
        }

        Commands::LoadSample => {
            let mut conn = open_database(&config)?;
            let outcome = db::save_network(&mut conn, sample_network(), BaselinePolicy::Payload, None)?;
            println!(
                "Loaded sample network: {} pipes, {} leaking (version {})",
                outcome.pipes, outcome.leaks, outcome.version
            );
        }
    }

    Ok(())
}

fn open_database(config: &Config) -> Result<Connection> {
    if let Some(parent) = config.database.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
    }

    let conn = Connection::open(&config.database)
        .with_context(|| format!("Failed to open database {}", config.database.display()))?;
    db::init_schema(&conn)?;
    Ok(conn)
}

/// Small distribution network: reservoir feeding two districts through a pump station
fn sample_network() -> NetworkSnapshot {
    NetworkSnapshot {
        nodes: vec![
            json!({"id": "Reservoir", "kind": "source"}),
            json!({"id": "PumpStation", "kind": "pump"}),
            json!({"id": "DistrictNorth", "kind": "consumer"}),
            json!({"id": "DistrictSouth", "kind": "consumer"}),
        ],
        pipes: vec![
            Pipe::new("Reservoir", "PumpStation", 120.0, 4.5, 4.4),
            Pipe::new("PumpStation", "DistrictNorth", 70.0, 3.8, 3.6),
            Pipe::new("PumpStation", "DistrictSouth", 50.0, 3.8, 2.4), // drops below 70%
        ],
    }
}
