use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use on_call_roster::display::{format_doctor_name, print_schedule, write_schedule_to_file};
use on_call_roster::schedule::HolidayRegistry;
use on_call_roster::{run_scheduling_for_year, web, Config, FileStore, RosterAdmin, RosterStore};

#[derive(Parser)]
#[command(name = "oncall", version, about = "Yearly on-call roster scheduler", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML config file; ONCALL_* variables are used when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Data directory holding doctors.csv, holidays.json and history.json
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true)]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a year, persist it and print it
    Run {
        year: i32,

        /// Seed for reproducible tie-breaks
        #[arg(short, long)]
        seed: Option<u64>,

        /// Also write the schedule to this text file
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// List the holidays that fall in a year
    Holidays { year: i32 },

    /// List the roster
    Doctors,

    /// Show stored assignments between two dates (YYYY-MM-DD)
    Show { start: NaiveDate, end: NaiveDate },

    /// Start the HTTP server
    Web {
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(dir) = cli.data_dir {
        config.data.dir = dir;
    }
    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }

    setup_tracing(&config, cli.verbose);

    let mut store = FileStore::open(&config.data.dir)
        .with_context(|| format!("Failed to open data directory {}", config.data.dir.display()))?;

    match cli.command {
        Commands::Run { year, seed, out } => {
            let mut rng = match seed.or(config.scheduling.seed) {
                Some(seed) => ChaCha8Rng::seed_from_u64(seed),
                None => ChaCha8Rng::from_entropy(),
            };
            tracing::info!(year, seed = ?seed, "Starting run command");

            let schedule = run_scheduling_for_year(&mut store, year, &mut rng, config.scheduling.run_options())
                .with_context(|| format!("Failed to schedule {}", year))?;

            print_schedule(&schedule, store.doctors());
            if let Some(path) = out {
                write_schedule_to_file(&schedule, store.doctors(), &path)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                println!("\nSchedule saved to {}", path.display());
            }
        }

        Commands::Holidays { year } => {
            let registry = HolidayRegistry::from_records(&store.load_holidays()?)
                .context("Invalid holidays.json")?;
            let holidays = registry.holidays_in_year(year);

            println!("=== Holidays {} ===", year);
            if holidays.is_empty() {
                println!("  (none)");
            }
            for (date, holiday) in holidays {
                println!("  {} {}", date, holiday.name);
            }
        }

        Commands::Doctors => {
            let doctors = store.load_doctors()?;
            println!("=== Doctors ({}) ===", doctors.len());
            for doctor in &doctors {
                let exempt = if doctor.is_holiday_exempt() { ", no holidays" } else { "" };
                println!(
                    "  - {}: rank {}{}, {} shifts on record",
                    format_doctor_name(&doctor.id, Some(&doctor.name)),
                    doctor.rank,
                    exempt,
                    doctor.history.len()
                );
            }
        }

        Commands::Show { start, end } => {
            let assignments = store.assignments_between(start, end)?;
            let names: HashMap<&str, &str> =
                store.doctors().iter().map(|d| (d.id.as_str(), d.name.as_str())).collect();

            println!("=== Assignments {} to {} ===", start, end);
            for saved in &assignments {
                let holiday = saved.holiday.as_deref().map(|h| format!(" [{}]", h)).unwrap_or_default();
                println!(
                    "  {}{} {}",
                    saved.date,
                    holiday,
                    format_doctor_name(&saved.doctor_id, names.get(saved.doctor_id.as_str()).copied())
                );
            }
        }

        Commands::Web { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            println!("Starting web server on {}:{}...", config.server.host, config.server.port);
            web::start_server(&config, Box::new(store)).await?;
        }
    }

    Ok(())
}

fn setup_tracing(config: &Config, verbose: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("on_call_roster=debug,oncall=debug,info")
        } else {
            EnvFilter::new(&config.logging.level)
        }
    });

    match config.logging.format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }
}
