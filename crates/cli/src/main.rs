//! LoggerForge CLI entry point.
//!
//! Commands:
//! - `build`        Assemble a program file into a datalogger program
//! - `instruments`  List the instrument catalog
//! - `describe`     Show what one instrument contributes
//! - `check`        Run a program through the external compiler
//! - `config`       Validate or show the configuration

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "loggerforge",
    about = "LoggerForge: datalogger program assembly",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble a program file (.toml or .json)
    Build {
        /// Program definition file
        file: PathBuf,

        /// Write the program here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Header date (YYYY-MM-DD); defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Run the external compile check on the result
        #[arg(long)]
        check: bool,
    },

    /// List available instrument types
    Instruments {
        /// Machine-readable output
        #[arg(long)]
        json: bool,
    },

    /// Describe a single instrument type
    Describe {
        /// Instrument type id, e.g. Setra_CS100
        type_id: String,

        /// SDI-12 address
        #[arg(long)]
        sdi12: Option<String>,

        /// Elevation in centimetres
        #[arg(long, allow_hyphen_values = true)]
        elevation: Option<i32>,

        /// Instrument parameter as key=value (repeatable)
        #[arg(long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,
    },

    /// Check an existing program with the configured compiler
    Check {
        /// Program file to check
        file: PathBuf,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Load and validate the configuration
    Validate,
    /// Print the effective configuration
    Show,
    /// Print the configuration file path
    Path,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout carries only the program.
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Build {
            file,
            output,
            date,
            check,
        } => commands::build::run(file, output, date, check).await?,
        Commands::Instruments { json } => commands::instruments::run(json)?,
        Commands::Describe {
            type_id,
            sdi12,
            elevation,
            params,
        } => commands::describe::run(&type_id, sdi12, elevation, &params)?,
        Commands::Check { file } => commands::check::run(file).await?,
        Commands::Config { action } => match action {
            ConfigAction::Validate => commands::config_cmd::validate()?,
            ConfigAction::Show => commands::config_cmd::show()?,
            ConfigAction::Path => commands::config_cmd::path(),
        },
    }

    Ok(())
}
