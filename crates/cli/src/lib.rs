pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use crate::commands::analyze::AnalyzeArgs;

#[derive(Debug, Parser)]
#[command(
    name = "brandlens",
    about = "Brandlens operator CLI",
    long_about = "Run audience analyses over local files, inspect effective configuration, and check readiness.",
    after_help = "Examples:\n  brandlens analyze --brand-name Acme --gender gender.csv --age age.csv\n  brandlens doctor --json --probe\n  brandlens config"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Run the audience analysis pipeline over local CSV files and print the report")]
    Analyze(AnalyzeArgs),
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, upload storage, and analysis credential readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
        #[arg(long, help = "Call the analysis service to verify the credential")]
        probe: bool,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    let result = match cli.command {
        Command::Analyze(args) => commands::analyze::run(args),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json, probe } => commands::doctor::run(json, probe),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
