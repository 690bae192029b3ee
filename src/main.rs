mod config;
mod db;
mod error;
mod models;
mod operations;
mod session;
mod workspace;

use clap::Parser;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use crate::config::Settings;
use crate::db::repository::LoadOutcome;
use crate::session::{Console, SessionEnd};
use crate::workspace::Workspace;

#[derive(Parser, Debug)]
#[command(name = "bve", version, about = "Team budget and expense ledger")]
struct Cli {
    /// Settings file (defaults to ./bve.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// SQLite database holding the ledger
    #[arg(long, env = "BVE_DATABASE")]
    database: Option<PathBuf>,
}

fn init_tracing(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_writer(io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match Settings::load(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Failed to load settings: {}", e);
            return ExitCode::FAILURE;
        }
    };
    init_tracing(&settings.logging.level);

    let database = cli
        .database
        .unwrap_or_else(|| settings.storage.database.clone());
    let conn = match db::connection::establish_connection(&database) {
        Ok(conn) => conn,
        Err(e) => {
            eprintln!("Failed to open {}: {}", database.display(), e);
            return ExitCode::FAILURE;
        }
    };
    let (mut workspace, outcome) = match Workspace::open(conn, &settings.storage.slot_key) {
        Ok(opened) => opened,
        Err(e) => {
            eprintln!("Failed to load the ledger: {}", e);
            return ExitCode::FAILURE;
        }
    };

    println!("Welcome to the budget ledger!");
    match outcome {
        LoadOutcome::Loaded => {}
        LoadOutcome::Seeded => println!("No saved data found. Sample organization installed."),
        LoadOutcome::Recovered { reason } => println!(
            "Saved data could not be read ({}). Sample organization installed.",
            reason
        ),
    }

    let mut console = Console::new(io::stdin().lock());
    while let Some(session) = session::login(&mut console, &workspace) {
        match session::run_session(&mut console, &mut workspace, &settings, &session) {
            SessionEnd::Logout => session::logout(&mut workspace, &session),
            SessionEnd::Reload => {}
            SessionEnd::Exit => break,
        }
    }

    if let Err(e) = workspace.save() {
        eprintln!("Failed to save the ledger: {}", e);
        return ExitCode::FAILURE;
    }
    println!("Exiting the application.");
    ExitCode::SUCCESS
}
