mod cli;
mod commands;
mod config;
mod error;
mod logging;
mod utils;

use crate::cli::{Cli, Commands};
use crate::error::Result;
use clap::Parser;
use tracing::{debug, error, info};

fn main() {
    if let Err(e) = run_app() {
        eprintln!("\n❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn run_app() -> Result<()> {
    let cli = Cli::parse();
    logging::setup_logging(cli.verbose, cli.quiet, cli.log_file.as_deref())?;

    info!("🚀 BRER CLI v{} starting up.", env!("CARGO_PKG_VERSION"));
    debug!("Full CLI arguments parsed: {:?}", &cli);

    let command_result = match cli.command {
        Commands::Init(args) => {
            info!("Dispatching to 'init' command.");
            commands::init::run(args)
        }
        Commands::Show { state } => {
            info!("Dispatching to 'show' command.");
            commands::state::show(&state)
        }
        Commands::Get(args) => {
            info!("Dispatching to 'get' command.");
            commands::state::get(args)
        }
        Commands::Set(args) => {
            info!("Dispatching to 'set' command.");
            commands::state::set(args)
        }
        Commands::Advance { state } => {
            info!("Dispatching to 'advance' command.");
            commands::advance::run(&state)
        }
    };

    match &command_result {
        Ok(_) => info!("✅ Command completed successfully."),
        Err(e) => error!("❌ Command failed: {}", e),
    }

    command_result
}
