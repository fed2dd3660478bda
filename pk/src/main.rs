// External crates
use clap::Parser;
use tracing::debug;

// Local modules
mod cli;
mod commands;
mod config;

use cli::Args;
use commands::execute_command;
use pk_core::pk_error;

fn main() {
    if pk_core::logging::init().is_err() {
        eprintln!("warning: failed to initialize logging");
    }

    let args = Args::parse();
    debug!(command = ?args.command, "starting pk");

    if let Err(e) = execute_command(&args) {
        pk_error!("{}", e);
        std::process::exit(e.exit_code());
    }
}
