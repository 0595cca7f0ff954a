//! tbread - terminal reader for the textbook platform

mod api;
mod cli;
mod commands;
mod config;
mod copy;
mod error;
mod highlight;
mod input;
mod logging;
mod markup;
mod navigation;
mod reader;
mod render;
mod session;
mod terminal;

use std::process;

use clap::Parser;

use cli::{AdminCommand, Cli, Command};
use config::Config;
use error::Result;
use logging::{init_logging, LogConfig};
use session::Session;

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let config_path = cli.config.clone().or_else(Config::config_path);
    if let Some(url) = &cli.api_url {
        config.set_api_url(url);
    }

    // The interactive reader owns the terminal, so it logs to a file
    let log_file = match &cli.command {
        Command::Read(_) => config.log_path(),
        _ => None,
    };
    let log_config = LogConfig::from_verbosity(cli.verbose).with_log_file(log_file);
    init_logging(&log_config)?;

    let mut session = match Session::default_path() {
        Some(path) => Session::load(path)?,
        None => Session::ephemeral(None),
    };
    tracing::debug!(signed_in = session.is_signed_in(), api = %config.api_url, "session loaded");

    match &cli.command {
        Command::Read(args) => commands::run_read(&config, &session, args),
        Command::Library => commands::run_library(&config, &session),
        Command::Topic(args) => commands::run_topic(&config, &session, args),
        Command::Login { token } => commands::run_login(&mut session, token),
        Command::Logout => commands::run_logout(&mut session),
        Command::Rate {
            textbook_id,
            rating,
        } => commands::run_rate(&config, &session, textbook_id, *rating),
        Command::Admin {
            command: AdminCommand::Categories { command },
        } => commands::run_categories(&config, &session, command),
        Command::Config { init } => commands::run_config(&config, config_path.as_deref(), *init),
    }
}
