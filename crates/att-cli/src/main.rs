use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use att_cli::commands::{self, clock, employee, export, init, log, report};
use att_cli::{Cli, ClockAction, Commands, Config, EmployeeAction};
use att_core::{ClockKind, EmployeeId};

/// Load config and open database, ensuring the parent directory exists.
fn open_database(config_path: Option<&Path>) -> Result<(att_db::Database, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = att_db::Database::open(&config.database_path).context("failed to open database")?;
    Ok((db, config))
}

fn parse_scope(employee: Option<&str>) -> Result<Option<EmployeeId>> {
    employee
        .map(|raw| EmployeeId::new(raw).context("invalid employee ID"))
        .transpose()
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    match &cli.command {
        Some(Commands::Init) => {
            let (db, config) = open_database(cli.config.as_deref())?;
            init::run(&db, &config.database_path)?;
        }
        Some(Commands::Employee { action }) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            match action {
                EmployeeAction::Add {
                    name,
                    surname,
                    admin,
                } => employee::add(&db, name, surname, *admin)?,
                EmployeeAction::List { json } => employee::list(&db, *json)?,
                EmployeeAction::Update {
                    id,
                    name,
                    surname,
                    role,
                } => employee::update(
                    &db,
                    id,
                    name.as_deref(),
                    surname.as_deref(),
                    role.as_deref(),
                )?,
                EmployeeAction::Remove { id } => employee::remove(&db, id)?,
            }
        }
        Some(Commands::Clock { action }) => {
            let (db, config) = open_database(cli.config.as_deref())?;
            let (kind, args) = match action {
                ClockAction::In { args } => (ClockKind::In, args),
                ClockAction::Out { args } => (ClockKind::Out, args),
            };
            clock::run(&db, &config, kind, args)?;
        }
        Some(Commands::Log {
            employee,
            window,
            json,
        }) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            let scope = parse_scope(employee.as_deref())?;
            let resolved = commands::resolve_window(window, scope.is_some());
            log::run(&db, scope.as_ref(), resolved, *json)?;
        }
        Some(Commands::Report {
            employee,
            window,
            json,
        }) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            let scope = parse_scope(employee.as_deref())?;
            let resolved = commands::resolve_window(window, scope.is_some());
            report::run(&db, scope.as_ref(), resolved, *json)?;
        }
        Some(Commands::Export {
            employee,
            window,
            output,
        }) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            let scope = parse_scope(employee.as_deref())?;
            let resolved = commands::resolve_window(window, scope.is_some());
            export::run(&db, scope.as_ref(), resolved, output)?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
