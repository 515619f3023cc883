//! roster CLI - students, projects and the links between them.
//!
//! Each invocation is one unit of work on its own database connection.
//! Successful results go to stdout as JSON; failures go to stderr and set
//! an exit code derived from the error kind.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{error, info};
use roster_core::db::open_db;
use roster_core::dto::DEFAULT_PAGE_NUMBER;
use roster_core::{
    init_logging, ErrorKind, Project, ProjectDto, RosterConfig, ServiceError, Student, StudentDto,
};

mod commands;

#[derive(Parser, Debug)]
#[command(
    name = "roster",
    author,
    version,
    about = "Manage students, projects and the links between them"
)]
struct Cli {
    /// TOML config file (db_path, log_level, log_dir, page_size)
    #[arg(long, global = true, env = "ROSTER_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    /// SQLite database file; overrides the config
    #[arg(long, global = true, env = "ROSTER_DB", value_name = "PATH")]
    db: Option<PathBuf>,

    /// trace|debug|info|warn|error; overrides the config
    #[arg(long, global = true, env = "ROSTER_LOG_LEVEL")]
    log_level: Option<String>,

    /// Absolute directory for rolling log files; logging is off without one
    #[arg(long, global = true, env = "ROSTER_LOG_DIR", value_name = "DIR")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Student records; linked entities are projects
    #[command(subcommand)]
    Student(EntityCommand),
    /// Project records; linked entities are students
    #[command(subcommand)]
    Project(EntityCommand),
}

#[derive(Subcommand, Debug)]
pub(crate) enum EntityCommand {
    /// Create a record, linking (and creating when missing) the named entities
    Add {
        name: String,
        /// Name of an entity to link; repeatable, at least one
        #[arg(
            long = "link",
            visible_aliases = ["project", "student"],
            value_name = "NAME"
        )]
        links: Vec<String>,
    },
    /// Fetch one record
    Get { id: uuid::Uuid },
    /// List one page of records
    List {
        /// 1-based page number
        #[arg(long, default_value_t = DEFAULT_PAGE_NUMBER, allow_negative_numbers = true)]
        page: i64,
        /// Defaults to the configured page size
        #[arg(long, allow_negative_numbers = true)]
        page_size: Option<i64>,
    },
    /// Replace name and links from a JSON body carrying the same id
    Update {
        id: uuid::Uuid,
        /// e.g. '{"studentId": "...", "name": "Ann", "projectNames": ["Alpha"]}'
        #[arg(long, value_name = "JSON")]
        body: String,
    },
    /// Delete a record; linked entities are kept
    Delete { id: uuid::Uuid },
    /// Records linked to this one
    Linked { id: uuid::Uuid },
    /// Number of linked records; 0 for an unknown id
    Count { id: uuid::Uuid },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => report(&err),
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = resolve_config(&cli)?;
    if let Some(log_dir) = &config.log_dir {
        init_logging(&config.log_level, log_dir).context("failed to start logging")?;
    }

    let conn = open_db(&config.db_path)
        .with_context(|| format!("failed to open database `{}`", config.db_path.display()))?;
    info!(
        "event=cli_command module=cli status=start command={:?}",
        cli.command
    );

    match cli.command {
        Commands::Student(command) => {
            commands::run_entity::<Student, StudentDto, ProjectDto>(&conn, &config, command)
        }
        Commands::Project(command) => {
            commands::run_entity::<Project, ProjectDto, StudentDto>(&conn, &config, command)
        }
    }
}

fn resolve_config(cli: &Cli) -> Result<RosterConfig> {
    let mut config = match &cli.config {
        Some(path) => RosterConfig::load(path)?,
        None => RosterConfig::default(),
    };
    if let Some(db) = &cli.db {
        config.db_path = db.clone();
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(dir) = &cli.log_dir {
        config.log_dir = Some(dir.clone());
    }
    Ok(config)
}

fn report(err: &anyhow::Error) -> ExitCode {
    let Some(service_err) = err.downcast_ref::<ServiceError>() else {
        eprintln!("error: {err:#}");
        return ExitCode::FAILURE;
    };

    let kind = service_err.kind();
    error!(
        "event=cli_command module=cli status=error error_kind={} error={}",
        kind, service_err
    );
    let body = serde_json::json!({
        "error": kind.label(),
        "status": kind.http_status(),
        "message": service_err.public_message(),
    });
    eprintln!("{body}");
    ExitCode::from(exit_code(kind))
}

fn exit_code(kind: ErrorKind) -> u8 {
    match kind {
        ErrorKind::InvalidArgument => 2,
        ErrorKind::NotFound => 3,
        ErrorKind::Conflict => 4,
        ErrorKind::Store => 5,
    }
}
