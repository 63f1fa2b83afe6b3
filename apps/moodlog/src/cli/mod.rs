//! # Moodlog CLI Module
//!
//! This module implements the CLI interface for Moodlog.
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `today` - Show today's record (default)
//! - `log` - Record today's ratings
//! - `set` - Record ratings for any date
//! - `get` - Show the record for a date
//! - `delete` - Delete the record for a date
//! - `history` - List recent records
//! - `calendar` - Show the calendar grid
//! - `insights` - Per-dimension averages and trends
//! - `export` - Write the export envelope to a file or stdout
//! - `import` - Load records from an export or store document
//! - `init` - Create an empty store

mod commands;

use crate::config::{FileConfig, Overrides, Settings};
use crate::error::AppError;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Moodlog - daily mood tracker
///
/// One record per day, six dimensions rated from -2 to +2.
#[derive(Parser, Debug)]
#[command(name = "moodlog")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the mood store [default: data/db.json, or data/moodlog.redb for redb]
    #[arg(short = 'D', long, global = true)]
    pub database: Option<PathBuf>,

    /// Storage backend: "file" (JSON document) or "redb" (embedded database)
    #[arg(short = 'B', long, global = true)]
    pub backend: Option<String>,

    /// Config file [default: ./moodlog.toml if present]
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to [default: 127.0.0.1]
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to [default: 3001]
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Show today's record
    Today,

    /// Record today's ratings, e.g. `log overall=1 home=2 work=-1 health=0 sleep=1 social=2`
    Log {
        /// DIMENSION=VALUE pairs, one per dimension
        #[arg(required = true)]
        ratings: Vec<String>,
    },

    /// Record ratings for a specific date
    Set {
        /// Date (YYYY-MM-DD)
        date: String,

        /// DIMENSION=VALUE pairs, one per dimension
        #[arg(required = true)]
        ratings: Vec<String>,
    },

    /// Show the record for a date
    Get {
        /// Date (YYYY-MM-DD)
        date: String,
    },

    /// Delete the record for a date
    Delete {
        /// Date (YYYY-MM-DD)
        date: String,
    },

    /// List recent records, most recent first
    History {
        /// Maximum number of records [default: views.history_limit]
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Show the calendar grid ending today
    Calendar {
        /// Number of weeks [default: views.calendar_weeks]
        #[arg(short, long)]
        weeks: Option<u32>,
    },

    /// Per-dimension averages and trends over the rolling window
    Insights {
        /// Window length in weeks [default: views.calendar_weeks]
        #[arg(short, long)]
        weeks: Option<u32>,
    },

    /// Export every record
    Export {
        /// Output file path (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Import records from an export or store document
    Import {
        /// Input file path
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Initialize a new empty store
    Init {
        /// Replace an existing store
        #[arg(short, long)]
        force: bool,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), AppError> {
    let (host, port) = match &cli.command {
        Some(Commands::Server { host, port }) => (host.clone(), *port),
        _ => (None, None),
    };

    let file = FileConfig::load(cli.config.as_deref())?;
    let settings = Settings::resolve(
        file,
        Overrides {
            database: cli.database,
            backend: cli.backend,
            host,
            port,
        },
    )?;
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Server { .. }) => cmd_server(&settings).await,
        Some(Commands::Today) | None => cmd_today(&settings, json_mode),
        Some(Commands::Log { ratings }) => cmd_log(&settings, json_mode, &ratings),
        Some(Commands::Set { date, ratings }) => cmd_set(&settings, json_mode, &date, &ratings),
        Some(Commands::Get { date }) => cmd_get(&settings, json_mode, &date),
        Some(Commands::Delete { date }) => cmd_delete(&settings, json_mode, &date),
        Some(Commands::History { limit }) => {
            cmd_history(&settings, json_mode, limit.unwrap_or(settings.history_limit))
        }
        Some(Commands::Calendar { weeks }) => {
            cmd_calendar(&settings, json_mode, weeks.unwrap_or(settings.calendar_weeks))
        }
        Some(Commands::Insights { weeks }) => {
            cmd_insights(&settings, json_mode, weeks.unwrap_or(settings.calendar_weeks))
        }
        Some(Commands::Export { output }) => cmd_export(&settings, output.as_deref()),
        Some(Commands::Import { input }) => cmd_import(&settings, json_mode, &input),
        Some(Commands::Init { force }) => cmd_init(&settings, force),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "moodlog", "history", "-n", "5", "--backend", "redb", "--json-mode",
        ])
        .expect("parse");
        assert_eq!(cli.backend.as_deref(), Some("redb"));
        assert!(cli.json_mode);
        assert!(matches!(cli.command, Some(Commands::History { limit: Some(5) })));
    }

    #[test]
    fn log_requires_ratings() {
        assert!(Cli::try_parse_from(["moodlog", "log"]).is_err());
    }

    #[test]
    fn negative_rating_values_parse_as_positionals() {
        let cli = Cli::try_parse_from(["moodlog", "set", "2024-03-13", "work=-1", "home=2"])
            .expect("parse");
        assert!(matches!(
            cli.command,
            Some(Commands::Set { ref date, ref ratings })
                if date == "2024-03-13" && ratings == &["work=-1", "home=2"]
        ));
    }
}
