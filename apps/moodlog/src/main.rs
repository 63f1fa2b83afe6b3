//! # Moodlog - Daily Mood Tracker
//!
//! The main binary for Moodlog.
//!
//! This application provides:
//! - HTTP REST API server (axum-based)
//! - CLI interface for logging and reviewing moods
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │            apps/moodlog (THE BINARY)          │
//! │                                               │
//! │   ┌─────────────┐         ┌─────────────┐     │
//! │   │    CLI      │         │  HTTP API   │     │
//! │   │   (clap)    │         │   (axum)    │     │
//! │   └──────┬──────┘         └──────┬──────┘     │
//! │          └───────────┬───────────┘            │
//! │                      ▼                        │
//! │              ┌───────────────┐                │
//! │              │ moodlog-core  │                │
//! │              │  (THE LOGIC)  │                │
//! │              └───────────────┘                │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server
//! moodlog server --host 127.0.0.1 --port 3001
//!
//! # CLI operations
//! moodlog log overall=1 home=2 work=-1 health=0 sleep=1 social=2
//! moodlog history -n 7
//! moodlog calendar --weeks 12
//! ```

use clap::Parser;
use moodlog::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();

    // MOODLOG_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("MOODLOG_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let default_filter = if cli.verbose {
        "moodlog=debug,moodlog_core=debug,tower_http=debug"
    } else {
        "moodlog=info,moodlog_core=info,tower_http=debug"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the Moodlog startup banner to stderr; stdout carries command output.
fn print_banner() {
    eprintln!(
        r#"
  ┌┬┐┌─┐┌─┐┌┬┐┬  ┌─┐┌─┐
  ││││ ││ │ │││  │ ││ ┬
  ┴ ┴└─┘└─┘─┴┘┴─┘└─┘└─┘

  Daily Mood Tracker v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
