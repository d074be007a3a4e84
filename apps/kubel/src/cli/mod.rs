//! # KuBel CLI Module
//!
//! This module implements the CLI interface for KuBel.
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `init` - Prepare the data directory
//! - `people` - List people
//! - `add` / `rename` / `delete` - Manage people
//! - `show` - Show one person with all phase results
//! - `select` - Click an entry (toggle + auto-completion)
//! - `birthday` / `note` / `display` - Edit person details
//! - `chart` - Development chart values
//! - `report` - Printable text report
//! - `sync` - Reconcile stored evaluations with the category definitions
//! - `config` - Show or change the people list order
//! - `update` - Check for a newer release

mod commands;

use clap::{Parser, Subcommand};
use kubel_core::{KubelError, Selection};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// KuBel - Developmental Milestone Evaluation
///
/// Records per-phase checklist evaluations for children and turns them
/// into phase results, a development chart and printable reports.
#[derive(Parser, Debug)]
#[command(name = "kubel")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Data directory (default: KUBEL_DATA_DIR or the platform data directory)
    #[arg(short = 'D', long, global = true)]
    pub data_dir: Option<PathBuf>,

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
        /// Host to bind to
        #[arg(short = 'H', long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },

    /// Create the data directory and copy bundled files
    Init {
        /// Directory holding bundled data.json/categories.json
        #[arg(short, long)]
        resources: Option<PathBuf>,
    },

    /// List people in the configured order
    People,

    /// Add a person with an empty evaluation
    Add {
        /// Display name
        name: String,
    },

    /// Rename a person
    Rename {
        /// Person id
        id: String,
        /// New display name
        name: String,
    },

    /// Delete a person
    Delete {
        /// Person id
        id: String,
    },

    /// Show a person with all phase results
    Show {
        /// Person id
        id: String,
    },

    /// Click an entry: toggles the selection and applies auto-completion
    Select {
        /// Person id
        id: String,
        /// Category id
        category: String,
        /// Phase id
        phase: String,
        /// Entry index within the phase (0-based)
        entry: usize,
        /// do, partially, dont, unknown (or -1..=3)
        selection: Selection,
    },

    /// Set the birthday (dd.mm.yyyy); without a value it is cleared
    Birthday {
        /// Person id
        id: String,
        /// Birthday as dd.mm.yyyy
        birthday: Option<String>,
    },

    /// Set the free-text note; an empty note removes it
    Note {
        /// Person id
        id: String,
        /// Note text
        note: String,
    },

    /// Change chart display settings
    Display {
        /// Person id
        id: String,
        /// Horizontal baseline of the chart
        #[arg(long)]
        baseline: Option<f64>,
        /// Lower bound of the chart's value axis (0-18)
        #[arg(long)]
        min_value: Option<f64>,
    },

    /// Development chart values
    Chart {
        /// Person id
        id: String,
    },

    /// Printable text report with the default print options
    Report {
        /// Person id
        id: String,
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Reconcile all people with the category definitions and save
    Sync,

    /// Show or change the people list order
    Config {
        /// name or birthday
        #[arg(long)]
        order: Option<String>,
        /// asc or desc
        #[arg(long)]
        orderdir: Option<String>,
    },

    /// Check for a newer release (never installs)
    Update {
        /// Manifest URL (default: KUBEL_UPDATE_URL or the release feed)
        #[arg(long)]
        url: Option<String>,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), KubelError> {
    let dir = crate::storage::resolve_data_dir(cli.data_dir.as_deref());
    let json_mode = cli.json_mode;

    if cli.verbose {
        tracing::info!(dir = %dir.display(), "Using data directory");
    }

    match cli.command {
        Some(Commands::Server { host, port }) => cmd_server(&dir, &host, port).await,
        Some(Commands::Init { resources }) => cmd_init(&dir, resources.as_deref(), json_mode),
        Some(Commands::People) | None => cmd_people(&dir, json_mode),
        Some(Commands::Add { name }) => cmd_add(&dir, &name, json_mode),
        Some(Commands::Rename { id, name }) => cmd_rename(&dir, &id, &name, json_mode),
        Some(Commands::Delete { id }) => cmd_delete(&dir, &id, json_mode),
        Some(Commands::Show { id }) => cmd_show(&dir, &id, json_mode),
        Some(Commands::Select {
            id,
            category,
            phase,
            entry,
            selection,
        }) => cmd_select(&dir, &id, &category, &phase, entry, selection, json_mode),
        Some(Commands::Birthday { id, birthday }) => {
            cmd_birthday(&dir, &id, birthday.as_deref(), json_mode)
        }
        Some(Commands::Note { id, note }) => cmd_note(&dir, &id, &note, json_mode),
        Some(Commands::Display {
            id,
            baseline,
            min_value,
        }) => cmd_display(&dir, &id, baseline, min_value, json_mode),
        Some(Commands::Chart { id }) => cmd_chart(&dir, &id, json_mode),
        Some(Commands::Report { id, output }) => {
            cmd_report(&dir, &id, output.as_deref(), json_mode)
        }
        Some(Commands::Sync) => cmd_sync(&dir, json_mode),
        Some(Commands::Config { order, orderdir }) => {
            cmd_config(&dir, order.as_deref(), orderdir.as_deref(), json_mode)
        }
        Some(Commands::Update { url }) => cmd_update(url, json_mode).await,
    }
}
