//! # KuBel - Developmental Milestone Evaluation
//!
//! The main binary for KuBel.
//!
//! This application provides:
//! - HTTP REST API server (axum-based) for a presentation layer
//! - CLI interface for people, evaluations, charts and reports
//! - Update check against the published release manifest
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      apps/kubel (THE BINARY)                    │
//! │                                                                 │
//! │  ┌─────────────┐    ┌─────────────┐    ┌──────────────────┐   │
//! │  │   CLI       │    │   HTTP API  │    │  Update check    │   │
//! │  │  (clap)     │    │   (axum)    │    │  (reqwest)       │   │
//! │  └──────┬──────┘    └──────┬──────┘    └────────┬─────────┘   │
//! │         │                  │                    │              │
//! │         └─────────┬────────┘                    │              │
//! │                   ▼                             ▼              │
//! │           ┌───────────────┐            ┌───────────────┐      │
//! │           │  FileGateway  │            │  kubel-core   │      │
//! │           │  (data dir)   │───────────▶│ (THE LOGIC)   │      │
//! │           └───────────────┘            └───────────────┘      │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server
//! kubel server --host 127.0.0.1 --port 8080
//!
//! # CLI operations
//! kubel people
//! kubel add "Mia"
//! kubel select <id> motor 3 0 do
//! kubel report <id>
//! ```

use clap::Parser;
use kubel::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // KUBEL_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("KUBEL_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "kubel=info,tower_http=debug".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the KuBel startup banner.
fn print_banner() {
    println!(
        r#"
  ██╗  ██╗██╗   ██╗██████╗ ███████╗██╗
  ██║ ██╔╝██║   ██║██╔══██╗██╔════╝██║
  █████╔╝ ██║   ██║██████╔╝█████╗  ██║
  ██╔═██╗ ██║   ██║██╔══██╗██╔══╝  ██║
  ██║  ██╗╚██████╔╝██████╔╝███████╗███████╗
  ╚═╝  ╚═╝ ╚═════╝ ╚═════╝ ╚══════╝╚══════╝

  Developmental Milestone Evaluation v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
