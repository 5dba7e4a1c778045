//! PDF Split Binary
//!
//! Entry point for the `pdf-split` command-line tool.

mod cli;

use clap::{CommandFactory, Parser};
use cli::Args;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> ExitCode {
    let args = Args::parse();

    // Logs go to stderr so stdout stays clean for --json
    tracing_subscriber::registry()
        .with(log_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let Some(mode) = args.mode.clone() else {
        let _ = Args::command().print_help();
        return ExitCode::SUCCESS;
    };

    tracing::info!("Starting pdf-split v{}", env!("CARGO_PKG_VERSION"));

    let report = match cli::execute(&args, &mode) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    if args.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error: failed to serialize report: {}", e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        print!("{}", cli::render_summary(&report));
    }

    ExitCode::SUCCESS
}

/// `RUST_LOG` directives when set and valid, `info` otherwise
fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .filter(|d| !d.trim().is_empty())
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}
