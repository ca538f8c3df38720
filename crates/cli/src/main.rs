// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! spindle - event spine CLI

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{events, reconcile};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "spindle",
    version,
    about = "Spindle - the event spine of the workbench tools"
)]
struct Cli {
    /// Event database path (default: $SPINDLE_EVENTS_DB or ~/.spindle/events.db)
    #[arg(long = "events-db", global = true, value_name = "PATH")]
    events_db: Option<PathBuf>,

    /// Project root to scope queries and reconciliation to
    #[arg(long = "project", global = true, value_name = "PATH")]
    project: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Query the event log
    Events(events::EventsArgs),
    /// Reconcile a project's spec and task files into events
    Reconcile(reconcile::ReconcileArgs),
}

fn main() {
    init_tracing();
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

/// Log to stderr, controlled by RUST_LOG (quiet by default).
fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("off"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let db_path = cli
        .events_db
        .unwrap_or_else(spindle_store::default_db_path);

    match cli.command {
        Commands::Events(args) => events::handle(args.command, &db_path, cli.project.as_deref()),
        Commands::Reconcile(args) => reconcile::handle(args, &db_path, cli.project.as_deref()),
    }
}
