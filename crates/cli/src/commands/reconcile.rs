// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The reconcile command.

use anyhow::{Context, Result};
use clap::Args;
use spindle_reconcile::Reconciler;
use spindle_store::EventStore;
use std::path::{Path, PathBuf};

#[derive(Args)]
pub struct ReconcileArgs {
    /// Project root to reconcile (default: --project, then the current directory)
    pub project_path: Option<PathBuf>,
}

pub fn handle(args: ReconcileArgs, db_path: &Path, project: Option<&Path>) -> Result<()> {
    let root = match args.project_path.or_else(|| project.map(Path::to_path_buf)) {
        Some(root) => root,
        None => std::env::current_dir().context("cannot resolve current directory")?,
    };

    let store = EventStore::open(db_path)
        .with_context(|| format!("cannot open events database at {}", db_path.display()))?;
    let summary = Reconciler::new(store)
        .reconcile_project(&root)
        .with_context(|| format!("reconcile failed for {}", root.display()))?;

    println!(
        "Specs: {} seen, {} events",
        summary.specs_seen, summary.spec_events
    );
    println!(
        "Tasks: {} seen, {} events",
        summary.tasks_seen, summary.task_events
    );
    println!("Conflicts: {}", summary.conflicts);
    Ok(())
}
