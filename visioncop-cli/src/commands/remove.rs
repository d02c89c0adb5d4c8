//! Remove command implementation.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use colored::Colorize;
use serde::Serialize;
use tracing::{info, warn};

use crate::exit_codes::ExitCode;
use crate::utils::{index_id, open_engine, print_json, Output};

#[derive(Serialize)]
struct RemoveSummary {
    removed: Vec<String>,
    missing: Vec<String>,
    total: usize,
}

/// Drop entries by path. Paths that no longer exist are matched by the id
/// they were stored under.
pub fn execute(index: &Path, paths: Vec<PathBuf>, output: Output) -> Result<ExitCode> {
    let engine = open_engine(index)?;
    let mut summary = RemoveSummary {
        removed: Vec::new(),
        missing: Vec::new(),
        total: 0,
    };

    for path in &paths {
        let id = index_id(path);
        if engine.remove(&id)? {
            if output.human() {
                println!("{} {}", "-".red(), id);
            }
            summary.removed.push(id);
        } else {
            warn!(id = %id, "Not in the index");
            summary.missing.push(id);
        }
    }
    summary.total = engine.len();
    info!(
        removed = summary.removed.len(),
        total = summary.total,
        "Removal finished"
    );

    if output.json {
        print_json(&summary)?;
    } else if !output.quiet && !summary.removed.is_empty() {
        println!();
        println!(
            "Removed {} image(s), {} left in index",
            summary.removed.len().to_string().bold(),
            summary.total
        );
    }

    if summary.removed.is_empty() {
        bail!("Not in the index: {}", summary.missing.join(", "));
    }
    Ok(ExitCode::success())
}
