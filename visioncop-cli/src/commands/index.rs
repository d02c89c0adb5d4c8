//! Index command implementation.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use colored::Colorize;
use serde::Serialize;
use tracing::{info, warn};
use visioncop_core::{ImageHandle, Verifier};

use crate::exit_codes::ExitCode;
use crate::utils::{collect_images, index_id, open_engine, print_json, Output};

#[derive(Serialize)]
struct IndexSummary {
    indexed: Vec<String>,
    failed: Vec<FailedFile>,
    total: usize,
}

#[derive(Serialize)]
struct FailedFile {
    path: String,
    error: String,
}

pub fn execute(
    index: &Path,
    paths: Vec<PathBuf>,
    recursive: bool,
    output: Output,
) -> Result<ExitCode> {
    let files = collect_images(&paths, recursive);
    if files.is_empty() {
        bail!("No supported images found in the given paths");
    }

    let engine = open_engine(index)?;
    let verifier = Verifier::new();
    let mut summary = IndexSummary {
        indexed: Vec::new(),
        failed: Vec::new(),
        total: 0,
    };

    for file in &files {
        let id = index_id(file);
        let outcome = ImageHandle::open(file)
            .and_then(|image| engine.index_image(&id, &image, &verifier));
        match outcome {
            Ok(report) => {
                if output.human() {
                    println!(
                        "{} {} {}",
                        "+".green(),
                        id,
                        format!("(manipulation {:.2})", report.manipulation.score).dimmed()
                    );
                }
                summary.indexed.push(id);
            }
            Err(e) => {
                warn!(path = %file.display(), error = %e, "Skipping file");
                if output.human() {
                    println!("{} {} ({})", "!".red(), file.display(), e);
                }
                summary.failed.push(FailedFile {
                    path: file.display().to_string(),
                    error: e.to_string(),
                });
            }
        }
    }
    summary.total = engine.len();
    info!(
        indexed = summary.indexed.len(),
        failed = summary.failed.len(),
        total = summary.total,
        "Indexing finished"
    );

    if output.json {
        print_json(&summary)?;
    } else if !output.quiet {
        println!();
        println!(
            "Indexed {} image(s), {} failed, {} in index",
            summary.indexed.len().to_string().bold(),
            summary.failed.len(),
            summary.total
        );
    }

    if summary.indexed.is_empty() {
        bail!("Failed to read any of the {} input image(s)", files.len());
    }
    Ok(ExitCode::success())
}
