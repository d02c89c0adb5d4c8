//! Verify command implementation.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use colored::Colorize;
use tracing::info;
use visioncop_core::{
    ImageHandle, ImageSource, SeverityColor, VerificationResult, Verifier, VerifierConfig,
};

use crate::exit_codes::{ExitCode, VERIFICATION_FLAGGED};
use crate::utils::{paint, print_json, Output};

/// Execute the verify command.
pub fn execute(
    query: PathBuf,
    candidates: Vec<PathBuf>,
    workers: usize,
    strict: bool,
    output: Output,
) -> Result<ExitCode> {
    let query = load_query(&query)?;
    let query = ImageSource::from_handle(query);
    let verifier = Verifier::with_config(VerifierConfig {
        workers,
        ..VerifierConfig::default()
    })?;

    let candidates: Vec<ImageSource> = candidates.into_iter().map(ImageSource::from_path).collect();
    let results = verifier.verify(&query, &candidates);
    info!(candidates = candidates.len(), "Verification finished");

    if output.json {
        print_json(&results)?;
    } else if !output.quiet {
        println!();
        println!("{} {}", "Query:".dimmed(), query.name().bold());
        println!();
        for result in &results {
            print_result(result, "");
        }
    }

    Ok(strict_outcome(strict, results.iter()))
}

/// Read and decode the query up front so a bad query is a hard error rather
/// than a column of failed rows.
pub fn load_query(path: &Path) -> Result<ImageHandle> {
    ImageHandle::open(path)
        .with_context(|| format!("Failed to read query image {}", path.display()))
}

/// Exit status for `--strict`: any red verdict is a data error.
pub fn strict_outcome<'a>(
    strict: bool,
    results: impl Iterator<Item = &'a VerificationResult>,
) -> ExitCode {
    if !strict {
        return ExitCode::success();
    }
    let flagged = results
        .filter(|r| r.severity_color == SeverityColor::Red)
        .count();
    if flagged > 0 {
        ExitCode::error(
            VERIFICATION_FLAGGED,
            format!("{} candidate(s) flagged as suspicious", flagged),
        )
    } else {
        ExitCode::success()
    }
}

/// Render one result block. `indent` prefixes every line.
pub fn print_result(result: &VerificationResult, indent: &str) {
    let confidence = result.overall_confidence.as_str();
    println!(
        "{}{}  {}",
        indent,
        result.filename.bold(),
        paint(result.severity_color, confidence).bold()
    );

    if let Some(reason) = &result.failure {
        println!("{}   {} {}", indent, "Error:".dimmed(), reason.red());
        println!();
        return;
    }

    println!(
        "{}   {} {} ({})",
        indent,
        "Pixel distance:".dimmed(),
        result.rendered_distance(),
        result.pixel_status
    );
    let metadata = if result.metadata_match {
        "Match".green()
    } else {
        "Mismatch".red()
    };
    println!("{}   {} {}", indent, "Metadata:".dimmed(), metadata);
    for issue in &result.metadata_issues {
        println!("{}     - {}", indent, issue);
    }
    println!(
        "{}   {} {:.3}",
        indent,
        "Manipulation:".dimmed(),
        result.manipulation_score
    );
    for flag in &result.manipulation_flags {
        println!("{}     - {}", indent, flag);
    }
    println!();
}
