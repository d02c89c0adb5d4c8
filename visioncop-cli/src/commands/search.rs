//! Search command implementation.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use visioncop_core::{ImageSource, SearchHit, VerificationResult, Verifier};

use super::verify::{load_query, print_result, strict_outcome};
use crate::exit_codes::ExitCode;
use crate::utils::{open_engine, print_json, Output};

#[derive(Serialize)]
struct HitReport {
    #[serde(flatten)]
    hit: SearchHit,
    #[serde(skip_serializing_if = "Option::is_none")]
    verification: Option<VerificationResult>,
}

pub fn execute(
    index: &Path,
    query: PathBuf,
    top_k: usize,
    verify: bool,
    strict: bool,
    output: Output,
) -> Result<ExitCode> {
    let engine = open_engine(index)?;
    let image = load_query(&query)?;

    let hits = engine
        .search(image.bytes(), top_k)
        .with_context(|| format!("Failed to search with {}", query.display()))?;

    let verifications: Vec<Option<VerificationResult>> = if verify {
        let candidates: Vec<ImageSource> = hits
            .iter()
            .map(|h| ImageSource::from_path(&h.id))
            .collect();
        let source = ImageSource::from_handle(image);
        Verifier::new()
            .verify_in_order(&source, &candidates)
            .into_iter()
            .map(Some)
            .collect()
    } else {
        vec![None; hits.len()]
    };

    let reports: Vec<HitReport> = hits
        .into_iter()
        .zip(verifications)
        .map(|(hit, verification)| HitReport { hit, verification })
        .collect();

    if output.json {
        print_json(&reports)?;
    } else if output.quiet {
        for report in &reports {
            println!("{}", report.hit.id);
        }
    } else if reports.is_empty() {
        println!("{}", "No indexed images to compare against".dimmed());
    } else {
        println!();
        for (rank, report) in reports.iter().enumerate() {
            println!(
                "{:>2}. {} {}",
                rank + 1,
                format!("{:.4}", report.hit.similarity).cyan(),
                report.hit.id
            );
            if let Some(result) = &report.verification {
                print_result(result, "      ");
            }
        }
    }

    Ok(strict_outcome(
        strict,
        reports.iter().filter_map(|r| r.verification.as_ref()),
    ))
}
