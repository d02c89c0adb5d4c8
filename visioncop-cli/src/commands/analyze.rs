//! Analyze command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;
use visioncop_core::{ImageHandle, Verifier};

use crate::exit_codes::ExitCode;
use crate::utils::{print_json, Output};

pub fn execute(file: PathBuf, output: Output) -> Result<ExitCode> {
    let image = ImageHandle::open(&file)
        .with_context(|| format!("Failed to read image {}", file.display()))?;
    let report = Verifier::new().analyze(&image)?;

    if output.json {
        print_json(&report)?;
        return Ok(ExitCode::success());
    }
    if output.quiet {
        println!("{}", report.perceptual_hash);
        return Ok(ExitCode::success());
    }

    println!();
    println!("{}", report.filename.bold());
    println!("   {} {}", "SHA3-256:".dimmed(), report.sha3_256);
    println!("   {} {}", "Perceptual hash:".dimmed(), report.perceptual_hash);
    println!(
        "   {} {}x{}",
        "Dimensions:".dimmed(),
        report.width,
        report.height
    );

    if let Some(err) = &report.metadata_error {
        println!("   {} {}", "Metadata:".dimmed(), err.red());
    } else if report.metadata.is_empty() {
        println!("   {} {}", "Metadata:".dimmed(), "none".dimmed());
    } else {
        println!("   {}", "Metadata:".dimmed());
        for (field, value) in report.metadata.iter() {
            println!("     {}: {}", field, value);
        }
    }

    let score = format!("{:.3}", report.manipulation.score);
    let score = if report.manipulation.is_clean() {
        score.green()
    } else {
        score.yellow()
    };
    println!("   {} {}", "Manipulation:".dimmed(), score);
    for flag in &report.manipulation.flags {
        println!("     - {}", flag);
    }
    Ok(ExitCode::success())
}
