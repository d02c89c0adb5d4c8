//! List command implementation.

use std::path::Path;

use anyhow::Result;
use colored::Colorize;
use visioncop_core::IndexRecord;

use crate::exit_codes::ExitCode;
use crate::utils::{open_engine, print_json, Output};

pub fn execute(index: &Path, output: Output) -> Result<ExitCode> {
    let engine = open_engine(index)?;
    let records = engine.records();

    if output.json {
        print_json(&records)?;
        return Ok(ExitCode::success());
    }
    if output.quiet {
        for record in &records {
            println!("{}", record.id);
        }
        return Ok(ExitCode::success());
    }

    if records.is_empty() {
        println!("{}", "Index is empty".dimmed());
        return Ok(ExitCode::success());
    }
    for record in &records {
        print_record(record);
    }
    println!();
    println!("{} image(s) in index", records.len().to_string().bold());
    Ok(ExitCode::success())
}

fn print_record(record: &IndexRecord) {
    let indexed_at = record.indexed_at.format("%Y-%m-%d %H:%M:%S");
    match &record.report {
        Some(report) => {
            let score = format!("{:.2}", report.manipulation.score);
            let score = if report.manipulation.is_clean() {
                score.green()
            } else {
                score.yellow()
            };
            println!(
                "{}  {}  {}  {}",
                indexed_at.to_string().dimmed(),
                report.perceptual_hash,
                score,
                record.id
            );
        }
        None => println!(
            "{}  {}  {}",
            indexed_at.to_string().dimmed(),
            "no report".dimmed(),
            record.id
        ),
    }
}
