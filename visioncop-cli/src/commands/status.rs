//! Status command implementation.

use std::path::Path;

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;

use crate::exit_codes::ExitCode;
use crate::utils::{open_engine, print_json, Output};

#[derive(Serialize)]
struct Status {
    index: String,
    entries: usize,
    model: String,
    dimension: usize,
}

pub fn execute(index: &Path, output: Output) -> Result<ExitCode> {
    let engine = open_engine(index)?;
    let status = Status {
        index: index.display().to_string(),
        entries: engine.len(),
        model: engine.model_name().to_string(),
        dimension: engine.dimension(),
    };

    if output.json {
        print_json(&status)?;
    } else if output.quiet {
        println!("{}", status.entries);
    } else {
        println!("{} {}", "Index:".dimmed(), status.index);
        println!("{} {}", "Images:".dimmed(), status.entries.to_string().bold());
        println!(
            "{} {} ({} dimensions)",
            "Model:".dimmed(),
            status.model,
            status.dimension
        );
    }
    Ok(ExitCode::success())
}
