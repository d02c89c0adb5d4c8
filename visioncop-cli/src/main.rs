//! VisionCop CLI - image similarity search and authenticity verification.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use tracing_subscriber::EnvFilter;
use visioncop_core::DEFAULT_TOP_K;

mod commands;
mod exit_codes;
mod utils;

use exit_codes::ExitCode;
use utils::Output;

const EXIT_CODES_HELP: &str = "\
Exit codes:
  0   Success
  1   General error
  64  Usage error
  65  Suspicious candidate found (with --strict)
  66  Input image missing or undecodable
  74  Index file could not be read or written";

#[derive(Parser)]
#[command(name = "visioncop")]
#[command(author, version, about = "Image similarity search and authenticity verification", long_about = None)]
#[command(after_help = EXIT_CODES_HELP)]
struct Cli {
    /// Path of the vector index file
    #[arg(long, global = true, value_name = "PATH", default_value = "visioncop-index.cbor")]
    index: PathBuf,

    /// Print debug logs to stderr
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only print essential output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Print machine-readable JSON
    #[arg(long, global = true)]
    json: bool,

    /// When to use terminal colours
    #[arg(long, global = true, value_enum, default_value_t = ColorMode::Auto)]
    color: ColorMode,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum ColorMode {
    Auto,
    Always,
    Never,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare a query image against one or more candidate images
    Verify {
        /// Image under suspicion
        #[arg(value_name = "QUERY")]
        query: PathBuf,

        /// Images to compare against (presumed originals)
        #[arg(value_name = "CANDIDATES", required = true)]
        candidates: Vec<PathBuf>,

        /// Exit with 65 if any candidate is flagged red
        #[arg(long)]
        strict: bool,

        /// Worker threads (0 = one per core)
        #[arg(long, default_value_t = 0)]
        workers: usize,
    },

    /// Report hashes, metadata and manipulation evidence for one image
    Analyze {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Add images (files or directories) to the index
    Index {
        #[arg(value_name = "PATHS", required = true)]
        paths: Vec<PathBuf>,

        /// Descend into sub-directories
        #[arg(short, long)]
        recursive: bool,
    },

    /// Find the indexed images most similar to a query
    Search {
        #[arg(value_name = "QUERY")]
        query: PathBuf,

        /// Number of results
        #[arg(short = 'k', long = "top-k", default_value_t = DEFAULT_TOP_K)]
        top_k: usize,

        /// Also run authenticity verification against each hit
        #[arg(long)]
        verify: bool,

        /// With --verify, exit with 65 if any hit is flagged red
        #[arg(long, requires = "verify")]
        strict: bool,
    },

    /// List indexed images with their stored forensic summary
    List,

    /// Remove images from the index
    Remove {
        #[arg(value_name = "PATHS", required = true)]
        paths: Vec<PathBuf>,
    },

    /// Show index size and embedding model
    Status,
}

fn init_tracing(verbose: bool, quiet: bool) {
    let default = if verbose {
        "visioncop=debug,visioncop_core=debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<ExitCode> {
    let output = Output {
        json: cli.json,
        quiet: cli.quiet,
    };

    match cli.command {
        Commands::Verify {
            query,
            candidates,
            strict,
            workers,
        } => commands::verify::execute(query, candidates, workers, strict, output),
        Commands::Analyze { file } => commands::analyze::execute(file, output),
        Commands::Index { paths, recursive } => {
            commands::index::execute(&cli.index, paths, recursive, output)
        }
        Commands::Search {
            query,
            top_k,
            verify,
            strict,
        } => commands::search::execute(&cli.index, query, top_k, verify, strict, output),
        Commands::List => commands::list::execute(&cli.index, output),
        Commands::Remove { paths } => commands::remove::execute(&cli.index, paths, output),
        Commands::Status => commands::status::execute(&cli.index, output),
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    match cli.color {
        ColorMode::Always => colored::control::set_override(true),
        ColorMode::Never => colored::control::set_override(false),
        ColorMode::Auto => {}
    }

    let exit = match run(cli) {
        Ok(exit) => exit,
        Err(err) => ExitCode::from_anyhow(&err),
    };

    if let Some(message) = &exit.message {
        eprintln!("{} {}", "error:".red().bold(), message);
    }
    std::process::exit(exit.code);
}
