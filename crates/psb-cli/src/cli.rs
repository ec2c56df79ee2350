//! # CLI structure and argument parsing
//!
//! The `psb` command aggregates by default; subcommands cover the cache and
//! the source listing. Global options apply to every command:
//!
//! ```bash
//! # Full aggregation to the default artifact path
//! psb
//!
//! # Explicit subcommand, custom output, persistent cache
//! psb compile --cache --output data/orgs.json
//!
//! # One source only, with verbose events mirrored to a file
//! psb --source gias --debug --log-file run.log
//!
//! # Housekeeping
//! psb cache --clear
//! psb sources
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Main CLI structure for the `psb` command.
#[derive(Parser, Clone, Debug)]
#[command(name = "psb")]
#[command(version)]
#[command(about = "Aggregate UK public sector organisations into one dataset", long_about = None)]
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    /// Subcommand; aggregation runs when none is given.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Cache fetched payloads on disk for an hour.
    #[arg(long, global = true)]
    pub cache: bool,

    /// Verbose event stream.
    #[arg(long, global = true)]
    pub debug: bool,

    /// Suppress non-error output.
    #[arg(long, global = true, conflicts_with = "debug")]
    pub quiet: bool,

    /// Per-request timeout in milliseconds.
    #[arg(long, value_name = "MS", global = true)]
    pub timeout: Option<u64>,

    /// Artifact path.
    #[arg(long, value_name = "PATH", global = true, default_value = psb_core::writer::DEFAULT_OUTPUT)]
    pub output: PathBuf,

    /// Mirror events to a file.
    #[arg(long, value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Run only the driver matching this source id or alias.
    #[arg(long, value_name = "ID", global = true)]
    pub source: Option<String>,

    /// Concurrent driver bound; defaults to the number of CPU cores.
    #[arg(long, value_name = "N", global = true)]
    pub concurrency: Option<usize>,
}

/// Subcommands of the `psb` command.
#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Aggregate all selected sources (the default action).
    Compile,

    /// Manage the on-disk fetch cache.
    Cache {
        /// Remove the cache directory.
        #[arg(long)]
        clear: bool,
    },

    /// List registered sources and their filter aliases.
    Sources,
}
