//! psb CLI - aggregate UK public sector organisations into one dataset.
//!
//! Thin front-end over `psb-core`: argument parsing, logging setup, signal
//! handling, and the end-of-run summary. Exit codes follow the convention
//! used by the release pipeline: 0 full success, 1 any failure (including
//! partial source failures), 130 interrupted, 143 terminated.

use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use clap::Parser;
use colored::Colorize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use psb_core::cache::FetchCache;
use psb_core::orchestrator::{self, RunConfig};
use psb_core::writer::write_artifact;

mod cli;
mod logging;

use cli::{Cli, Commands};

const EXIT_FAILURE: u8 = 1;
const EXIT_SIGINT: u8 = 130;
const EXIT_SIGTERM: u8 = 143;

/// Execute the psb CLI with the current environment.
pub async fn run() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::initialize_logging(&cli) {
        eprintln!("error: {e}");
        return ExitCode::from(EXIT_FAILURE);
    }

    match cli.command.clone() {
        Some(Commands::Cache { clear }) => handle_cache(clear, cli.quiet),
        Some(Commands::Sources) => {
            handle_sources();
            ExitCode::SUCCESS
        }
        None | Some(Commands::Compile) => aggregate(cli).await,
    }
}

fn handle_cache(clear: bool, quiet: bool) -> ExitCode {
    if !clear {
        eprintln!("nothing to do: pass --clear to remove the cache directory");
        return ExitCode::from(EXIT_FAILURE);
    }
    let cache = FetchCache::default_location();
    match cache.clear() {
        Ok(()) => {
            if !quiet {
                println!("{} Cache cleared", "✓".green());
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("cache clear failed: {e}");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

fn handle_sources() {
    for driver in psb_core::registry::registry() {
        println!(
            "{:32} {}\n{:32}   aliases: {}",
            driver.id().to_string().bold(),
            driver.description(),
            "",
            driver.filter_aliases().join(", ")
        );
    }
}

async fn aggregate(cli: Cli) -> ExitCode {
    let cancel = CancellationToken::new();
    let signal_code = Arc::new(AtomicU8::new(0));
    spawn_signal_handler(cancel.clone(), Arc::clone(&signal_code));

    let config = RunConfig {
        source_filter: cli.source.clone(),
        cache_enabled: cli.cache,
        timeout: cli.timeout.map(Duration::from_millis),
        concurrency: cli.concurrency,
    };

    let result = match orchestrator::run(&config, cancel).await {
        Ok(result) => result,
        Err(e) => {
            error!("aggregation failed: {e}");
            if cli.debug {
                debug!("failure detail: {e:?}");
            }
            return ExitCode::from(EXIT_FAILURE);
        }
    };

    // A cancelled run still writes whatever completed: a partial artifact
    // beats an empty directory for the downstream site build.
    if let Err(e) = write_artifact(&cli.output, result.records, result.metadata, true) {
        error!("failed to write artifact: {e}");
        return ExitCode::from(EXIT_FAILURE);
    }

    if !cli.quiet {
        println!(
            "{} Wrote {}",
            "✓".green(),
            cli.output.display().to_string().bold()
        );
    }

    if !result.partial_failures.is_empty() {
        let heading = format!(
            "WARNING: {} source(s) failed:",
            result.partial_failures.len()
        );
        eprintln!("{}", heading.yellow().bold());
        for failure in &result.partial_failures {
            let line = if cli.debug {
                format!(
                    "  • {}: {} [{}]",
                    failure.source.label(),
                    failure.error,
                    failure.error.category()
                )
            } else {
                format!("  • {}: {}", failure.source.label(), failure.error)
            };
            eprintln!("{}", line.yellow());
        }
    }

    match signal_code.load(Ordering::SeqCst) {
        0 => {
            if result.success && result.partial_failures.is_empty() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(EXIT_FAILURE)
            }
        }
        code => ExitCode::from(code),
    }
}

/// Propagate SIGINT/SIGTERM into the cancellation token and remember which
/// one fired for the exit code.
fn spawn_signal_handler(cancel: CancellationToken, signal_code: Arc<AtomicU8>) {
    #[cfg(unix)]
    tokio::spawn(async move {
        use tokio::signal::unix::{SignalKind, signal};
        let mut interrupt = match signal(SignalKind::interrupt()) {
            Ok(s) => s,
            Err(e) => {
                error!("cannot install SIGINT handler: {e}");
                return;
            }
        };
        let mut terminate = match signal(SignalKind::terminate()) {
            Ok(s) => s,
            Err(e) => {
                error!("cannot install SIGTERM handler: {e}");
                return;
            }
        };
        tokio::select! {
            _ = interrupt.recv() => signal_code.store(EXIT_SIGINT, Ordering::SeqCst),
            _ = terminate.recv() => signal_code.store(EXIT_SIGTERM, Ordering::SeqCst),
        }
        error!("cancellation requested, finishing with partial results");
        cancel.cancel();
    });

    #[cfg(not(unix))]
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_code.store(EXIT_SIGINT, Ordering::SeqCst);
            error!("cancellation requested, finishing with partial results");
            cancel.cancel();
        }
    });
}
