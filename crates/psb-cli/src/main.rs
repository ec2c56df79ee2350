//! Entrypoint for the `psb` binary.

use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    psb_cli::run().await
}
