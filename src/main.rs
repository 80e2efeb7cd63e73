//! msixforge - Build-and-sign pipeline for instrumented MSIX test packages.
//!
//! This binary assembles a signed, installable application container package
//! from a declarative configuration, with graceful degradation when parts of
//! the external toolchain are unavailable.

use std::process;

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    // Run CLI and get exit code
    let exit_code = match msixforge::cli::run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    };

    process::exit(exit_code);
}
