//! Entry point for the elf2bin converter.
//!
//! This file handles high-level application flow:
//! 1. Parse command-line arguments using `clap`.
//! 2. Initialize tracing, writing to stderr so stdout stays clean.
//! 3. Hand over to the conversion driver.
//!
//! Every fatal error funnels through one reporting point, so each failure
//! appears exactly once on stderr with an `elf2bin: ` prefix and a nonzero
//! exit code.

use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use elf2bin::config::Config;
use elf2bin::convert;

fn main() -> ExitCode {
    let config = Config::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match convert::run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("elf2bin: {err:#}");
            ExitCode::FAILURE
        }
    }
}
