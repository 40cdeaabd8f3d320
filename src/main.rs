//! Command-line tool for generating OpenAPI documents from reflection manifests.
//!
//! # Usage
//!
//! ```bash
//! openapi-from-metadata [OPTIONS] <MANIFEST_PATH>
//! ```
//!
//! # Examples
//!
//! Generate YAML from a single manifest:
//! ```bash
//! openapi-from-metadata storage/openapi/manifest.json -o openapi.yaml
//! ```
//!
//! Merge a directory of fragments into JSON, documenting only the API routes:
//! ```bash
//! openapi-from-metadata storage/openapi -f json --include 'api/*' -o openapi.json
//! ```

use anyhow::Result;
use clap::Parser;
use log::info;
use openapi_from_metadata::cli;

fn main() -> Result<()> {
    // Parse first so the verbose flag can pick the log level
    let args = cli::CliArgs::parse();

    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    info!("openapi-from-metadata starting...");

    let args = cli::validate_args(args)?;
    cli::run(args)?;

    info!("OpenAPI document generation completed successfully");
    Ok(())
}
