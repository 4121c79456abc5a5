//! SvelteKit OpenAPI Generator - command-line tool for generating OpenAPI
//! documentation and a typed client from SvelteKit server routes.
//!
//! This binary analyzes the `+server.ts` files of a SvelteKit project to
//! extract route definitions, response types and documentation, then
//! generates an OpenAPI 3.0 document and, optionally, a typed TypeScript
//! API client.
//!
//! # Usage
//!
//! ```bash
//! openapi-from-routes [OPTIONS] <PROJECT_PATH>
//! ```
//!
//! # Examples
//!
//! Generate YAML documentation:
//! ```bash
//! openapi-from-routes ./my-app -o openapi.yaml
//! ```
//!
//! Generate JSON documentation and a typed client:
//! ```bash
//! openapi-from-routes ./my-app -f json -o openapi.json -c src/lib/api.ts
//! ```
//!
//! Enable verbose logging:
//! ```bash
//! openapi-from-routes ./my-app -v
//! ```

mod analyzer;
mod cli;
mod client_generator;
mod docs;
mod error;
mod openapi_builder;
mod parser;
mod route_map;
mod routing;
mod scanner;
mod schema_generator;
mod serializer;

use anyhow::Result;
use clap::Parser;
use log::info;

fn main() -> Result<()> {
    // We need to parse args twice: once to get verbose flag, then again after logger init
    // First, do a quick parse just to check for verbose flag
    let args_for_verbose = cli::CliArgs::parse();

    // Initialize logger based on verbose flag
    let log_level = if args_for_verbose.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    info!("SvelteKit OpenAPI Generator starting...");

    // Now do the full parse with validation
    let args = cli::parse_args_from_parsed(args_for_verbose)?;

    // Run the main workflow
    cli::run(args)?;

    info!("Generation completed successfully");

    Ok(())
}
