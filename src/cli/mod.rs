//! # CLI Module
//!
//! Command-line entry point shared by gantry applications.
//!
//! An application supplies a [`ServiceFactory`] building its services; the CLI
//! loads configuration, registers everything (plus the docs service) and then
//! either serves or prints.
//!
//! ## Commands
//!
//! ```bash
//! # serve on the configured port, stop with Ctrl-C
//! gantry serve
//!
//! # write the contract document
//! gantry contract --output openapi.json
//!
//! # permission codes of secured routes, for role tables
//! gantry permissions
//! ```
//!
//! `--config-dir` (or `GANTRY_CONFIG_DIR`) selects where `server.yaml` and
//! friends live; missing files are created from defaults.
//!
//! ## Usage from Code
//!
//! ```rust,ignore
//! use clap::Parser;
//! use gantry::cli::{run_cli, Cli};
//!
//! run_cli(Cli::parse(), &|app| Ok(vec![my_service(app)?]))?;
//! ```

mod commands;

#[cfg(test)]
mod tests;

pub use commands::{assemble, run_cli, AppContext, Assembly, Cli, Commands, ServiceFactory};
