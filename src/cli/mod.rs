//! cli
//!
//! Command-line interface layer for Tessera.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Delegate to command handlers
//! - Format and display results
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap and dispatches to
//! the library's engines; no semantics live here. Handlers are async
//! because status resolution and removal are, so dispatch runs on a
//! tokio runtime built once per invocation.

pub mod args;
pub mod commands;

pub use args::Cli;

use std::path::PathBuf;

use anyhow::{Context as _, Result};

use crate::ui::output::Verbosity;

/// Execution context shared by all command handlers.
#[derive(Debug, Clone)]
pub struct Context {
    /// Workspace root the command operates on.
    pub root: PathBuf,
    /// Output verbosity from the global flags.
    pub verbosity: Verbosity,
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();

    let root = match cli.cwd.clone() {
        Some(path) => path,
        None => std::env::current_dir().context("cannot determine current directory")?,
    };
    let ctx = Context {
        root,
        verbosity: Verbosity::from_flags(cli.quiet, cli.debug),
    };

    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    runtime.block_on(commands::dispatch(cli.command, &ctx))
}
