//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>`: Run as if in that directory
//! - `--debug`: Enable debug output
//! - `--quiet` / `-q`: Minimal output

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Tessera - component-level version control
#[derive(Parser, Debug)]
#[command(name = "tsr")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run as if tsr was started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the status of tracked components
    #[command(
        name = "status",
        long_about = "Show the status of tracked components.\n\n\
            For each component, reports its lifecycle facets: new (never \
            snapped), modified (working copy differs from the recorded \
            snap), staged (local history ahead of the fetched remote head), \
            deleted (tracked but files gone), missing from scope (objects \
            not fetched yet)."
    )]
    Status {
        /// Components to check (defaults to all tracked)
        #[arg(value_name = "COMPONENT")]
        ids: Vec<String>,
    },

    /// Remove components from the workspace or a remote scope
    #[command(
        name = "remove",
        long_about = "Remove components.\n\n\
            Removal is always whole-component: the requested identity is \
            normalized to its latest known version. Without --force, \
            modified components and components other tracked components \
            depend on are skipped and reported."
    )]
    Remove {
        /// Components to remove
        #[arg(value_name = "COMPONENT", required = true)]
        ids: Vec<String>,

        /// Remove even if modified or depended upon
        #[arg(short, long)]
        force: bool,

        /// Delete from the remote scopes instead of the local workspace
        #[arg(long)]
        remote: bool,

        /// Keep tracking metadata and manifest references
        #[arg(long)]
        track: bool,

        /// Also delete the component's files from disk
        #[arg(long)]
        delete_files: bool,
    },

    /// Lane operations
    #[command(subcommand)]
    Lane(LaneCommand),

    /// Dependency operations
    #[command(subcommand)]
    Deps(DepsCommand),
}

/// Lane subcommands.
#[derive(Subcommand, Debug)]
pub enum LaneCommand {
    /// Compare component content across two lanes
    #[command(
        name = "diff",
        long_about = "Compare component content across two lanes.\n\n\
            With no lanes named, compares the checked-out lane against \
            the default lane. With one, compares the checked-out lane \
            against the named one. With two, compares them directly."
    )]
    Diff {
        /// Lane to diff from
        #[arg(value_name = "FROM")]
        from: Option<String>,

        /// Lane to diff to
        #[arg(value_name = "TO")]
        to: Option<String>,

        /// Only include components whose name matches (supports `*`)
        #[arg(short, long)]
        pattern: Option<String>,
    },

    /// List lanes with history in this workspace
    #[command(name = "list")]
    List,
}

/// Dependency subcommands.
#[derive(Subcommand, Debug)]
pub enum DepsCommand {
    /// Print the reverse dependency index as JSON
    #[command(name = "index")]
    Index,
}
