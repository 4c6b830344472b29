//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Validates command-specific arguments
//! 2. Calls the library engines to execute the command
//! 3. Formats and displays output
//!
//! Handlers do NOT implement component semantics directly.

mod deps_cmd;
mod lane_cmd;
mod remove_cmd;
mod status_cmd;

pub use deps_cmd::index;
pub use lane_cmd::{diff, list};
pub use remove_cmd::remove;
pub use status_cmd::status;

use anyhow::Result;

use super::Context;
use crate::cli::args::{Command, DepsCommand, LaneCommand};
use crate::core::id_set::IdentitySet;
use crate::core::types::ComponentIdentity;

/// Dispatch a command to its handler.
pub async fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Status { ids } => status_cmd::status(ctx, &ids).await,
        Command::Remove {
            ids,
            force,
            remote,
            track,
            delete_files,
        } => remove_cmd::remove(ctx, &ids, force, remote, track, delete_files).await,
        Command::Lane(LaneCommand::Diff { from, to, pattern }) => {
            lane_cmd::diff(ctx, from.as_deref(), to.as_deref(), pattern.as_deref()).await
        }
        Command::Lane(LaneCommand::List) => lane_cmd::list(ctx),
        Command::Deps(DepsCommand::Index) => deps_cmd::index(ctx),
    }
}

/// Parse raw component arguments into an identity set, rejecting
/// references that are ambiguous without a version.
pub(crate) fn parse_identities(raw: &[String]) -> Result<IdentitySet> {
    let ids = raw
        .iter()
        .map(|s| ComponentIdentity::parse(s))
        .collect::<Result<Vec<_>, _>>()?;
    let set = IdentitySet::from_identities(ids);
    set.throw_for_duplication()?;
    Ok(set)
}
