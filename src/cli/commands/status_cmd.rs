//! status command - Show component lifecycle facets

use std::sync::Arc;

use anyhow::{Context as _, Result};

use crate::cli::Context;
use crate::core::config::Config;
use crate::status::{ScopeHeads, StatusResolver};
use crate::ui::output;
use crate::workspace::fs::{load_graph, FsObjectStore, FsWorkspace};
use crate::workspace::TrackingStore as _;

/// Show the status of tracked components.
///
/// # Arguments
///
/// * `ctx` - Execution context
/// * `ids` - Components to check; all tracked components when empty
pub async fn status(ctx: &Context, ids: &[String]) -> Result<()> {
    let workspace =
        Arc::new(FsWorkspace::open(&ctx.root).context("failed to open workspace")?);
    let graph = load_graph(&ctx.root).context("failed to load version graph")?;
    let config = Config::load(&ctx.root)?;
    let store = Arc::new(FsObjectStore::open(&ctx.root));

    let targets = if ids.is_empty() {
        workspace.tracked()
    } else {
        super::parse_identities(ids)?
    };
    if targets.is_empty() {
        output::print("no tracked components", ctx.verbosity);
        return Ok(());
    }

    let mut resolver = StatusResolver::new(
        workspace,
        store,
        ScopeHeads::new(),
        Some(config.active_lane()),
    );
    let records = resolver.get_many_statuses(&targets, &graph).await?;

    for (id, record) in records {
        output::print(
            format!("{:<48} {}", id.to_string(), output::format_status(&record)),
            ctx.verbosity,
        );
    }
    Ok(())
}
