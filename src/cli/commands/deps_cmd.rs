//! deps commands - Reverse dependency index
//!
//! The workspace's tracking state records which tracked components each
//! component depends on. The index command reports those declarations
//! reverse-indexed by dependency, as JSON for downstream tooling.

use anyhow::{Context as _, Result};

use crate::cli::Context;
use crate::deps::{index_by_dependency_id, DependencyBuckets};
use crate::ui::output;
use crate::workspace::fs::FsWorkspace;

/// Print the reverse dependency index as JSON.
pub fn index(ctx: &Context) -> Result<()> {
    let workspace = FsWorkspace::open(&ctx.root).context("failed to open workspace")?;

    // Workspace-level declarations carry no range; "*" stands in.
    let per_component: Vec<_> = workspace
        .entries()
        .into_iter()
        .map(|entry| {
            let buckets = DependencyBuckets {
                runtime: entry
                    .dependencies
                    .iter()
                    .map(|dep| (dep.clone(), "*".to_string()))
                    .collect(),
                ..DependencyBuckets::default()
            };
            (entry.id, buckets)
        })
        .collect();

    let index = index_by_dependency_id(&[], &per_component, None);
    let rendered =
        serde_json::to_string_pretty(&index).context("failed to render dependency index")?;
    output::print(rendered, ctx.verbosity);
    Ok(())
}
