//! lane commands - Diff lanes and list them

use std::sync::Arc;

use anyhow::{Context as _, Result};

use crate::cli::Context;
use crate::core::config::Config;
use crate::core::types::LaneName;
use crate::lane::LaneDiffGenerator;
use crate::ui::output;
use crate::workspace::fs::{load_graph, FsObjectStore};

/// Compare component content across two lanes.
pub async fn diff(
    ctx: &Context,
    from: Option<&str>,
    to: Option<&str>,
    pattern: Option<&str>,
) -> Result<()> {
    let graph = load_graph(&ctx.root).context("failed to load version graph")?;
    let config = Config::load(&ctx.root)?;
    let store = Arc::new(FsObjectStore::open(&ctx.root));

    let from = from.map(LaneName::new).transpose()?;
    let to = to.map(LaneName::new).transpose()?;
    let current = config.active_lane();

    let generator = LaneDiffGenerator::new(store);
    let result = generator
        .generate(&graph, Some(&current), from, to, pattern)
        .await?;

    output::print(
        format!(
            "comparing {} -> {}",
            result.from_lane_name, result.to_lane_name
        ),
        ctx.verbosity,
    );

    if result.is_empty() {
        output::print("lanes are identical", ctx.verbosity);
        return Ok(());
    }

    for diff in &result.comps_with_diff {
        output::print(format!("{}:", diff.component), ctx.verbosity);
        for file in &diff.files {
            output::print(format!("  {} {}", file.change, file.path), ctx.verbosity);
        }
    }
    if !result.new_comps_from.is_empty() {
        output::print(
            format!("only on {}:", result.from_lane_name),
            ctx.verbosity,
        );
        output::print(
            output::format_list(&result.new_comps_from, "  "),
            ctx.verbosity,
        );
    }
    if !result.new_comps_to.is_empty() {
        output::print(format!("only on {}:", result.to_lane_name), ctx.verbosity);
        output::print(
            output::format_list(&result.new_comps_to, "  "),
            ctx.verbosity,
        );
    }
    for failure in &result.failures {
        output::warn(
            format!("could not diff {}: {}", failure.component, failure.reason),
            ctx.verbosity,
        );
    }
    Ok(())
}

/// List lanes with history in this workspace.
pub fn list(ctx: &Context) -> Result<()> {
    let graph = load_graph(&ctx.root).context("failed to load version graph")?;
    let lanes = graph.lanes();
    if lanes.is_empty() {
        output::print("no lanes", ctx.verbosity);
        return Ok(());
    }
    for lane in lanes {
        let members = graph.components_on_lane(&lane).len();
        output::print(
            format!("{lane} ({members} component{})", if members == 1 { "" } else { "s" }),
            ctx.verbosity,
        );
    }
    Ok(())
}
