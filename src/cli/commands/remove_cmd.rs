//! remove command - Remove components locally or from remote scopes
//!
//! # Locking
//!
//! Local removal mutates the graph and tracking state, so the workspace
//! lock is held for the whole command.

use std::sync::Arc;

use anyhow::{Context as _, Result};
use async_trait::async_trait;

use crate::cli::Context;
use crate::core::config::Config;
use crate::core::lock::WorkspaceLock;
use crate::core::types::Scope;
use crate::remote::{CentralHubClient, RegistryClient, RegistryError, RemovedObjects};
use crate::remove::{RemoveEngine, RemoveFlags};
use crate::status::{ScopeHeads, StatusResolver};
use crate::ui::output;
use crate::workspace::fs::{load_graph, save_graph, FsObjectStore, FsWorkspace};

/// Registry stand-in for workspaces with no remote configured. Every
/// remote call reports `NotSupported`, which surfaces per scope in the
/// removal result instead of aborting local work.
struct NoRegistry;

#[async_trait]
impl RegistryClient for NoRegistry {
    async fn delete_many(
        &self,
        scope: &Scope,
        _ids: &[String],
        _force: bool,
    ) -> Result<RemovedObjects, RegistryError> {
        Err(RegistryError::NotSupported(format!(
            "no registry configured for scope {scope}"
        )))
    }

    fn is_hub_hosted(&self, _scope: &Scope) -> bool {
        false
    }
}

#[async_trait]
impl CentralHubClient for NoRegistry {
    async fn delete_via_central_hub(
        &self,
        _ids: &[String],
        _force: bool,
        _ids_are_lanes: bool,
    ) -> Result<Vec<RemovedObjects>, RegistryError> {
        Err(RegistryError::NotSupported(
            "no central hub configured".to_string(),
        ))
    }
}

/// Remove components.
#[allow(clippy::fn_params_excessive_bools)]
pub async fn remove(
    ctx: &Context,
    ids: &[String],
    force: bool,
    remote: bool,
    track: bool,
    delete_files: bool,
) -> Result<()> {
    let _lock = WorkspaceLock::acquire(&ctx.root).context("cannot lock workspace")?;

    let workspace =
        Arc::new(FsWorkspace::open(&ctx.root).context("failed to open workspace")?);
    let mut graph = load_graph(&ctx.root).context("failed to load version graph")?;
    let config = Config::load(&ctx.root)?;
    let store = Arc::new(FsObjectStore::open(&ctx.root));

    let candidates = super::parse_identities(ids)?;

    let registry = Arc::new(NoRegistry);
    let engine = RemoveEngine::new(workspace.clone(), registry.clone(), registry);
    let mut resolver = StatusResolver::new(
        workspace,
        store,
        ScopeHeads::new(),
        Some(config.active_lane()),
    );

    let flags = RemoveFlags {
        force,
        remote,
        track,
        delete_files,
    };
    let outcome = engine
        .remove_components(&candidates, flags, &mut graph, &mut resolver)
        .await?;

    save_graph(&ctx.root, &graph).context("failed to persist version graph")?;

    for id in outcome.local.removed_identities.iter() {
        output::print(format!("removed {id}"), ctx.verbosity);
    }
    for id in outcome.local.missing_identities.iter() {
        output::warn(format!("not found: {id}"), ctx.verbosity);
    }
    for id in outcome.local.modified_skipped.iter() {
        output::warn(
            format!("skipped {id}: modified (use --force to remove anyway)"),
            ctx.verbosity,
        );
    }
    for (id, reason) in &outcome.local.status_failures {
        output::error(format!("skipped {id}: {reason}"));
    }
    for (id, dependents) in &outcome.local.blocking_dependents {
        output::warn(
            format!("skipped {id}: required by {}", dependents.join(", ")),
            ctx.verbosity,
        );
    }
    for key in &outcome.local.removed_from_lane {
        output::print(format!("removed {key} from its lanes"), ctx.verbosity);
    }

    for removal in &outcome.remote {
        let scope = removal
            .scope
            .as_ref()
            .map_or_else(|| "central hub".to_string(), ToString::to_string);
        match &removal.outcome {
            Ok(removed) => {
                for id in &removed.removed {
                    output::print(format!("removed {id} from {scope}"), ctx.verbosity);
                }
                for id in &removed.missing {
                    output::warn(format!("{scope}: unknown component {id}"), ctx.verbosity);
                }
                for (id, dependents) in &removed.dependents {
                    output::warn(
                        format!("{scope}: {id} blocked by {}", dependents.join(", ")),
                        ctx.verbosity,
                    );
                }
            }
            Err(e) => output::error(format!("{scope}: {e}")),
        }
    }

    Ok(())
}
