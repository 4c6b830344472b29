//! remove
//!
//! Component removal: local/remote partition, safety checks, and
//! structured partial results.
//!
//! # Design
//!
//! Removal is always whole-component: candidate identities are first
//! normalized to their latest known version. With `remote`, every
//! candidate must carry a scope ([`RemoveError::UnscopedRemoteRemoval`]
//! otherwise) and deletion happens on the registries; without it, the
//! candidates are removed from the local graph and tracking metadata.
//!
//! # Invariants
//!
//! - Results are partial, never all-or-nothing: per-scope remote
//!   failures, per-component local skips, and per-component status
//!   failures sit side by side with the successes in the aggregate
//!   result.
//! - Without `force`, a modified component is skipped (reported in
//!   `modified_skipped`), and a component other tracked components
//!   depend on is skipped (reported in `blocking_dependents`).
//! - Version logs are never partially truncated: local removal detaches
//!   the whole graph node or nothing.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::graph::{GraphError, VersionGraph};
use crate::core::id_set::{IdSetError, IdentitySet};
use crate::core::types::{ComponentIdentity, Scope};
use crate::remote::{CentralHubClient, RegistryClient, RegistryError, RemovedObjects};
use crate::status::StatusResolver;
use crate::workspace::{TrackError, TrackingStore};

/// Removal behavior switches.
#[derive(Debug, Clone, Copy, Default)]
pub struct RemoveFlags {
    /// Remove even when modified or depended upon.
    pub force: bool,
    /// Delete from the remote registries instead of the local workspace.
    pub remote: bool,
    /// Keep tracking metadata and manifest references in place.
    pub track: bool,
    /// Also delete the component's working-copy files.
    pub delete_files: bool,
}

/// Errors that abort a removal wholesale.
#[derive(Debug, Error)]
pub enum RemoveError {
    /// Remote removal requested for an identity without a scope.
    #[error("cannot remove from remote without a scope: {0}")]
    UnscopedRemoteRemoval(String),

    /// Identity-set grouping failed.
    #[error(transparent)]
    IdSet(#[from] IdSetError),

    /// Graph mutation failed.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// Tracking metadata operation failed.
    #[error(transparent)]
    Track(#[from] TrackError),

    /// A spawned per-scope delete task could not be joined.
    #[error("remote removal task failed: {0}")]
    TaskJoin(String),
}

/// The local half of a removal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemovalResult {
    /// Identities actually removed.
    pub removed_identities: IdentitySet,
    /// Identities the workspace never knew.
    pub missing_identities: IdentitySet,
    /// Modified identities skipped because `force` was off.
    pub modified_skipped: IdentitySet,
    /// Candidates skipped because tracked components still depend on
    /// them, keyed by candidate, valued by the dependents.
    pub blocking_dependents: HashMap<String, Vec<String>>,
    /// Candidates left in place because their status could not be
    /// resolved, keyed by candidate, valued by the reason.
    pub status_failures: HashMap<String, String>,
    /// Removed components that still had heads on non-default lanes.
    pub removed_from_lane: Vec<String>,
}

/// One remote delete call's outcome, attributed to its scope (`None`
/// for central-hub batched calls).
#[derive(Debug)]
pub struct ScopeRemoval {
    /// The scope the call targeted.
    pub scope: Option<Scope>,
    /// What the registry reported, or why the call failed. A failed
    /// scope never hides the others' successes.
    pub outcome: Result<RemovedObjects, RegistryError>,
}

/// The aggregate outcome of [`RemoveEngine::remove_components`].
#[derive(Debug, Default)]
pub struct RemoveOutcome {
    /// Local workspace removal result.
    pub local: RemovalResult,
    /// Per-scope remote results.
    pub remote: Vec<ScopeRemoval>,
}

/// Orchestrates component removal across graph, tracking metadata, and
/// remote registries.
pub struct RemoveEngine {
    tracking: Arc<dyn TrackingStore>,
    registry: Arc<dyn RegistryClient>,
    hub: Arc<dyn CentralHubClient>,
}

impl RemoveEngine {
    /// Create an engine over the workspace's collaborators.
    pub fn new(
        tracking: Arc<dyn TrackingStore>,
        registry: Arc<dyn RegistryClient>,
        hub: Arc<dyn CentralHubClient>,
    ) -> Self {
        Self {
            tracking,
            registry,
            hub,
        }
    }

    /// Remove components per `flags`.
    ///
    /// With `flags.remote`, deletion happens on the registries: one
    /// batched central-hub call when every scope is hub-hosted, one
    /// concurrent call per scope otherwise. Without it, candidates are
    /// removed from the graph and tracking metadata, with modified and
    /// depended-upon components skipped unless `flags.force`.
    ///
    /// # Errors
    ///
    /// `UnscopedRemoteRemoval` when `flags.remote` and a candidate has
    /// no scope; hard graph and tracking errors propagate. Per-scope
    /// registry failures and per-candidate status failures do not: they
    /// come back in the result's `remote` and `status_failures` entries.
    pub async fn remove_components(
        &self,
        ids: &IdentitySet,
        flags: RemoveFlags,
        graph: &mut VersionGraph,
        resolver: &mut StatusResolver,
    ) -> Result<RemoveOutcome, RemoveError> {
        let candidates = self.normalize(ids, graph);

        if flags.remote {
            let remote = self.remove_remote(&candidates, flags).await?;
            return Ok(RemoveOutcome {
                local: RemovalResult::default(),
                remote,
            });
        }

        let local = self
            .remove_local(&candidates, flags, graph, resolver)
            .await?;
        Ok(RemoveOutcome {
            local,
            remote: Vec::new(),
        })
    }

    /// Pin every candidate to its latest known version. Unknown
    /// components pass through unchanged and surface as missing later.
    fn normalize(&self, ids: &IdentitySet, graph: &VersionGraph) -> IdentitySet {
        ids.iter()
            .map(|id| match graph.node(id) {
                Some(log) if !log.is_version_zero() => id.with_version(log.latest_version()),
                _ => id.clone(),
            })
            .collect()
    }

    async fn remove_remote(
        &self,
        candidates: &IdentitySet,
        flags: RemoveFlags,
    ) -> Result<Vec<ScopeRemoval>, RemoveError> {
        if let Some(unscoped) = candidates.iter().find(|id| id.is_local()) {
            return Err(RemoveError::UnscopedRemoteRemoval(unscoped.to_string()));
        }
        let groups = candidates.group_by_scope(None)?;

        if !groups.is_empty() && groups.keys().all(|scope| self.registry.is_hub_hosted(scope)) {
            let results = self
                .hub
                .delete_via_central_hub(&candidates.to_strings(), flags.force, false)
                .await;
            return Ok(match results {
                Ok(results) => results
                    .into_iter()
                    .map(|outcome| ScopeRemoval {
                        scope: None,
                        outcome: Ok(outcome),
                    })
                    .collect(),
                Err(e) => vec![ScopeRemoval {
                    scope: None,
                    outcome: Err(e),
                }],
            });
        }

        let mut tasks = tokio::task::JoinSet::new();
        for (scope, group) in groups {
            let registry = Arc::clone(&self.registry);
            let ids = group.to_strings();
            let force = flags.force;
            tasks.spawn(async move {
                let outcome = registry.delete_many(&scope, &ids, force).await;
                (scope, outcome)
            });
        }

        let mut removals = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            let (scope, outcome) = joined.map_err(|e| RemoveError::TaskJoin(e.to_string()))?;
            removals.push(ScopeRemoval {
                scope: Some(scope),
                outcome,
            });
        }
        removals.sort_by_key(|removal| removal.scope.as_ref().map(|s| s.to_string()));
        Ok(removals)
    }

    async fn remove_local(
        &self,
        candidates: &IdentitySet,
        flags: RemoveFlags,
        graph: &mut VersionGraph,
        resolver: &mut StatusResolver,
    ) -> Result<RemovalResult, RemoveError> {
        let mut result = RemovalResult::default();

        for id in candidates.iter() {
            if !graph.contains(id) && !self.tracking.is_tracked(id) {
                result.missing_identities = result.missing_identities.with(id.clone());
                continue;
            }

            if !flags.force {
                let dependents = self.tracking.dependents_of(id);
                if !dependents.is_empty() {
                    result
                        .blocking_dependents
                        .insert(id.stripped_string(), dependents.to_strings());
                    continue;
                }
                let record = match resolver.get_status(id, graph).await {
                    Ok(record) => record,
                    Err(e) => {
                        result
                            .status_failures
                            .insert(id.stripped_string(), e.to_string());
                        continue;
                    }
                };
                if record.is_modified() {
                    result.modified_skipped = result.modified_skipped.with(id.clone());
                    continue;
                }
            }

            self.detach(id, graph, &mut result);

            if flags.delete_files {
                self.tolerate_untracked(self.tracking.delete_files(id))?;
            }
            if !flags.track {
                self.tolerate_untracked(self.tracking.untrack(id))?;
                self.tolerate_untracked(self.tracking.remove_manifest_references(id))?;
            }

            resolver.invalidate(id);
            result.removed_identities = result.removed_identities.with(id.clone());
        }

        Ok(result)
    }

    /// Detach the component's graph node. Never-snapshotted candidates
    /// have no node to detach and are only untracked by the caller.
    fn detach(&self, id: &ComponentIdentity, graph: &mut VersionGraph, result: &mut RemovalResult) {
        if !graph.contains(id) {
            return;
        }
        if let Ok(detached) = graph.remove_component(id) {
            if !detached.active_lanes.is_empty() {
                result.removed_from_lane.push(detached.key);
            }
        }
    }

    /// Graph-only components may legitimately be absent from tracking.
    fn tolerate_untracked(&self, outcome: Result<(), TrackError>) -> Result<(), RemoveError> {
        match outcome {
            Ok(()) | Err(TrackError::NotTracked(_)) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::graph::{manifest_hash, Snap};
    use crate::core::types::{LaneName, SnapHash, UtcTimestamp, VersionTag};
    use crate::remote::mock::MockRegistry;
    use crate::status::ScopeHeads;
    use crate::workspace::memory::{MemoryObjectStore, MemoryWorkspace};
    use crate::workspace::ObjectStore as _;
    use std::collections::BTreeMap;

    fn cid(s: &str) -> ComponentIdentity {
        ComponentIdentity::parse(s).unwrap()
    }

    fn scope(s: &str) -> Scope {
        Scope::new(s).unwrap()
    }

    fn ids(items: &[&str]) -> IdentitySet {
        items.iter().map(|s| cid(s)).collect()
    }

    struct Fixture {
        workspace: MemoryWorkspace,
        store: MemoryObjectStore,
        registry: Arc<MockRegistry>,
        graph: VersionGraph,
        engine: RemoveEngine,
    }

    impl Fixture {
        fn new() -> Self {
            let workspace = MemoryWorkspace::new();
            let registry = Arc::new(MockRegistry::new());
            let engine = RemoveEngine::new(
                Arc::new(workspace.clone()),
                registry.clone(),
                registry.clone(),
            );
            Self {
                workspace,
                store: MemoryObjectStore::new(),
                registry,
                graph: VersionGraph::new(),
                engine,
            }
        }

        fn resolver(&self) -> StatusResolver {
            StatusResolver::new(
                Arc::new(self.workspace.clone()),
                Arc::new(self.store.clone()),
                ScopeHeads::new(),
                None,
            )
        }

        /// Seed a tracked, snapped, clean component and return its
        /// snapped identity.
        async fn snapped(&mut self, id: &str, tag: &str) -> ComponentIdentity {
            let id = cid(id);
            let files: BTreeMap<String, SnapHash> =
                [("index.ts".to_string(), SnapHash::compute(id.to_string().as_bytes()))]
                    .into_iter()
                    .collect();
            let snap = Snap {
                parent: None,
                files: files.clone(),
                message: None,
                timestamp: UtcTimestamp::now(),
            };
            let head = self.store.put_object(&snap.to_bytes()).await.unwrap();
            let version: semver::Version = tag.parse().unwrap();
            let tagged = id.with_version(VersionTag::Semver(version.clone()));

            let log = self.graph.ensure_node(&id);
            log.snap_on(&LaneName::default_lane(), head.clone()).unwrap();
            log.tag(version, head).unwrap();

            self.workspace
                .insert_component(tagged.clone(), manifest_hash(&files), files);
            tagged
        }
    }

    mod local {
        use super::*;

        #[tokio::test]
        async fn removes_clean_component_and_cleans_metadata() {
            let mut fx = Fixture::new();
            let id = fx.snapped("acme.ui/button", "1.0.0").await;
            let mut resolver = fx.resolver();

            let outcome = fx
                .engine
                .remove_components(
                    &ids(&["acme.ui/button"]),
                    RemoveFlags::default(),
                    &mut fx.graph,
                    &mut resolver,
                )
                .await
                .unwrap();

            assert!(outcome.local.removed_identities.contains(&id));
            assert!(outcome.local.modified_skipped.is_empty());
            assert!(!fx.graph.contains(&id));
            assert!(!fx.workspace.is_tracked(&id));
            assert_eq!(fx.workspace.cleaned_manifests().len(), 1);
            assert!(outcome.remote.is_empty());
        }

        #[tokio::test]
        async fn modified_component_is_skipped_without_force() {
            let mut fx = Fixture::new();
            let id = fx.snapped("acme.ui/button", "1.0.0").await;
            // drift the working copy away from the snapped manifest
            fx.workspace.insert_component(
                id.clone(),
                SnapHash::compute(b"locally edited"),
                [("index.ts".to_string(), SnapHash::compute(b"locally edited"))],
            );
            let mut resolver = fx.resolver();

            let outcome = fx
                .engine
                .remove_components(
                    &ids(&["acme.ui/button"]),
                    RemoveFlags::default(),
                    &mut fx.graph,
                    &mut resolver,
                )
                .await
                .unwrap();

            assert!(outcome.local.modified_skipped.contains(&id));
            assert!(!outcome.local.removed_identities.contains(&id));
            assert!(fx.graph.contains(&id));
        }

        #[tokio::test]
        async fn force_removes_modified_component() {
            let mut fx = Fixture::new();
            let id = fx.snapped("acme.ui/button", "1.0.0").await;
            fx.workspace.insert_component(
                id.clone(),
                SnapHash::compute(b"locally edited"),
                [("index.ts".to_string(), SnapHash::compute(b"locally edited"))],
            );
            let mut resolver = fx.resolver();

            let outcome = fx
                .engine
                .remove_components(
                    &ids(&["acme.ui/button"]),
                    RemoveFlags {
                        force: true,
                        ..RemoveFlags::default()
                    },
                    &mut fx.graph,
                    &mut resolver,
                )
                .await
                .unwrap();

            assert!(outcome.local.removed_identities.contains(&id));
            assert!(outcome.local.modified_skipped.is_empty());
        }

        #[tokio::test]
        async fn status_failure_skips_the_candidate_only() {
            let mut fx = Fixture::new();
            let broken = fx.snapped("acme.ui/gadget", "1.0.0").await;
            let clean = fx.snapped("acme.ui/button", "1.0.0").await;
            // working copy no longer claims a resolvable version
            fx.workspace.insert_component(
                broken.without_version(),
                SnapHash::compute(b"adrift"),
                [("index.ts".to_string(), SnapHash::compute(b"adrift"))],
            );
            let mut resolver = fx.resolver();

            let outcome = fx
                .engine
                .remove_components(
                    &ids(&["acme.ui/gadget", "acme.ui/button"]),
                    RemoveFlags::default(),
                    &mut fx.graph,
                    &mut resolver,
                )
                .await
                .unwrap();

            let reason = &outcome.local.status_failures["acme.ui/gadget"];
            assert!(reason.contains("out of sync"));
            assert!(!outcome.local.removed_identities.contains(&broken));
            assert!(fx.graph.contains(&broken));
            assert!(fx.workspace.is_tracked(&broken));

            // the failing candidate never shadows the clean one
            assert!(outcome.local.removed_identities.contains(&clean));
            assert!(!fx.graph.contains(&clean));
        }

        #[tokio::test]
        async fn unknown_component_reports_missing() {
            let mut fx = Fixture::new();
            let mut resolver = fx.resolver();

            let outcome = fx
                .engine
                .remove_components(
                    &ids(&["acme.ui/ghost"]),
                    RemoveFlags::default(),
                    &mut fx.graph,
                    &mut resolver,
                )
                .await
                .unwrap();

            assert!(outcome.local.missing_identities.contains(&cid("acme.ui/ghost")));
            assert!(outcome.local.removed_identities.is_empty());
        }

        #[tokio::test]
        async fn dependents_block_unforced_removal() {
            let mut fx = Fixture::new();
            let id = fx.snapped("acme.ui/button", "1.0.0").await;
            fx.workspace.add_dependent(&id, cid("acme.ui/form"));
            let mut resolver = fx.resolver();

            let outcome = fx
                .engine
                .remove_components(
                    &ids(&["acme.ui/button"]),
                    RemoveFlags::default(),
                    &mut fx.graph,
                    &mut resolver,
                )
                .await
                .unwrap();

            let dependents = &outcome.local.blocking_dependents["acme.ui/button"];
            assert_eq!(dependents, &vec!["acme.ui/form".to_string()]);
            assert!(outcome.local.removed_identities.is_empty());
            assert!(fx.graph.contains(&id));
        }

        #[tokio::test]
        async fn never_snapshotted_component_is_only_untracked() {
            let mut fx = Fixture::new();
            let id = cid("acme.ui/draft");
            fx.workspace.insert_component(
                id.clone(),
                SnapHash::compute(b"draft"),
                [("draft.ts".to_string(), SnapHash::compute(b"draft"))],
            );
            let mut resolver = fx.resolver();

            let outcome = fx
                .engine
                .remove_components(
                    &ids(&["acme.ui/draft"]),
                    RemoveFlags::default(),
                    &mut fx.graph,
                    &mut resolver,
                )
                .await
                .unwrap();

            assert!(outcome.local.removed_identities.contains(&id));
            assert!(outcome.local.removed_from_lane.is_empty());
            assert!(!fx.workspace.is_tracked(&id));
        }

        #[tokio::test]
        async fn lane_membership_is_reported() {
            let mut fx = Fixture::new();
            let id = fx.snapped("acme.ui/button", "1.0.0").await;
            let feature = LaneName::new("feature-x").unwrap();
            {
                let log = fx.graph.ensure_node(&id);
                let head = log.latest().cloned().unwrap();
                log.set_head(feature, head).unwrap();
            }
            let mut resolver = fx.resolver();

            let outcome = fx
                .engine
                .remove_components(
                    &ids(&["acme.ui/button"]),
                    RemoveFlags::default(),
                    &mut fx.graph,
                    &mut resolver,
                )
                .await
                .unwrap();

            assert_eq!(outcome.local.removed_from_lane, vec!["acme.ui/button"]);
        }

        #[tokio::test]
        async fn delete_files_and_track_flags() {
            let mut fx = Fixture::new();
            let id = fx.snapped("acme.ui/button", "1.0.0").await;
            let mut resolver = fx.resolver();

            fx.engine
                .remove_components(
                    &ids(&["acme.ui/button"]),
                    RemoveFlags {
                        delete_files: true,
                        track: true,
                        ..RemoveFlags::default()
                    },
                    &mut fx.graph,
                    &mut resolver,
                )
                .await
                .unwrap();

            assert_eq!(fx.workspace.deleted_files().len(), 1);
            // track keeps the tracking map and manifests untouched
            assert!(fx.workspace.is_tracked(&id));
            assert!(fx.workspace.cleaned_manifests().is_empty());
        }
    }

    mod remote {
        use super::*;

        #[tokio::test]
        async fn unscoped_id_is_rejected() {
            let mut fx = Fixture::new();
            let mut resolver = fx.resolver();

            let err = fx
                .engine
                .remove_components(
                    &ids(&["local-only"]),
                    RemoveFlags {
                        remote: true,
                        ..RemoveFlags::default()
                    },
                    &mut fx.graph,
                    &mut resolver,
                )
                .await
                .unwrap_err();

            assert!(matches!(err, RemoveError::UnscopedRemoteRemoval(_)));
        }

        #[tokio::test]
        async fn per_scope_deletes_preserve_partial_success() {
            let mut fx = Fixture::new();
            fx.registry.seed(&scope("acme.ui"), ["acme.ui/button"]);
            fx.registry.fail_scope(
                &scope("acme.infra"),
                RegistryError::NetworkError("connection reset".into()),
            );
            let mut resolver = fx.resolver();

            let outcome = fx
                .engine
                .remove_components(
                    &ids(&["acme.ui/button", "acme.infra/queue"]),
                    RemoveFlags {
                        remote: true,
                        ..RemoveFlags::default()
                    },
                    &mut fx.graph,
                    &mut resolver,
                )
                .await
                .unwrap();

            assert_eq!(outcome.remote.len(), 2);
            let infra = &outcome.remote[0];
            assert_eq!(infra.scope, Some(scope("acme.infra")));
            assert!(infra.outcome.is_err());
            let ui = &outcome.remote[1];
            assert_eq!(ui.scope, Some(scope("acme.ui")));
            let removed = ui.outcome.as_ref().unwrap();
            assert_eq!(removed.removed, vec!["acme.ui/button"]);
        }

        #[tokio::test]
        async fn unknown_remote_ids_come_back_missing() {
            let mut fx = Fixture::new();
            fx.registry.seed(&scope("acme.ui"), ["acme.ui/button"]);
            let mut resolver = fx.resolver();

            let outcome = fx
                .engine
                .remove_components(
                    &ids(&["acme.ui/ghost"]),
                    RemoveFlags {
                        remote: true,
                        ..RemoveFlags::default()
                    },
                    &mut fx.graph,
                    &mut resolver,
                )
                .await
                .unwrap();

            let removed = outcome.remote[0].outcome.as_ref().unwrap();
            assert_eq!(removed.missing, vec!["acme.ui/ghost"]);
        }

        #[tokio::test]
        async fn hub_hosted_scopes_use_the_batched_path() {
            let mut fx = Fixture::new();
            fx.registry.seed(&scope("acme.ui"), ["acme.ui/button"]);
            fx.registry.seed(&scope("acme.infra"), ["acme.infra/queue"]);
            fx.registry.host_on_hub(&scope("acme.ui"));
            fx.registry.host_on_hub(&scope("acme.infra"));
            let mut resolver = fx.resolver();

            let outcome = fx
                .engine
                .remove_components(
                    &ids(&["acme.ui/button", "acme.infra/queue"]),
                    RemoveFlags {
                        remote: true,
                        ..RemoveFlags::default()
                    },
                    &mut fx.graph,
                    &mut resolver,
                )
                .await
                .unwrap();

            assert_eq!(fx.registry.hub_calls(), 1);
            assert!(fx.registry.delete_calls().is_empty());
            assert!(!outcome.remote.is_empty());
        }

        #[tokio::test]
        async fn mixed_hosting_falls_back_to_per_scope() {
            let mut fx = Fixture::new();
            fx.registry.seed(&scope("acme.ui"), ["acme.ui/button"]);
            fx.registry.seed(&scope("acme.infra"), ["acme.infra/queue"]);
            fx.registry.host_on_hub(&scope("acme.ui"));
            let mut resolver = fx.resolver();

            fx.engine
                .remove_components(
                    &ids(&["acme.ui/button", "acme.infra/queue"]),
                    RemoveFlags {
                        remote: true,
                        ..RemoveFlags::default()
                    },
                    &mut fx.graph,
                    &mut resolver,
                )
                .await
                .unwrap();

            assert_eq!(fx.registry.hub_calls(), 0);
            assert_eq!(fx.registry.delete_calls().len(), 2);
        }
    }

    mod normalization {
        use super::*;

        #[tokio::test]
        async fn candidates_are_pinned_to_latest_version() {
            let mut fx = Fixture::new();
            fx.snapped("acme.ui/button", "1.0.0").await;
            let mut resolver = fx.resolver();

            // request an older version; removal is whole-component
            let outcome = fx
                .engine
                .remove_components(
                    &ids(&["acme.ui/button@0.9.0"]),
                    RemoveFlags {
                        force: true,
                        ..RemoveFlags::default()
                    },
                    &mut fx.graph,
                    &mut resolver,
                )
                .await
                .unwrap();

            assert!(outcome
                .local
                .removed_identities
                .contains(&cid("acme.ui/button@1.0.0")));
            assert!(!fx.graph.contains(&cid("acme.ui/button")));
        }
    }
}
