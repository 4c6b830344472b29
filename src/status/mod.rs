//! status
//!
//! Working-copy status resolution against the version graph.
//!
//! # State machine
//!
//! Per identity, the resolver classifies into a [`StatusRecord`] whose
//! terminal facets are mutually exclusive:
//!
//! - `not_exist` - no graph record and no working-copy files
//! - `newly_created` - graph record absent or still at version zero
//! - `deleted` - graph record exists but working-copy files are gone
//!
//! `missing_from_scope` (objects pending import, retry after fetch) and
//! the combinable `staged`/`modified` facets sit alongside the terminal
//! ones. The "at most one terminal facet" invariant is enforced by the
//! record's factory constructors, not by convention.
//!
//! # Caching
//!
//! Results are cached per full identity string for the lifetime of the
//! resolver. The cache is an explicit object constructed per session and
//! invalidated by mutating operations (snap, tag, remove) on the same
//! identity; no hidden module-level state.
//!
//! # Batching
//!
//! [`StatusResolver::get_many_statuses`] is sequential by design: later
//! identities may legitimately depend on side effects of earlier ones
//! (shared object-store reads), and sequential execution keeps the cache
//! trivially consistent without locking.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::graph::{Snap, VersionGraph};
use crate::core::id_set::IdentitySet;
use crate::core::types::{ComponentIdentity, LaneName, SnapHash};
use crate::workspace::{LoadError, ObjectStore, ObjectStoreError, WorkingCopyLoader};

/// Errors from status resolution.
///
/// Expected-absence load failures never surface here; they become status
/// facets. What remains is unrecoverable without user intervention or a
/// genuine I/O fault.
#[derive(Debug, Error)]
pub enum StatusError {
    /// The working copy has no resolvable version for the component.
    #[error("component out of sync, working copy has no resolvable version: {0}")]
    OutOfSync(String),

    /// Loader failure outside the expected-absence classes.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// Object store failure.
    #[error(transparent)]
    ObjectStore(#[from] ObjectStoreError),

    /// A fetched snap object could not be decoded.
    #[error("corrupt snap object {hash}: {reason}")]
    CorruptSnap { hash: SnapHash, reason: String },
}

/// Non-exclusive boolean facets describing a component's status.
///
/// Constructed through the terminal-state factories so that at most one
/// of `not_exist`, `deleted`, `newly_created` can ever be set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRecord {
    modified: bool,
    newly_created: bool,
    deleted: bool,
    staged: bool,
    not_exist: bool,
    missing_from_scope: bool,
}

impl StatusRecord {
    /// A component with a record and working files: the baseline onto
    /// which `staged`/`modified` combine.
    pub fn existing() -> Self {
        Self::default()
    }

    /// No graph record and no working-copy files.
    pub fn not_exist() -> Self {
        Self {
            not_exist: true,
            ..Self::default()
        }
    }

    /// Graph record exists but the working copy is gone.
    pub fn deleted() -> Self {
        Self {
            deleted: true,
            ..Self::default()
        }
    }

    /// Graph record absent or still at the version-zero sentinel.
    pub fn newly_created() -> Self {
        Self {
            newly_created: true,
            ..Self::default()
        }
    }

    /// Set the `modified` facet.
    pub fn with_modified(mut self, modified: bool) -> Self {
        self.modified = modified;
        self
    }

    /// Set the `staged` facet.
    pub fn with_staged(mut self, staged: bool) -> Self {
        self.staged = staged;
        self
    }

    /// Set the `missing_from_scope` facet.
    pub fn with_missing_from_scope(mut self, missing: bool) -> Self {
        self.missing_from_scope = missing;
        self
    }

    /// Working-copy content differs from the recorded version.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Graph record absent or at version zero.
    pub fn is_newly_created(&self) -> bool {
        self.newly_created
    }

    /// Record exists but files are gone.
    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Local head has snaps the remote/lane head lacks.
    pub fn is_staged(&self) -> bool {
        self.staged
    }

    /// Neither recorded nor present in the working copy.
    pub fn is_not_exist(&self) -> bool {
        self.not_exist
    }

    /// Referenced objects are not fetched yet; retry after import.
    pub fn is_missing_from_scope(&self) -> bool {
        self.missing_from_scope
    }
}

/// Explicit per-session status cache keyed by full identity string.
#[derive(Debug, Default)]
pub struct StatusCache {
    entries: HashMap<String, StatusRecord>,
}

impl StatusCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a cached record.
    pub fn get(&self, id: &ComponentIdentity) -> Option<&StatusRecord> {
        self.entries.get(&id.to_string())
    }

    /// Store a record.
    pub fn put(&mut self, id: &ComponentIdentity, record: StatusRecord) {
        self.entries.insert(id.to_string(), record);
    }

    /// Clear a single entry.
    pub fn invalidate(&mut self, id: &ComponentIdentity) {
        self.entries.remove(&id.to_string());
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Remote heads as locally known, keyed by version-stripped identity.
///
/// This is the resolver's view of the fetched scope objects; a missing
/// entry means the remote has never seen the component.
pub type ScopeHeads = HashMap<String, SnapHash>;

/// Resolves working-copy state against the version graph.
pub struct StatusResolver {
    loader: Arc<dyn WorkingCopyLoader>,
    store: Arc<dyn ObjectStore>,
    remote_heads: ScopeHeads,
    active_lane: Option<LaneName>,
    cache: StatusCache,
}

impl StatusResolver {
    /// Create a resolver session.
    ///
    /// `remote_heads` carries the locally fetched remote head per
    /// component; `active_lane` is the checked-out lane, whose head
    /// supersedes the default lane for divergence.
    pub fn new(
        loader: Arc<dyn WorkingCopyLoader>,
        store: Arc<dyn ObjectStore>,
        remote_heads: ScopeHeads,
        active_lane: Option<LaneName>,
    ) -> Self {
        Self {
            loader,
            store,
            remote_heads,
            active_lane,
            cache: StatusCache::new(),
        }
    }

    /// The active lane this session resolves against.
    pub fn active_lane(&self) -> Option<&LaneName> {
        self.active_lane.as_ref()
    }

    /// Clear the cached record for one identity. Call after any mutating
    /// operation (snap, tag, removal) on it.
    pub fn invalidate(&mut self, id: &ComponentIdentity) {
        self.cache.invalidate(id);
    }

    /// Resolve the status of one component.
    ///
    /// Cached per full identity for the resolver's lifetime; the loader
    /// is not consulted again until [`StatusResolver::invalidate`].
    ///
    /// # Errors
    ///
    /// `StatusError::OutOfSync` if the working copy has no resolvable
    /// version; loader/object-store faults outside the expected-absence
    /// classes propagate unmodified.
    pub async fn get_status(
        &mut self,
        id: &ComponentIdentity,
        graph: &VersionGraph,
    ) -> Result<StatusRecord, StatusError> {
        if let Some(cached) = self.cache.get(id) {
            return Ok(cached.clone());
        }
        let record = self.resolve(id, graph).await?;
        self.cache.put(id, record.clone());
        Ok(record)
    }

    /// Resolve many components sequentially, one at a time.
    ///
    /// # Errors
    ///
    /// Aborts on the first hard error; expected absences are facets and
    /// never abort.
    pub async fn get_many_statuses(
        &mut self,
        ids: &IdentitySet,
        graph: &VersionGraph,
    ) -> Result<Vec<(ComponentIdentity, StatusRecord)>, StatusError> {
        let mut records = Vec::with_capacity(ids.len());
        for id in ids.iter() {
            let record = self.get_status(id, graph).await?;
            records.push((id.clone(), record));
        }
        Ok(records)
    }

    async fn resolve(
        &self,
        id: &ComponentIdentity,
        graph: &VersionGraph,
    ) -> Result<StatusRecord, StatusError> {
        let node = graph.node(id);

        let working = match self.loader.load_one(id).await {
            Ok(working) => working,
            Err(e) if e.is_absence() => {
                // Files are gone; the graph decides between deleted and
                // never-existed.
                return Ok(match node {
                    Some(_) => StatusRecord::deleted(),
                    None => StatusRecord::not_exist(),
                });
            }
            Err(LoadError::PendingImport(_)) => {
                return Ok(StatusRecord::existing().with_missing_from_scope(true));
            }
            Err(e) => return Err(e.into()),
        };

        let Some(log) = node.filter(|log| !log.is_version_zero()) else {
            return Ok(StatusRecord::newly_created());
        };

        let remote_head = self.remote_heads.get(&id.stripped_string());
        let staged = log.is_locally_ahead(self.active_lane.as_ref(), remote_head);

        // Modified is judged against the specific version the working
        // copy claims to be at.
        let claimed = working
            .id
            .version
            .as_ref()
            .ok_or_else(|| StatusError::OutOfSync(id.to_string()))?;
        let recorded = log
            .resolve(claimed)
            .ok_or_else(|| StatusError::OutOfSync(id.to_string()))?;

        let snap_bytes = match self.store.get_object(&recorded).await? {
            Some(bytes) => bytes,
            // Recorded version's objects are not fetched locally
            None => return Ok(StatusRecord::existing().with_missing_from_scope(true)),
        };
        let snap = Snap::from_bytes(&snap_bytes).map_err(|e| StatusError::CorruptSnap {
            hash: recorded.clone(),
            reason: e.to_string(),
        })?;

        let modified = snap.content_hash() != working.content_hash;
        Ok(StatusRecord::existing()
            .with_staged(staged)
            .with_modified(modified))
    }
}
