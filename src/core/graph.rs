//! core::graph
//!
//! Per-component append-only version history and the workspace-wide graph.
//!
//! # Architecture
//!
//! The graph is an arena: a map from version-stripped identity string to
//! [`VersionLog`]. Logs never hold references to each other or to
//! identities; everything is keyed externally so identities stay cheap to
//! clone and compare.
//!
//! A [`VersionLog`] holds one head pointer per lane, an ordered append log
//! of snap hashes with parent links, and semver-tag bindings. An empty log
//! is the "version zero" state: the component is tracked in the workspace
//! but has never been snapshotted.
//!
//! # Invariants
//!
//! - The append log is immutable and monotonically growing
//! - A head always points at a hash present in the log
//! - Logs are never physically deleted; removal detaches the whole node
//!   and is reported, not silent
//!
//! # Divergence
//!
//! [`VersionLog::compute_divergence`] walks both histories backward from
//! their heads along parent links until a common hash is found or either
//! side is exhausted. A missing common ancestor is an error carried in the
//! result, never an empty divergence: silently reporting full divergence
//! would mask a broken history.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::types::{ComponentIdentity, LaneName, SnapHash, UtcTimestamp, VersionTag};

/// Errors from version-graph operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    /// The hash is already present in the append log.
    #[error("snap {0} already present in log, appends must be monotonic")]
    NonMonotonicAppend(SnapHash),

    /// The referenced parent hash is not in the log.
    #[error("unknown parent snap: {0}")]
    UnknownParent(SnapHash),

    /// The referenced snap hash is not in the log.
    #[error("unknown snap: {0}")]
    UnknownSnap(SnapHash),

    /// The semver tag is already bound to a different snap.
    #[error("tag {0} is already bound")]
    TagExists(semver::Version),

    /// No graph node for the component.
    #[error("component not found in graph: {0}")]
    ComponentNotFound(String),
}

/// Why a divergence computation could not produce an ancestor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DivergenceError {
    /// The two histories share no snap at all.
    NoCommonAncestor,
}

impl std::fmt::Display for DivergenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DivergenceError::NoCommonAncestor => write!(f, "histories share no common ancestor"),
        }
    }
}

/// The outcome of comparing two heads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DivergenceResult {
    /// The most recent snap shared by both histories.
    pub common_ancestor: Option<SnapHash>,
    /// Snaps reachable from the source head but not the target head,
    /// newest first.
    pub snaps_only_on_source: Vec<SnapHash>,
    /// Snaps reachable from the target head but not the source head,
    /// newest first.
    pub snaps_only_on_target: Vec<SnapHash>,
    /// Set when no common ancestor exists; the only-on lists are empty in
    /// that case rather than misreporting full divergence.
    pub error: Option<DivergenceError>,
}

impl DivergenceResult {
    /// Both sides have snaps the other lacks.
    pub fn is_diverged(&self) -> bool {
        !self.snaps_only_on_source.is_empty() && !self.snaps_only_on_target.is_empty()
    }

    /// The source head has snaps the target lacks ("staged").
    pub fn is_source_ahead(&self) -> bool {
        !self.snaps_only_on_source.is_empty()
    }

    /// The target head has snaps the source lacks.
    pub fn is_target_ahead(&self) -> bool {
        !self.snaps_only_on_target.is_empty()
    }

    /// The heads are the same snap.
    pub fn is_up_to_date(&self) -> bool {
        self.error.is_none()
            && self.snaps_only_on_source.is_empty()
            && self.snaps_only_on_target.is_empty()
    }
}

/// An immutable snapshot of a component.
///
/// This is the logical shape of the object-store payload: a file manifest
/// (path to content hash) plus provenance. A snap is addressed in the
/// object store by the hash of its serialized bytes; its *content* hash,
/// compared against the working copy by the status resolver, is derived
/// from the file manifest alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snap {
    /// Parent snap, `None` for a component's first snap.
    pub parent: Option<SnapHash>,
    /// File manifest: workspace-relative path to file content hash.
    pub files: BTreeMap<String, SnapHash>,
    /// Snap message, if one was given.
    pub message: Option<String>,
    /// When the snap was recorded.
    pub timestamp: UtcTimestamp,
}

impl Snap {
    /// Serialize for object storage.
    pub fn to_bytes(&self) -> Vec<u8> {
        // BTreeMap keys keep the encoding stable for content addressing
        serde_json::to_vec(self).unwrap_or_default()
    }

    /// Decode a snap fetched from the object store.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Stable hash over the file manifest, comparable with a working
    /// copy's content hash.
    pub fn content_hash(&self) -> SnapHash {
        manifest_hash(&self.files)
    }
}

/// Stable content hash over a file manifest.
///
/// Paths are already sorted (`BTreeMap` iteration order), so the hash is
/// deterministic regardless of how the manifest was built.
pub fn manifest_hash(files: &BTreeMap<String, SnapHash>) -> SnapHash {
    let mut buf = Vec::new();
    for (path, hash) in files {
        buf.extend_from_slice(path.as_bytes());
        buf.push(0);
        buf.extend_from_slice(hash.as_str().as_bytes());
        buf.push(b'\n');
    }
    SnapHash::compute(&buf)
}

/// The append-only version history of a single component.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VersionLog {
    /// Head snap per lane.
    heads: HashMap<LaneName, SnapHash>,
    /// Ordered append log of snap hashes.
    log: Vec<SnapHash>,
    /// Parent link per snap in the log.
    parents: HashMap<SnapHash, Option<SnapHash>>,
    /// Semver tag bindings into the log.
    tags: BTreeMap<semver::Version, SnapHash>,
}

impl VersionLog {
    /// Create an empty log: the "version zero" state.
    pub fn new() -> Self {
        Self::default()
    }

    /// True if the component has never been snapshotted.
    pub fn is_version_zero(&self) -> bool {
        self.log.is_empty()
    }

    /// The head of a lane, if one is set.
    pub fn head(&self, lane: &LaneName) -> Option<&SnapHash> {
        self.heads.get(lane)
    }

    /// The head that governs divergence: when a lane is active its own
    /// head supersedes the default-lane head.
    pub fn resolved_head(&self, active_lane: Option<&LaneName>) -> Option<&SnapHash> {
        if let Some(lane) = active_lane {
            if let Some(head) = self.heads.get(lane) {
                return Some(head);
            }
        }
        self.heads.get(&LaneName::default_lane())
    }

    /// Lanes this log has a head on.
    pub fn lanes(&self) -> impl Iterator<Item = &LaneName> {
        self.heads.keys()
    }

    /// Append a snapshot to the log.
    ///
    /// Does not move any head; see [`VersionLog::set_head`].
    ///
    /// # Errors
    ///
    /// - `GraphError::NonMonotonicAppend` if `hash` is already in the log
    /// - `GraphError::UnknownParent` if `parent` is not in the log
    pub fn append_snapshot(
        &mut self,
        hash: SnapHash,
        parent: Option<SnapHash>,
    ) -> Result<(), GraphError> {
        if self.parents.contains_key(&hash) {
            return Err(GraphError::NonMonotonicAppend(hash));
        }
        if let Some(p) = &parent {
            if !self.parents.contains_key(p) {
                return Err(GraphError::UnknownParent(p.clone()));
            }
        }
        self.parents.insert(hash.clone(), parent);
        self.log.push(hash);
        Ok(())
    }

    /// Move a lane head to a snap already in the log.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::UnknownSnap` if `hash` is not in the log.
    pub fn set_head(&mut self, lane: LaneName, hash: SnapHash) -> Result<(), GraphError> {
        if !self.parents.contains_key(&hash) {
            return Err(GraphError::UnknownSnap(hash));
        }
        self.heads.insert(lane, hash);
        Ok(())
    }

    /// Append a snapshot whose parent is the current lane head, then move
    /// the head to it.
    pub fn snap_on(&mut self, lane: &LaneName, hash: SnapHash) -> Result<(), GraphError> {
        let parent = self.heads.get(lane).cloned();
        self.append_snapshot(hash.clone(), parent)?;
        self.set_head(lane.clone(), hash)
    }

    /// Bind a semver tag to a snap in the log.
    ///
    /// # Errors
    ///
    /// - `GraphError::UnknownSnap` if `hash` is not in the log
    /// - `GraphError::TagExists` if the tag is bound to a different snap
    pub fn tag(&mut self, version: semver::Version, hash: SnapHash) -> Result<(), GraphError> {
        if !self.parents.contains_key(&hash) {
            return Err(GraphError::UnknownSnap(hash));
        }
        match self.tags.get(&version) {
            Some(existing) if *existing != hash => Err(GraphError::TagExists(version)),
            _ => {
                self.tags.insert(version, hash);
                Ok(())
            }
        }
    }

    /// Resolve a version tag to a snap hash.
    pub fn resolve(&self, tag: &VersionTag) -> Option<SnapHash> {
        match tag {
            VersionTag::Semver(v) => self.tags.get(v).cloned(),
            VersionTag::Hash(h) => self.parents.contains_key(h).then(|| h.clone()),
        }
    }

    /// The most recently appended snap.
    pub fn latest(&self) -> Option<&SnapHash> {
        self.log.last()
    }

    /// The latest known version of the component: the highest semver tag
    /// if any exist, otherwise the newest snap hash, otherwise the
    /// version-zero sentinel.
    pub fn latest_version(&self) -> VersionTag {
        if let Some((version, _)) = self.tags.iter().next_back() {
            return VersionTag::Semver(version.clone());
        }
        match self.log.last() {
            Some(hash) => VersionTag::Hash(hash.clone()),
            None => VersionTag::Hash(SnapHash::zero()),
        }
    }

    /// True if the tag resolves into this log.
    pub fn has_version(&self, tag: &VersionTag) -> bool {
        self.resolve(tag).is_some()
    }

    /// The parent of a snap in the log.
    pub fn parent_of(&self, hash: &SnapHash) -> Option<&SnapHash> {
        self.parents.get(hash).and_then(|p| p.as_ref())
    }

    /// All snap hashes in append order.
    pub fn log(&self) -> &[SnapHash] {
        &self.log
    }

    /// Tag bindings in ascending version order.
    pub fn tags(&self) -> impl Iterator<Item = (&semver::Version, &SnapHash)> {
        self.tags.iter()
    }

    /// True if the resolved local head has snaps not reachable from the
    /// given remote head ("staged").
    pub fn is_locally_ahead(
        &self,
        active_lane: Option<&LaneName>,
        remote_head: Option<&SnapHash>,
    ) -> bool {
        let Some(local) = self.resolved_head(active_lane) else {
            return false;
        };
        let Some(remote) = remote_head else {
            // Snapped locally, never seen remotely.
            return true;
        };
        let divergence = self.compute_divergence(local, remote);
        divergence.error.is_some() || divergence.is_source_ahead()
    }

    /// Walk an ancestor chain from `head` backward, newest first.
    fn chain_from(&self, head: &SnapHash) -> Vec<SnapHash> {
        let mut chain = Vec::new();
        let mut cursor = Some(head.clone());
        while let Some(hash) = cursor {
            cursor = self.parents.get(&hash).cloned().flatten();
            chain.push(hash);
        }
        chain
    }

    /// Compare two heads of this history.
    ///
    /// Walks both parent chains backward until a shared hash is found.
    /// Every hash visited on a side before the common ancestor is recorded
    /// as only-on-that-side. No shared hash at all yields a result with
    /// [`DivergenceError::NoCommonAncestor`] set and empty only-on lists.
    pub fn compute_divergence(&self, source: &SnapHash, target: &SnapHash) -> DivergenceResult {
        if source == target {
            return DivergenceResult {
                common_ancestor: Some(source.clone()),
                snaps_only_on_source: Vec::new(),
                snaps_only_on_target: Vec::new(),
                error: None,
            };
        }

        let source_chain = self.chain_from(source);

        let mut only_on_target = Vec::new();
        let mut cursor = Some(target.clone());
        while let Some(hash) = cursor {
            if let Some(pos) = source_chain.iter().position(|s| *s == hash) {
                return DivergenceResult {
                    common_ancestor: Some(hash),
                    snaps_only_on_source: source_chain[..pos].to_vec(),
                    snaps_only_on_target: only_on_target,
                    error: None,
                };
            }
            cursor = self.parents.get(&hash).cloned().flatten();
            only_on_target.push(hash);
        }

        DivergenceResult {
            common_ancestor: None,
            snaps_only_on_source: Vec::new(),
            snaps_only_on_target: Vec::new(),
            error: Some(DivergenceError::NoCommonAncestor),
        }
    }
}

/// A component detached from the graph by logical removal.
#[derive(Debug, Clone, PartialEq)]
pub struct DetachedNode {
    /// The graph key the node was stored under.
    pub key: String,
    /// Non-default lanes that still had a head on the node.
    pub active_lanes: Vec<LaneName>,
    /// The detached log.
    pub log: VersionLog,
}

/// The workspace-wide version graph: one [`VersionLog`] per component,
/// keyed by version-stripped identity string.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VersionGraph {
    nodes: HashMap<String, VersionLog>,
}

impl VersionGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// The log for a component, if the graph has one.
    pub fn node(&self, id: &ComponentIdentity) -> Option<&VersionLog> {
        self.nodes.get(&id.stripped_string())
    }

    /// Look up a node by its version-stripped key.
    pub fn node_by_key(&self, key: &str) -> Option<&VersionLog> {
        self.nodes.get(key)
    }

    /// Mutable access to a component's log.
    pub fn node_mut(&mut self, id: &ComponentIdentity) -> Option<&mut VersionLog> {
        self.nodes.get_mut(&id.stripped_string())
    }

    /// The log for a component, created empty on first use.
    pub fn ensure_node(&mut self, id: &ComponentIdentity) -> &mut VersionLog {
        self.nodes.entry(id.stripped_string()).or_default()
    }

    /// True if the graph has a node for the component.
    pub fn contains(&self, id: &ComponentIdentity) -> bool {
        self.nodes.contains_key(&id.stripped_string())
    }

    /// Number of components in the graph.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if the graph holds no components.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate all (key, log) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &VersionLog)> {
        self.nodes.iter()
    }

    /// Graph keys of components that have a head on the lane.
    pub fn components_on_lane(&self, lane: &LaneName) -> Vec<String> {
        let mut keys: Vec<String> = self
            .nodes
            .iter()
            .filter(|(_, log)| log.head(lane).is_some())
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }

    /// All lanes any component has a head on, sorted.
    pub fn lanes(&self) -> Vec<LaneName> {
        let mut lanes: Vec<LaneName> = self
            .nodes
            .values()
            .flat_map(|log| log.lanes().cloned())
            .collect();
        lanes.sort();
        lanes.dedup();
        lanes
    }

    /// Logically remove a component: detach its node and report which
    /// non-default lanes still pointed at it.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::ComponentNotFound` if the graph has no node
    /// for the component.
    pub fn remove_component(&mut self, id: &ComponentIdentity) -> Result<DetachedNode, GraphError> {
        let key = id.stripped_string();
        let log = self
            .nodes
            .remove(&key)
            .ok_or_else(|| GraphError::ComponentNotFound(key.clone()))?;
        let mut active_lanes: Vec<LaneName> = log
            .lanes()
            .filter(|lane| !lane.is_default())
            .cloned()
            .collect();
        active_lanes.sort();
        Ok(DetachedNode {
            key,
            active_lanes,
            log,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::ComponentIdentity;

    fn hash(n: u8) -> SnapHash {
        SnapHash::compute(&[n])
    }

    fn lane(s: &str) -> LaneName {
        LaneName::new(s).unwrap()
    }

    /// A log with a linear main history h1 -> h2 -> h3.
    fn linear_log() -> (VersionLog, SnapHash, SnapHash, SnapHash) {
        let mut log = VersionLog::new();
        let (h1, h2, h3) = (hash(1), hash(2), hash(3));
        let main = LaneName::default_lane();
        log.snap_on(&main, h1.clone()).unwrap();
        log.snap_on(&main, h2.clone()).unwrap();
        log.snap_on(&main, h3.clone()).unwrap();
        (log, h1, h2, h3)
    }

    mod version_log {
        use super::*;

        #[test]
        fn starts_at_version_zero() {
            let log = VersionLog::new();
            assert!(log.is_version_zero());
            assert!(log.latest().is_none());
            assert_eq!(log.latest_version(), VersionTag::Hash(SnapHash::zero()));
        }

        #[test]
        fn append_grows_log_monotonically() {
            let (log, h1, h2, h3) = linear_log();
            assert!(!log.is_version_zero());
            assert_eq!(log.log(), &[h1, h2, h3.clone()]);
            assert_eq!(log.latest(), Some(&h3));
        }

        #[test]
        fn append_rejects_duplicate_hash() {
            let (mut log, h1, _, _) = linear_log();
            let err = log.append_snapshot(h1.clone(), None).unwrap_err();
            assert_eq!(err, GraphError::NonMonotonicAppend(h1));
        }

        #[test]
        fn append_rejects_unknown_parent() {
            let mut log = VersionLog::new();
            let err = log
                .append_snapshot(hash(1), Some(hash(99)))
                .unwrap_err();
            assert!(matches!(err, GraphError::UnknownParent(_)));
        }

        #[test]
        fn set_head_rejects_unknown_snap() {
            let mut log = VersionLog::new();
            let err = log.set_head(lane("main"), hash(1)).unwrap_err();
            assert!(matches!(err, GraphError::UnknownSnap(_)));
        }

        #[test]
        fn parent_links_follow_lane_head() {
            let (log, h1, h2, h3) = linear_log();
            assert_eq!(log.parent_of(&h3), Some(&h2));
            assert_eq!(log.parent_of(&h2), Some(&h1));
            assert_eq!(log.parent_of(&h1), None);
        }

        #[test]
        fn tag_binds_and_resolves() {
            let (mut log, h1, _, h3) = linear_log();
            let v1 = semver::Version::new(1, 0, 0);
            let v2 = semver::Version::new(2, 0, 0);
            log.tag(v1.clone(), h1.clone()).unwrap();
            log.tag(v2.clone(), h3.clone()).unwrap();

            assert_eq!(log.resolve(&VersionTag::Semver(v1)), Some(h1));
            assert_eq!(log.resolve(&VersionTag::Semver(v2.clone())), Some(h3));
            assert_eq!(log.latest_version(), VersionTag::Semver(v2));
        }

        #[test]
        fn tag_rebind_to_other_snap_rejected() {
            let (mut log, h1, h2, _) = linear_log();
            let v1 = semver::Version::new(1, 0, 0);
            log.tag(v1.clone(), h1).unwrap();
            let err = log.tag(v1.clone(), h2).unwrap_err();
            assert_eq!(err, GraphError::TagExists(v1));
        }

        #[test]
        fn tag_same_snap_twice_is_idempotent() {
            let (mut log, h1, _, _) = linear_log();
            let v1 = semver::Version::new(1, 0, 0);
            log.tag(v1.clone(), h1.clone()).unwrap();
            assert!(log.tag(v1, h1).is_ok());
        }

        #[test]
        fn resolve_hash_requires_membership() {
            let (log, h1, _, _) = linear_log();
            assert_eq!(log.resolve(&VersionTag::Hash(h1.clone())), Some(h1));
            assert_eq!(log.resolve(&VersionTag::Hash(hash(99))), None);
        }

        #[test]
        fn latest_version_prefers_semver_tags() {
            let (mut log, h1, _, h3) = linear_log();
            assert_eq!(log.latest_version(), VersionTag::Hash(h3));
            log.tag(semver::Version::new(0, 1, 0), h1).unwrap();
            assert_eq!(
                log.latest_version(),
                VersionTag::Semver(semver::Version::new(0, 1, 0))
            );
        }

        #[test]
        fn active_lane_head_supersedes_default() {
            let (mut log, _, h2, h3) = linear_log();
            let feature = lane("feature-x");
            log.set_head(feature.clone(), h2.clone()).unwrap();

            assert_eq!(log.resolved_head(Some(&feature)), Some(&h2));
            assert_eq!(log.resolved_head(None), Some(&h3));
            // Active lane without a head falls back to default
            assert_eq!(log.resolved_head(Some(&lane("other"))), Some(&h3));
        }
    }

    mod divergence {
        use super::*;

        #[test]
        fn identical_heads_are_up_to_date() {
            let (log, _, _, h3) = linear_log();
            let result = log.compute_divergence(&h3, &h3);
            assert!(result.is_up_to_date());
            assert_eq!(result.common_ancestor, Some(h3));
        }

        #[test]
        fn source_ahead_on_linear_history() {
            let (log, h1, h2, h3) = linear_log();
            let result = log.compute_divergence(&h3, &h1);
            assert_eq!(result.common_ancestor, Some(h1));
            assert_eq!(result.snaps_only_on_source, vec![h3, h2]);
            assert!(result.snaps_only_on_target.is_empty());
            assert!(result.is_source_ahead());
            assert!(!result.is_diverged());
        }

        #[test]
        fn forked_history_diverges() {
            let mut log = VersionLog::new();
            let (base, left, right) = (hash(1), hash(2), hash(3));
            log.append_snapshot(base.clone(), None).unwrap();
            log.append_snapshot(left.clone(), Some(base.clone())).unwrap();
            log.append_snapshot(right.clone(), Some(base.clone())).unwrap();

            let result = log.compute_divergence(&left, &right);
            assert_eq!(result.common_ancestor, Some(base));
            assert_eq!(result.snaps_only_on_source, vec![left]);
            assert_eq!(result.snaps_only_on_target, vec![right]);
            assert!(result.is_diverged());
        }

        #[test]
        fn disjoint_histories_carry_error() {
            let mut log = VersionLog::new();
            let (a, b) = (hash(1), hash(2));
            log.append_snapshot(a.clone(), None).unwrap();
            log.append_snapshot(b.clone(), None).unwrap();

            let result = log.compute_divergence(&a, &b);
            assert_eq!(result.error, Some(DivergenceError::NoCommonAncestor));
            assert!(result.common_ancestor.is_none());
            // Never misreported as a full divergence
            assert!(result.snaps_only_on_source.is_empty());
            assert!(result.snaps_only_on_target.is_empty());
        }

        #[test]
        fn symmetric_in_structure() {
            let mut log = VersionLog::new();
            let (base, l1, l2, r1) = (hash(1), hash(2), hash(3), hash(4));
            log.append_snapshot(base.clone(), None).unwrap();
            log.append_snapshot(l1.clone(), Some(base.clone())).unwrap();
            log.append_snapshot(l2.clone(), Some(l1.clone())).unwrap();
            log.append_snapshot(r1.clone(), Some(base.clone())).unwrap();

            let forward = log.compute_divergence(&l2, &r1);
            let backward = log.compute_divergence(&r1, &l2);
            assert_eq!(forward.snaps_only_on_source, backward.snaps_only_on_target);
            assert_eq!(forward.snaps_only_on_target, backward.snaps_only_on_source);
            assert_eq!(forward.common_ancestor, backward.common_ancestor);
        }

        #[test]
        fn locally_ahead_without_remote_head() {
            let (log, _, _, _) = linear_log();
            assert!(log.is_locally_ahead(None, None));
        }

        #[test]
        fn locally_ahead_when_remote_behind() {
            let (log, h1, _, h3) = linear_log();
            assert!(log.is_locally_ahead(None, Some(&h1)));
            assert!(!log.is_locally_ahead(None, Some(&h3)));
        }

        #[test]
        fn never_snapped_is_not_ahead() {
            let log = VersionLog::new();
            assert!(!log.is_locally_ahead(None, None));
        }
    }

    mod version_graph {
        use super::*;

        fn cid(s: &str) -> ComponentIdentity {
            ComponentIdentity::parse(s).unwrap()
        }

        #[test]
        fn ensure_node_creates_once() {
            let mut graph = VersionGraph::new();
            let id = cid("acme.ui/button");
            assert!(!graph.contains(&id));
            graph.ensure_node(&id);
            assert!(graph.contains(&id));
            assert_eq!(graph.len(), 1);
            graph.ensure_node(&id);
            assert_eq!(graph.len(), 1);
        }

        #[test]
        fn keyed_by_stripped_identity() {
            let mut graph = VersionGraph::new();
            graph.ensure_node(&cid("acme.ui/button@1.0.0"));
            // The versioned and unversioned forms address the same node
            assert!(graph.contains(&cid("acme.ui/button")));
            assert!(graph.contains(&cid("acme.ui/button@2.0.0")));
        }

        #[test]
        fn components_on_lane() {
            let mut graph = VersionGraph::new();
            let feature = lane("feature-x");

            let a = cid("acme.ui/a");
            graph.ensure_node(&a).snap_on(&feature, hash(1)).unwrap();
            let b = cid("acme.ui/b");
            graph
                .ensure_node(&b)
                .snap_on(&LaneName::default_lane(), hash(2))
                .unwrap();

            assert_eq!(graph.components_on_lane(&feature), vec!["acme.ui/a"]);
            assert_eq!(
                graph.components_on_lane(&LaneName::default_lane()),
                vec!["acme.ui/b"]
            );
        }

        #[test]
        fn lanes_lists_all() {
            let mut graph = VersionGraph::new();
            graph
                .ensure_node(&cid("acme.ui/a"))
                .snap_on(&lane("feature-x"), hash(1))
                .unwrap();
            graph
                .ensure_node(&cid("acme.ui/b"))
                .snap_on(&LaneName::default_lane(), hash(2))
                .unwrap();

            assert_eq!(graph.lanes(), vec![lane("feature-x"), lane("main")]);
        }

        #[test]
        fn remove_component_reports_active_lanes() {
            let mut graph = VersionGraph::new();
            let id = cid("acme.ui/a");
            let log = graph.ensure_node(&id);
            log.snap_on(&LaneName::default_lane(), hash(1)).unwrap();
            log.set_head(lane("feature-x"), hash(1)).unwrap();

            let detached = graph.remove_component(&id).unwrap();
            assert_eq!(detached.key, "acme.ui/a");
            assert_eq!(detached.active_lanes, vec![lane("feature-x")]);
            assert!(!graph.contains(&id));
        }

        #[test]
        fn remove_missing_component_fails() {
            let mut graph = VersionGraph::new();
            let err = graph.remove_component(&cid("acme.ui/ghost")).unwrap_err();
            assert!(matches!(err, GraphError::ComponentNotFound(_)));
        }
    }
}
