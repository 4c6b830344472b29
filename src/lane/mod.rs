//! lane
//!
//! Lane comparison: per-component content diffs between two lanes.
//!
//! # Resolution
//!
//! Zero, one, or two lane identifiers resolve as:
//!
//! - none: current lane vs. the default lane (requires a workspace
//!   context; fails with [`LaneError::AmbiguousLaneDiff`] outside one)
//! - one: current (or default) lane vs. the named lane
//! - two: named "from" lane vs. named "to" lane
//!
//! # Partial results
//!
//! The comparison never aborts wholesale: components whose diff cannot
//! be computed (missing snap object, undecodable payload) land in
//! `failures` with their identity and reason, side by side with the
//! successful diffs.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::graph::{Snap, VersionGraph};
use crate::core::types::{LaneName, SnapHash};
use crate::workspace::ObjectStore;

/// Errors from lane-diff resolution.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LaneError {
    /// No lanes were named and there is no workspace context to supply
    /// the current lane.
    #[error("cannot infer lanes to diff outside a workspace")]
    AmbiguousLaneDiff,

    /// A named lane has no history in the graph.
    #[error("unknown lane: {0}")]
    UnknownLane(LaneName),
}

/// How a file changed between the two lane heads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileChange {
    /// Present on "to" only.
    Added,
    /// Present on "from" only.
    Removed,
    /// Present on both with differing content.
    Modified,
}

impl std::fmt::Display for FileChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileChange::Added => write!(f, "added"),
            FileChange::Removed => write!(f, "removed"),
            FileChange::Modified => write!(f, "modified"),
        }
    }
}

/// One file-level difference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDiff {
    /// Workspace-relative path.
    pub path: String,
    /// Direction of the change, read from "from" to "to".
    pub change: FileChange,
}

/// A component present on both lanes with differing content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompDiff {
    /// Version-stripped component key.
    pub component: String,
    /// Head on the "from" lane.
    pub from_head: SnapHash,
    /// Head on the "to" lane.
    pub to_head: SnapHash,
    /// File-level changes, sorted by path.
    pub files: Vec<FileDiff>,
}

/// A component whose diff could not be computed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffFailure {
    /// Version-stripped component key.
    pub component: String,
    /// Why the diff failed.
    pub reason: String,
}

/// The outcome of comparing two lanes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaneDiffResult {
    /// Components on both lanes whose content differs.
    pub comps_with_diff: Vec<CompDiff>,
    /// Components present only on the "from" lane.
    pub new_comps_from: Vec<String>,
    /// Components present only on the "to" lane.
    pub new_comps_to: Vec<String>,
    /// The resolved "from" lane.
    pub from_lane_name: LaneName,
    /// The resolved "to" lane.
    pub to_lane_name: LaneName,
    /// Components whose diff computation failed, with reasons.
    pub failures: Vec<DiffFailure>,
}

impl LaneDiffResult {
    /// True if the lanes are identical under the applied filter.
    pub fn is_empty(&self) -> bool {
        self.comps_with_diff.is_empty()
            && self.new_comps_from.is_empty()
            && self.new_comps_to.is_empty()
            && self.failures.is_empty()
    }
}

/// Match a component key against a `*`-wildcard pattern.
fn matches_pattern(key: &str, pattern: &str) -> bool {
    if !pattern.contains('*') {
        return key == pattern;
    }
    let parts: Vec<&str> = pattern.split('*').collect();
    let mut rest = key;
    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() {
            continue;
        }
        if i == 0 {
            match rest.strip_prefix(part) {
                Some(stripped) => rest = stripped,
                None => return false,
            }
        } else if i == parts.len() - 1 {
            return rest.ends_with(part);
        } else {
            match rest.find(part) {
                Some(pos) => rest = &rest[pos + part.len()..],
                None => return false,
            }
        }
    }
    // Pattern ends with '*' (or was entirely wildcards)
    true
}

/// Compares lanes using snap objects from the object store.
pub struct LaneDiffGenerator {
    store: Arc<dyn ObjectStore>,
}

impl LaneDiffGenerator {
    /// Create a generator over an object store.
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Resolve lane arguments per the zero/one/two rule.
    ///
    /// # Errors
    ///
    /// `LaneError::AmbiguousLaneDiff` when no lanes are named and no
    /// workspace context supplies a current lane.
    pub fn resolve_lanes(
        current_lane: Option<&LaneName>,
        from: Option<LaneName>,
        to: Option<LaneName>,
    ) -> Result<(LaneName, LaneName), LaneError> {
        match (from, to) {
            (Some(from), Some(to)) => Ok((from, to)),
            (Some(named), None) | (None, Some(named)) => {
                let base = current_lane
                    .cloned()
                    .unwrap_or_else(LaneName::default_lane);
                Ok((base, named))
            }
            (None, None) => {
                let current = current_lane.ok_or(LaneError::AmbiguousLaneDiff)?;
                Ok((current.clone(), LaneName::default_lane()))
            }
        }
    }

    /// Compare two lanes, optionally filtering components by a
    /// `*`-wildcard name pattern.
    ///
    /// # Errors
    ///
    /// Lane-resolution errors only; per-component diff errors are
    /// collected into the result's `failures`.
    pub async fn generate(
        &self,
        graph: &VersionGraph,
        current_lane: Option<&LaneName>,
        from: Option<LaneName>,
        to: Option<LaneName>,
        pattern: Option<&str>,
    ) -> Result<LaneDiffResult, LaneError> {
        let (from_lane, to_lane) = Self::resolve_lanes(current_lane, from, to)?;

        for lane in [&from_lane, &to_lane] {
            if !lane.is_default() && !graph.lanes().contains(lane) {
                return Err(LaneError::UnknownLane(lane.clone()));
            }
        }

        let keep = |key: &String| pattern.map_or(true, |p| matches_pattern(key, p));
        let on_from: Vec<String> = graph
            .components_on_lane(&from_lane)
            .into_iter()
            .filter(keep)
            .collect();
        let on_to: Vec<String> = graph
            .components_on_lane(&to_lane)
            .into_iter()
            .filter(keep)
            .collect();

        let mut result = LaneDiffResult {
            comps_with_diff: Vec::new(),
            new_comps_from: on_from
                .iter()
                .filter(|key| !on_to.contains(key))
                .cloned()
                .collect(),
            new_comps_to: on_to
                .iter()
                .filter(|key| !on_from.contains(key))
                .cloned()
                .collect(),
            from_lane_name: from_lane.clone(),
            to_lane_name: to_lane.clone(),
            failures: Vec::new(),
        };

        for key in on_from.iter().filter(|key| on_to.contains(key)) {
            let Some(log) = graph.node_by_key(key) else {
                continue;
            };
            let (Some(from_head), Some(to_head)) = (log.head(&from_lane), log.head(&to_lane))
            else {
                continue;
            };
            if from_head == to_head {
                continue;
            }
            match self.diff_heads(from_head, to_head).await {
                Ok(files) => result.comps_with_diff.push(CompDiff {
                    component: key.clone(),
                    from_head: from_head.clone(),
                    to_head: to_head.clone(),
                    files,
                }),
                Err(reason) => result.failures.push(DiffFailure {
                    component: key.clone(),
                    reason,
                }),
            }
        }

        Ok(result)
    }

    async fn load_snap(&self, head: &SnapHash) -> Result<Snap, String> {
        let bytes = self
            .store
            .get_object(head)
            .await
            .map_err(|e| e.to_string())?
            .ok_or_else(|| format!("snap object missing: {head}"))?;
        Snap::from_bytes(&bytes).map_err(|e| format!("corrupt snap object {head}: {e}"))
    }

    /// Structural, file-level diff between two snap manifests.
    async fn diff_heads(&self, from: &SnapHash, to: &SnapHash) -> Result<Vec<FileDiff>, String> {
        let from_snap = self.load_snap(from).await?;
        let to_snap = self.load_snap(to).await?;

        let mut files = Vec::new();
        for (path, from_hash) in &from_snap.files {
            match to_snap.files.get(path) {
                None => files.push(FileDiff {
                    path: path.clone(),
                    change: FileChange::Removed,
                }),
                Some(to_hash) if to_hash != from_hash => files.push(FileDiff {
                    path: path.clone(),
                    change: FileChange::Modified,
                }),
                Some(_) => {}
            }
        }
        for path in to_snap.files.keys() {
            if !from_snap.files.contains_key(path) {
                files.push(FileDiff {
                    path: path.clone(),
                    change: FileChange::Added,
                });
            }
        }
        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }
}
