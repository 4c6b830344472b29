//! workspace::fs
//!
//! Filesystem-backed workspace implementations.
//!
//! # Storage
//!
//! - `<root>/.tessera/state.json` - Tracking metadata (versioned schema)
//! - `<root>/.tessera/objects/<hh>/<hash>` - Content-addressed objects
//!
//! Component sources live under the workspace root at the relative path
//! recorded in the tracking entry. The loader hashes the files actually
//! on disk; the tracking entry only supplies the claimed identity and
//! directory.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{
    LoadError, ObjectStore, ObjectStoreError, TrackError, TrackingStore, WorkingComponent,
    WorkingCopyLoader,
};
use crate::core::graph::{manifest_hash, VersionGraph};
use crate::core::id_set::IdentitySet;
use crate::core::types::{ComponentIdentity, SnapHash};

/// Directory name for workspace metadata.
pub const TESSERA_DIR: &str = ".tessera";

/// Current tracking-state schema version.
pub const STATE_VERSION: u32 = 1;

/// A tracked component in the state file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedEntry {
    /// The identity the workspace records, version included once snapped.
    pub id: ComponentIdentity,
    /// Component directory, relative to the workspace root.
    pub path: String,
    /// Version-stripped ids of tracked components this one depends on.
    #[serde(default)]
    pub dependencies: Vec<String>,
}

/// Versioned tracking-state schema.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkspaceStateV1 {
    /// Schema version, bumped on incompatible changes.
    #[serde(default = "default_state_version")]
    pub version: u32,
    /// Tracked components keyed by version-stripped identity.
    #[serde(default)]
    pub tracked: BTreeMap<String, TrackedEntry>,
}

fn default_state_version() -> u32 {
    STATE_VERSION
}

/// Filesystem working copy and tracking metadata.
#[derive(Debug)]
pub struct FsWorkspace {
    root: PathBuf,
    state: Mutex<WorkspaceStateV1>,
}

impl FsWorkspace {
    /// Open a workspace rooted at `root`, loading `state.json` if present.
    ///
    /// # Errors
    ///
    /// Returns `TrackError::Io` if the state file exists but cannot be
    /// read or parsed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, TrackError> {
        let root = root.into();
        let state_path = root.join(TESSERA_DIR).join("state.json");
        let state = if state_path.exists() {
            let raw = fs::read_to_string(&state_path)
                .map_err(|e| TrackError::Io(format!("{}: {e}", state_path.display())))?;
            serde_json::from_str(&raw)
                .map_err(|e| TrackError::Io(format!("{}: {e}", state_path.display())))?
        } else {
            WorkspaceStateV1::default()
        };
        Ok(Self {
            root,
            state: Mutex::new(state),
        })
    }

    /// The workspace root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Record a component as tracked and persist the state file.
    pub fn track(&self, entry: TrackedEntry) -> Result<(), TrackError> {
        let mut state = self.state.lock().unwrap();
        state.tracked.insert(entry.id.stripped_string(), entry);
        self.persist(&state)
    }

    fn persist(&self, state: &WorkspaceStateV1) -> Result<(), TrackError> {
        let dir = self.root.join(TESSERA_DIR);
        fs::create_dir_all(&dir).map_err(|e| TrackError::Io(e.to_string()))?;
        let path = dir.join("state.json");
        let raw = serde_json::to_string_pretty(state).map_err(|e| TrackError::Io(e.to_string()))?;
        fs::write(&path, raw).map_err(|e| TrackError::Io(format!("{}: {e}", path.display())))
    }

    /// All tracked entries, sorted by graph key.
    pub fn entries(&self) -> Vec<TrackedEntry> {
        self.state.lock().unwrap().tracked.values().cloned().collect()
    }

    fn entry(&self, id: &ComponentIdentity) -> Option<TrackedEntry> {
        self.state
            .lock()
            .unwrap()
            .tracked
            .get(&id.stripped_string())
            .cloned()
    }

    /// Hash every regular file under `dir`, sorted by relative path.
    fn manifest_of(&self, dir: &Path, id: &str) -> Result<BTreeMap<String, SnapHash>, LoadError> {
        let mut files = BTreeMap::new();
        let mut stack = vec![dir.to_path_buf()];
        while let Some(current) = stack.pop() {
            let entries = fs::read_dir(&current).map_err(|e| LoadError::Io {
                id: id.to_string(),
                reason: format!("{}: {e}", current.display()),
            })?;
            for entry in entries {
                let entry = entry.map_err(|e| LoadError::Io {
                    id: id.to_string(),
                    reason: e.to_string(),
                })?;
                let path = entry.path();
                let name = entry.file_name();
                if name.to_string_lossy().starts_with('.') {
                    continue;
                }
                if path.is_dir() {
                    stack.push(path);
                } else {
                    let bytes = fs::read(&path).map_err(|e| LoadError::Io {
                        id: id.to_string(),
                        reason: format!("{}: {e}", path.display()),
                    })?;
                    let rel = path
                        .strip_prefix(dir)
                        .unwrap_or(&path)
                        .to_string_lossy()
                        .replace('\\', "/");
                    files.insert(rel, SnapHash::compute(&bytes));
                }
            }
        }
        Ok(files)
    }
}

#[async_trait]
impl WorkingCopyLoader for FsWorkspace {
    async fn load_one(&self, id: &ComponentIdentity) -> Result<WorkingComponent, LoadError> {
        let key = id.stripped_string();
        let entry = self
            .entry(id)
            .ok_or_else(|| LoadError::NotInTrackingMap(key.clone()))?;

        let dir = self.root.join(&entry.path);
        if !dir.exists() {
            return Err(LoadError::MissingFiles(key));
        }
        if !dir.is_dir() {
            return Err(LoadError::ComponentNotFoundInPath(key));
        }

        let files = self.manifest_of(&dir, &key)?;
        if files.is_empty() {
            return Err(LoadError::MissingFiles(key));
        }
        let content_hash = manifest_hash(&files);
        Ok(WorkingComponent {
            id: entry.id,
            content_hash,
            files,
        })
    }
}

impl TrackingStore for FsWorkspace {
    fn is_tracked(&self, id: &ComponentIdentity) -> bool {
        self.state
            .lock()
            .unwrap()
            .tracked
            .contains_key(&id.stripped_string())
    }

    fn tracked(&self) -> IdentitySet {
        self.state
            .lock()
            .unwrap()
            .tracked
            .values()
            .map(|entry| entry.id.clone())
            .collect()
    }

    fn untrack(&self, id: &ComponentIdentity) -> Result<(), TrackError> {
        let mut state = self.state.lock().unwrap();
        let key = id.stripped_string();
        if state.tracked.remove(&key).is_none() {
            return Err(TrackError::NotTracked(key));
        }
        self.persist(&state)
    }

    fn remove_manifest_references(&self, id: &ComponentIdentity) -> Result<(), TrackError> {
        let mut state = self.state.lock().unwrap();
        let key = id.stripped_string();
        for entry in state.tracked.values_mut() {
            entry.dependencies.retain(|dep| *dep != key);
        }
        self.persist(&state)
    }

    fn delete_files(&self, id: &ComponentIdentity) -> Result<(), TrackError> {
        let Some(entry) = self.entry(id) else {
            return Err(TrackError::NotTracked(id.stripped_string()));
        };
        let dir = self.root.join(&entry.path);
        if dir.exists() {
            fs::remove_dir_all(&dir)
                .map_err(|e| TrackError::Io(format!("{}: {e}", dir.display())))?;
        }
        Ok(())
    }

    fn dependents_of(&self, id: &ComponentIdentity) -> IdentitySet {
        let key = id.stripped_string();
        self.state
            .lock()
            .unwrap()
            .tracked
            .values()
            .filter(|entry| entry.dependencies.iter().any(|dep| *dep == key))
            .map(|entry| entry.id.clone())
            .collect()
    }
}

/// Load the persisted version graph from `.tessera/graph.json`, empty
/// if the file does not exist.
///
/// # Errors
///
/// Returns `TrackError::Io` if the file exists but cannot be read or
/// parsed.
pub fn load_graph(root: &Path) -> Result<VersionGraph, TrackError> {
    let path = root.join(TESSERA_DIR).join("graph.json");
    if !path.exists() {
        return Ok(VersionGraph::new());
    }
    let raw = fs::read_to_string(&path)
        .map_err(|e| TrackError::Io(format!("{}: {e}", path.display())))?;
    serde_json::from_str(&raw).map_err(|e| TrackError::Io(format!("{}: {e}", path.display())))
}

/// Persist the version graph to `.tessera/graph.json`.
///
/// # Errors
///
/// Returns `TrackError::Io` on serialization or write failure.
pub fn save_graph(root: &Path, graph: &VersionGraph) -> Result<(), TrackError> {
    let dir = root.join(TESSERA_DIR);
    fs::create_dir_all(&dir).map_err(|e| TrackError::Io(e.to_string()))?;
    let path = dir.join("graph.json");
    let raw = serde_json::to_string_pretty(graph).map_err(|e| TrackError::Io(e.to_string()))?;
    fs::write(&path, raw).map_err(|e| TrackError::Io(format!("{}: {e}", path.display())))
}

/// Content-addressed object directory under `.tessera/objects`.
///
/// Objects are sharded by the first two hash characters, written once,
/// and never mutated.
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    dir: PathBuf,
}

impl FsObjectStore {
    /// Open (creating if needed is deferred to the first put) the object
    /// directory for a workspace root.
    pub fn open(root: impl AsRef<Path>) -> Self {
        Self {
            dir: root.as_ref().join(TESSERA_DIR).join("objects"),
        }
    }

    fn shard_dir(&self, hash: &SnapHash) -> PathBuf {
        self.dir.join(hash.short(2))
    }

    fn path_for(&self, hash: &SnapHash) -> PathBuf {
        self.shard_dir(hash).join(hash.as_str())
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn get_object(&self, hash: &SnapHash) -> Result<Option<Vec<u8>>, ObjectStoreError> {
        let path = self.path_for(hash);
        match fs::read(&path) {
            Ok(bytes) => {
                if SnapHash::compute(&bytes) != *hash {
                    return Err(ObjectStoreError::Corrupt(hash.clone()));
                }
                Ok(Some(bytes))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ObjectStoreError::Io(format!("{}: {e}", path.display()))),
        }
    }

    async fn put_object(&self, bytes: &[u8]) -> Result<SnapHash, ObjectStoreError> {
        let hash = SnapHash::compute(bytes);
        let path = self.path_for(&hash);
        if path.exists() {
            return Ok(hash);
        }
        fs::create_dir_all(self.shard_dir(&hash))
            .map_err(|e| ObjectStoreError::Io(e.to_string()))?;
        fs::write(&path, bytes)
            .map_err(|e| ObjectStoreError::Io(format!("{}: {e}", path.display())))?;
        Ok(hash)
    }
}
