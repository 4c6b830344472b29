//! workspace
//!
//! Collaborator interfaces for the local working area.
//!
//! # Design
//!
//! The engine never touches the working copy directly. It talks to three
//! seams, each a trait so tests can substitute deterministic in-memory
//! implementations:
//!
//! - [`WorkingCopyLoader`] - load a component's on-disk state
//! - [`ObjectStore`] - content-addressed snap storage, append-only
//! - [`TrackingStore`] - workspace tracking metadata and manifest references
//!
//! Loader and object store are async because they may suspend on
//! filesystem or network-backed I/O. The tracking store is local metadata
//! and stays synchronous.
//!
//! # Error classes
//!
//! [`LoadError`] distinguishes "expected absence" classes (missing files,
//! not tracked, not found in path) from `PendingImport` (objects not yet
//! fetched, recoverable by fetch-and-retry). The status resolver converts
//! the former into status facets instead of propagating them.

pub mod fs;
pub mod memory;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::id_set::IdentitySet;
use crate::core::types::{ComponentIdentity, SnapHash};

/// Errors from loading a component's working-copy state.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LoadError {
    /// The component's files are absent from the working copy.
    #[error("missing files for component: {0}")]
    MissingFiles(String),

    /// The component could not be located in the workspace path.
    #[error("component not found in path: {0}")]
    ComponentNotFoundInPath(String),

    /// The component is not in the workspace tracking map.
    #[error("component not in tracking map: {0}")]
    NotInTrackingMap(String),

    /// The referenced version's objects have not been fetched yet.
    /// Recoverable: fetch and retry.
    #[error("pending import for component: {0}")]
    PendingImport(String),

    /// Underlying I/O failure.
    #[error("io error loading {id}: {reason}")]
    Io { id: String, reason: String },
}

impl LoadError {
    /// True for the "expected absence" classes that classify a component
    /// as deleted or non-existent rather than failing the caller.
    pub fn is_absence(&self) -> bool {
        matches!(
            self,
            LoadError::MissingFiles(_)
                | LoadError::ComponentNotFoundInPath(_)
                | LoadError::NotInTrackingMap(_)
        )
    }
}

/// A component's state as found in the working copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingComponent {
    /// The identity as the working copy claims it, version included when
    /// the working copy is pinned to one.
    pub id: ComponentIdentity,
    /// Content hash over the current working-copy files.
    pub content_hash: SnapHash,
    /// File manifest: workspace-relative path to file content hash.
    pub files: BTreeMap<String, SnapHash>,
}

/// The outcome of a batch load: loadable components side by side with the
/// identities whose files turned out to be absent or untracked.
#[derive(Debug, Clone, Default)]
pub struct LoadResult {
    /// Successfully loaded components.
    pub components: Vec<WorkingComponent>,
    /// Identities whose load failed with an absence-class error.
    pub removed_components: IdentitySet,
}

/// Loads component state from the working copy.
#[async_trait]
pub trait WorkingCopyLoader: Send + Sync {
    /// Load a single component.
    ///
    /// # Errors
    ///
    /// Absence-class [`LoadError`]s mean the component's files are gone or
    /// untracked; `PendingImport` means its objects are not fetched yet.
    async fn load_one(&self, id: &ComponentIdentity) -> Result<WorkingComponent, LoadError>;

    /// Load many components, partitioning absence-class failures into
    /// `removed_components` instead of aborting the batch.
    ///
    /// # Errors
    ///
    /// Non-absence errors (`PendingImport`, I/O) propagate and abort the
    /// batch.
    async fn load(&self, ids: &IdentitySet) -> Result<LoadResult, LoadError> {
        let mut result = LoadResult::default();
        for id in ids.iter() {
            match self.load_one(id).await {
                Ok(component) => result.components.push(component),
                Err(e) if e.is_absence() => {
                    result.removed_components = result.removed_components.with(id.clone());
                }
                Err(e) => return Err(e),
            }
        }
        Ok(result)
    }
}

/// Errors from the object store.
#[derive(Debug, Error)]
pub enum ObjectStoreError {
    /// Underlying I/O failure.
    #[error("object store io error: {0}")]
    Io(String),

    /// The stored bytes do not hash to their address.
    #[error("object {0} failed content verification")]
    Corrupt(SnapHash),
}

/// Content-addressed object storage. Existing entries are never mutated.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch the bytes addressed by a hash, `None` if absent.
    async fn get_object(&self, hash: &SnapHash) -> Result<Option<Vec<u8>>, ObjectStoreError>;

    /// Store bytes under their content hash and return it. Idempotent.
    async fn put_object(&self, bytes: &[u8]) -> Result<SnapHash, ObjectStoreError>;
}

/// Errors from tracking-metadata operations.
#[derive(Debug, Error)]
pub enum TrackError {
    /// The component is not tracked.
    #[error("component not tracked: {0}")]
    NotTracked(String),

    /// Underlying I/O failure.
    #[error("tracking store io error: {0}")]
    Io(String),
}

/// Workspace tracking metadata: which components the workspace knows
/// about, their dependency-manifest references, and their files on disk.
pub trait TrackingStore: Send + Sync {
    /// True if the workspace tracks the component.
    fn is_tracked(&self, id: &ComponentIdentity) -> bool;

    /// All tracked identities, at the versions the workspace records.
    fn tracked(&self) -> IdentitySet;

    /// Drop the component from the tracking map.
    ///
    /// # Errors
    ///
    /// Returns `TrackError::NotTracked` if the component is not tracked.
    fn untrack(&self, id: &ComponentIdentity) -> Result<(), TrackError>;

    /// Remove dependency-manifest references to the component from all
    /// other tracked components.
    fn remove_manifest_references(&self, id: &ComponentIdentity) -> Result<(), TrackError>;

    /// Delete the component's working-copy files from disk.
    fn delete_files(&self, id: &ComponentIdentity) -> Result<(), TrackError>;

    /// Tracked components that declare a dependency on the component.
    fn dependents_of(&self, id: &ComponentIdentity) -> IdentitySet;
}
