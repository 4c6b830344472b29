//! workspace::memory
//!
//! In-memory workspace implementations for deterministic testing.
//!
//! # Design
//!
//! [`MemoryWorkspace`] implements both [`WorkingCopyLoader`] and
//! [`TrackingStore`] over shared in-memory state, and counts loader
//! invocations so tests can verify cache behavior. [`MemoryObjectStore`]
//! is a content-addressed map.
//!
//! Thread-safe via internal `Arc<Mutex<...>>` wrapping, so clones share
//! state with the instance handed to the engine.
//!
//! # Example
//!
//! ```
//! use tessera::workspace::memory::MemoryWorkspace;
//! use tessera::workspace::{LoadError, WorkingCopyLoader};
//! use tessera::core::types::{ComponentIdentity, SnapHash};
//!
//! # tokio_test::block_on(async {
//! let ws = MemoryWorkspace::new();
//! let id = ComponentIdentity::parse("acme.ui/button@1.0.0").unwrap();
//! ws.insert_component(id.clone(), SnapHash::compute(b"src"), []);
//!
//! let loaded = ws.load_one(&id).await.unwrap();
//! assert_eq!(loaded.content_hash, SnapHash::compute(b"src"));
//! assert_eq!(ws.load_calls(), 1);
//! # });
//! ```

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{
    LoadError, ObjectStore, ObjectStoreError, TrackError, TrackingStore, WorkingComponent,
    WorkingCopyLoader,
};
use crate::core::id_set::IdentitySet;
use crate::core::types::{ComponentIdentity, SnapHash};

/// In-memory working copy plus tracking metadata.
#[derive(Debug, Clone, Default)]
pub struct MemoryWorkspace {
    inner: Arc<Mutex<WorkspaceInner>>,
}

#[derive(Debug, Default)]
struct WorkspaceInner {
    /// Working components keyed by stripped identity.
    components: HashMap<String, WorkingComponent>,
    /// Forced load failures keyed by stripped identity.
    failures: HashMap<String, LoadError>,
    /// Tracked identities keyed by stripped identity.
    tracked: HashMap<String, ComponentIdentity>,
    /// Dependency declarations: stripped identity of the dependency to
    /// the identities that declare it.
    dependents: HashMap<String, Vec<ComponentIdentity>>,
    /// Identities whose files were deleted via the tracking store.
    deleted_files: Vec<ComponentIdentity>,
    /// Identities whose manifest references were cleaned.
    cleaned_manifests: Vec<ComponentIdentity>,
    /// Loader invocation count.
    load_calls: usize,
}

impl MemoryWorkspace {
    /// Create an empty workspace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a working component with a content hash and file manifest,
    /// and mark it tracked.
    pub fn insert_component(
        &self,
        id: ComponentIdentity,
        content_hash: SnapHash,
        files: impl IntoIterator<Item = (String, SnapHash)>,
    ) {
        let mut inner = self.inner.lock().unwrap();
        let key = id.stripped_string();
        inner.tracked.insert(key.clone(), id.clone());
        inner.components.insert(
            key,
            WorkingComponent {
                id,
                content_hash,
                files: files.into_iter().collect::<BTreeMap<_, _>>(),
            },
        );
    }

    /// Mark an identity tracked without any working files.
    pub fn track_only(&self, id: ComponentIdentity) {
        let mut inner = self.inner.lock().unwrap();
        inner.tracked.insert(id.stripped_string(), id);
    }

    /// Force the next loads of `id` to fail with `error`.
    pub fn fail_with(&self, id: &ComponentIdentity, error: LoadError) {
        let mut inner = self.inner.lock().unwrap();
        inner.failures.insert(id.stripped_string(), error);
    }

    /// Declare that `dependent` depends on `dependency`.
    pub fn add_dependent(&self, dependency: &ComponentIdentity, dependent: ComponentIdentity) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .dependents
            .entry(dependency.stripped_string())
            .or_default()
            .push(dependent);
    }

    /// How many times the loader was invoked.
    pub fn load_calls(&self) -> usize {
        self.inner.lock().unwrap().load_calls
    }

    /// Identities whose files were deleted through the tracking store.
    pub fn deleted_files(&self) -> Vec<ComponentIdentity> {
        self.inner.lock().unwrap().deleted_files.clone()
    }

    /// Identities whose manifest references were cleaned.
    pub fn cleaned_manifests(&self) -> Vec<ComponentIdentity> {
        self.inner.lock().unwrap().cleaned_manifests.clone()
    }
}

#[async_trait]
impl WorkingCopyLoader for MemoryWorkspace {
    async fn load_one(&self, id: &ComponentIdentity) -> Result<WorkingComponent, LoadError> {
        let mut inner = self.inner.lock().unwrap();
        inner.load_calls += 1;
        let key = id.stripped_string();
        if let Some(error) = inner.failures.get(&key) {
            return Err(error.clone());
        }
        if !inner.tracked.contains_key(&key) {
            return Err(LoadError::NotInTrackingMap(key));
        }
        inner
            .components
            .get(&key)
            .cloned()
            .ok_or(LoadError::MissingFiles(key))
    }
}

impl TrackingStore for MemoryWorkspace {
    fn is_tracked(&self, id: &ComponentIdentity) -> bool {
        self.inner
            .lock()
            .unwrap()
            .tracked
            .contains_key(&id.stripped_string())
    }

    fn tracked(&self) -> IdentitySet {
        self.inner
            .lock()
            .unwrap()
            .tracked
            .values()
            .cloned()
            .collect()
    }

    fn untrack(&self, id: &ComponentIdentity) -> Result<(), TrackError> {
        let mut inner = self.inner.lock().unwrap();
        let key = id.stripped_string();
        if inner.tracked.remove(&key).is_none() {
            return Err(TrackError::NotTracked(key));
        }
        inner.components.remove(&key);
        Ok(())
    }

    fn remove_manifest_references(&self, id: &ComponentIdentity) -> Result<(), TrackError> {
        let mut inner = self.inner.lock().unwrap();
        inner.cleaned_manifests.push(id.clone());
        Ok(())
    }

    fn delete_files(&self, id: &ComponentIdentity) -> Result<(), TrackError> {
        let mut inner = self.inner.lock().unwrap();
        let key = id.stripped_string();
        inner.components.remove(&key);
        inner.deleted_files.push(id.clone());
        Ok(())
    }

    fn dependents_of(&self, id: &ComponentIdentity) -> IdentitySet {
        self.inner
            .lock()
            .unwrap()
            .dependents
            .get(&id.stripped_string())
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .collect()
    }
}

/// In-memory content-addressed object store.
#[derive(Debug, Clone, Default)]
pub struct MemoryObjectStore {
    objects: Arc<Mutex<HashMap<SnapHash, Vec<u8>>>>,
}

impl MemoryObjectStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    /// True if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.objects.lock().unwrap().is_empty()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn get_object(&self, hash: &SnapHash) -> Result<Option<Vec<u8>>, ObjectStoreError> {
        Ok(self.objects.lock().unwrap().get(hash).cloned())
    }

    async fn put_object(&self, bytes: &[u8]) -> Result<SnapHash, ObjectStoreError> {
        let hash = SnapHash::compute(bytes);
        self.objects
            .lock()
            .unwrap()
            .entry(hash.clone())
            .or_insert_with(|| bytes.to_vec());
        Ok(hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cid(s: &str) -> ComponentIdentity {
        ComponentIdentity::parse(s).unwrap()
    }

    #[tokio::test]
    async fn load_counts_invocations() {
        let ws = MemoryWorkspace::new();
        let id = cid("acme.ui/a@1.0.0");
        ws.insert_component(id.clone(), SnapHash::compute(b"a"), []);

        ws.load_one(&id).await.unwrap();
        ws.load_one(&id).await.unwrap();
        assert_eq!(ws.load_calls(), 2);
    }

    #[tokio::test]
    async fn untracked_component_fails_with_absence_class() {
        let ws = MemoryWorkspace::new();
        let err = ws.load_one(&cid("acme.ui/ghost")).await.unwrap_err();
        assert!(err.is_absence());
    }

    #[tokio::test]
    async fn tracked_without_files_is_missing() {
        let ws = MemoryWorkspace::new();
        let id = cid("acme.ui/a");
        ws.track_only(id.clone());
        let err = ws.load_one(&id).await.unwrap_err();
        assert!(matches!(err, LoadError::MissingFiles(_)));
    }

    #[tokio::test]
    async fn forced_failure_wins() {
        let ws = MemoryWorkspace::new();
        let id = cid("acme.ui/a");
        ws.insert_component(id.clone(), SnapHash::compute(b"a"), []);
        ws.fail_with(&id, LoadError::PendingImport(id.to_string()));
        let err = ws.load_one(&id).await.unwrap_err();
        assert!(matches!(err, LoadError::PendingImport(_)));
        assert!(!err.is_absence());
    }

    #[tokio::test]
    async fn batch_load_partitions_absences() {
        let ws = MemoryWorkspace::new();
        let present = cid("acme.ui/a@1.0.0");
        let absent = cid("acme.ui/gone");
        ws.insert_component(present.clone(), SnapHash::compute(b"a"), []);

        let ids: IdentitySet = [present, absent.clone()].into_iter().collect();
        let result = ws.load(&ids).await.unwrap();
        assert_eq!(result.components.len(), 1);
        assert!(result.removed_components.contains(&absent));
    }

    #[tokio::test]
    async fn object_store_is_content_addressed() {
        let store = MemoryObjectStore::new();
        let hash = store.put_object(b"payload").await.unwrap();
        assert_eq!(hash, SnapHash::compute(b"payload"));
        assert_eq!(
            store.get_object(&hash).await.unwrap(),
            Some(b"payload".to_vec())
        );
        // Idempotent re-put never mutates
        store.put_object(b"payload").await.unwrap();
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn object_store_miss_is_none() {
        let store = MemoryObjectStore::new();
        let miss = store.get_object(&SnapHash::compute(b"nope")).await.unwrap();
        assert!(miss.is_none());
    }
}
