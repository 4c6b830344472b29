//! remote::mock
//!
//! Mock registry for deterministic testing.
//!
//! # Design
//!
//! The mock registry stores per-scope component ids in memory and allows
//! configuring hub-hosted scopes, remote-side dependents, and failure
//! scenarios per scope. Thread-safe via internal `Arc<Mutex<...>>`
//! wrapping, so clones share state.
//!
//! # Example
//!
//! ```
//! use tessera::remote::mock::MockRegistry;
//! use tessera::remote::RegistryClient;
//! use tessera::core::types::Scope;
//!
//! # tokio_test::block_on(async {
//! let registry = MockRegistry::new();
//! let scope = Scope::new("acme.ui").unwrap();
//! registry.seed(&scope, ["acme.ui/button"]);
//!
//! let result = registry
//!     .delete_many(&scope, &["acme.ui/button".into(), "acme.ui/ghost".into()], false)
//!     .await
//!     .unwrap();
//! assert_eq!(result.removed, vec!["acme.ui/button"]);
//! assert_eq!(result.missing, vec!["acme.ui/ghost"]);
//! # });
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{CentralHubClient, RegistryClient, RegistryError, RemovedObjects};
use crate::core::types::Scope;

/// Mock registry covering both the per-scope and central-hub contracts.
#[derive(Debug, Clone, Default)]
pub struct MockRegistry {
    inner: Arc<Mutex<RegistryInner>>,
}

#[derive(Debug, Default)]
struct RegistryInner {
    /// Component ids hosted per scope.
    scopes: HashMap<Scope, HashSet<String>>,
    /// Scopes eligible for the central-hub fast path.
    hub_hosted: HashSet<Scope>,
    /// Remote-side dependents: component id to the ids depending on it.
    dependents: HashMap<String, Vec<String>>,
    /// Forced failure per scope.
    failures: HashMap<Scope, RegistryError>,
    /// delete_many invocations, in call order, with their scope.
    delete_calls: Vec<Scope>,
    /// delete_via_central_hub invocation count.
    hub_calls: usize,
}

impl MockRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Host component ids under a scope.
    pub fn seed<S: Into<String>>(&self, scope: &Scope, ids: impl IntoIterator<Item = S>) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .scopes
            .entry(scope.clone())
            .or_default()
            .extend(ids.into_iter().map(Into::into));
    }

    /// Mark a scope as hosted on the central hub.
    pub fn host_on_hub(&self, scope: &Scope) {
        self.inner.lock().unwrap().hub_hosted.insert(scope.clone());
    }

    /// Declare a remote-side dependent blocking non-forced removal.
    pub fn add_dependent(&self, id: impl Into<String>, dependent: impl Into<String>) {
        self.inner
            .lock()
            .unwrap()
            .dependents
            .entry(id.into())
            .or_default()
            .push(dependent.into());
    }

    /// Force all calls against a scope to fail with `error`.
    pub fn fail_scope(&self, scope: &Scope, error: RegistryError) {
        self.inner.lock().unwrap().failures.insert(scope.clone(), error);
    }

    /// Scopes hit by `delete_many`, in call order.
    pub fn delete_calls(&self) -> Vec<Scope> {
        self.inner.lock().unwrap().delete_calls.clone()
    }

    /// How many times the central hub was called.
    pub fn hub_calls(&self) -> usize {
        self.inner.lock().unwrap().hub_calls
    }

    fn delete_from_scope(
        inner: &mut RegistryInner,
        scope: &Scope,
        ids: &[String],
        force: bool,
    ) -> RemovedObjects {
        let mut result = RemovedObjects::default();
        let hosted = inner.scopes.entry(scope.clone()).or_default();
        for id in ids {
            if !hosted.contains(id) {
                result.missing.push(id.clone());
                continue;
            }
            match inner.dependents.get(id) {
                Some(deps) if !force && !deps.is_empty() => {
                    result.dependents.insert(id.clone(), deps.clone());
                }
                _ => {
                    hosted.remove(id);
                    result.removed.push(id.clone());
                }
            }
        }
        result
    }
}

#[async_trait]
impl RegistryClient for MockRegistry {
    async fn delete_many(
        &self,
        scope: &Scope,
        ids: &[String],
        force: bool,
    ) -> Result<RemovedObjects, RegistryError> {
        let mut inner = self.inner.lock().unwrap();
        inner.delete_calls.push(scope.clone());
        if let Some(error) = inner.failures.get(scope) {
            return Err(error.clone());
        }
        Ok(Self::delete_from_scope(&mut inner, scope, ids, force))
    }

    fn is_hub_hosted(&self, scope: &Scope) -> bool {
        self.inner.lock().unwrap().hub_hosted.contains(scope)
    }
}

#[async_trait]
impl CentralHubClient for MockRegistry {
    async fn delete_via_central_hub(
        &self,
        ids: &[String],
        force: bool,
        _ids_are_lanes: bool,
    ) -> Result<Vec<RemovedObjects>, RegistryError> {
        let mut inner = self.inner.lock().unwrap();
        inner.hub_calls += 1;

        // Group ids by the scope hosting them; unknown ids attribute to
        // a single catch-all result.
        let scopes: Vec<Scope> = inner.scopes.keys().cloned().collect();
        let mut results = Vec::new();
        let mut unknown = RemovedObjects::default();
        let mut remaining: Vec<String> = ids.to_vec();

        for scope in scopes {
            let hosted: Vec<String> = remaining
                .iter()
                .filter(|id| inner.scopes[&scope].contains(*id))
                .cloned()
                .collect();
            if hosted.is_empty() {
                continue;
            }
            remaining.retain(|id| !hosted.contains(id));
            results.push(Self::delete_from_scope(&mut inner, &scope, &hosted, force));
        }
        unknown.missing = remaining;
        if !unknown.is_empty() {
            results.push(unknown);
        }
        Ok(results)
    }
}
