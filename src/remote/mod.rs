//! remote
//!
//! Logical contract for remote scope registries.
//!
//! # Design
//!
//! The traits are async because registry operations involve network I/O.
//! Only the logical contract is specified here: transport details belong
//! to implementations. Removal talks to registries two ways:
//!
//! - [`RegistryClient::delete_many`] - one batched delete per scope
//! - [`CentralHubClient::delete_via_central_hub`] - a single batched call
//!   when every affected scope is hosted on the central hub
//!
//! Remote calls may fail without compromising local correctness; the
//! removal engine attributes each per-scope result separately and never
//! collapses partial success into a single failure.

pub mod mock;

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::types::Scope;

/// Errors from registry operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// Authentication failed (invalid token, insufficient permissions).
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The scope does not exist on the remote.
    #[error("scope not found: {0}")]
    ScopeNotFound(String),

    /// The registry returned an error.
    #[error("registry error: {status} - {message}")]
    ApiError {
        /// Status code from the registry
        status: u16,
        /// Error message from the registry
        message: String,
    },

    /// Network or connection error.
    #[error("network error: {0}")]
    NetworkError(String),

    /// The operation is not supported by this registry.
    #[error("not supported: {0}")]
    NotSupported(String),
}

/// The result of a remote delete call, attributed to one scope (or to
/// the central hub for batched calls).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovedObjects {
    /// Id strings the remote actually removed.
    pub removed: Vec<String>,
    /// Id strings the remote did not know.
    pub missing: Vec<String>,
    /// Id strings refused because components still depend on them,
    /// mapped to the dependents that block them.
    pub dependents: HashMap<String, Vec<String>>,
}

impl RemovedObjects {
    /// True if nothing was removed, missing, or blocked.
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.missing.is_empty() && self.dependents.is_empty()
    }
}

/// Per-scope registry operations.
#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// Delete components from one scope in a single batched call.
    ///
    /// With `force`, the remote removes components even when other
    /// components depend on them; otherwise blocked ids come back in
    /// [`RemovedObjects::dependents`].
    async fn delete_many(
        &self,
        scope: &Scope,
        ids: &[String],
        force: bool,
    ) -> Result<RemovedObjects, RegistryError>;

    /// True if the scope is hosted on the central hub and eligible for
    /// the batched fast path.
    fn is_hub_hosted(&self, scope: &Scope) -> bool;
}

/// Central-hub batched operations across scopes.
#[async_trait]
pub trait CentralHubClient: Send + Sync {
    /// Delete many components (or lanes, when `ids_are_lanes`) in one
    /// call, returning one result per affected scope.
    async fn delete_via_central_hub(
        &self,
        ids: &[String],
        force: bool,
        ids_are_lanes: bool,
    ) -> Result<Vec<RemovedObjects>, RegistryError>;
}
