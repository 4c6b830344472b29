//! Tessera - component-level version control
//!
//! Tessera tracks individually versioned components inside a workspace:
//! each component has its own identity, history of content-addressed
//! snapshots ("snaps"), semver tags, and per-lane heads, and can be
//! compared, published, and removed independently of the rest of the
//! workspace.
//!
//! # Architecture
//!
//! The codebase is layered; semantics live in the library and the CLI
//! only formats:
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates)
//! - [`core`] - Identity, identity collections, version graph, config,
//!   workspace lock
//! - [`status`] - Working-copy status resolution against the graph
//! - [`deps`] - Reverse dependency indexing
//! - [`lane`] - Per-component content diffs between lanes
//! - [`remove`] - Local/remote component removal
//! - [`workspace`] - Working-copy, object-store, and tracking seams with
//!   filesystem and in-memory implementations
//! - [`remote`] - Registry client contracts and mock
//! - [`ui`] - Output utilities
//!
//! # Correctness Invariants
//!
//! 1. Version logs are append-only; removal detaches whole nodes
//! 2. Identity collections are unique under full equality
//! 3. Status facets are computed from graph + working copy, cached per
//!    session, and invalidated explicitly after mutation
//! 4. Batch operations return partial results, never all-or-nothing

pub mod cli;
pub mod core;
pub mod deps;
pub mod lane;
pub mod remote;
pub mod remove;
pub mod status;
pub mod ui;
pub mod workspace;
