//! core
//!
//! Core domain types and operations for Tessera.
//!
//! # Modules
//!
//! - [`types`] - Strong types: Scope, ComponentName, SnapHash,
//!   VersionTag, ComponentIdentity, LaneName
//! - [`id_set`] - Ordered, uniqueness-enforcing identity collections
//! - [`graph`] - Per-component version logs, lanes, tags, divergence
//! - [`config`] - Workspace configuration schema and loading
//! - [`lock`] - Exclusive workspace lock for mutating operations
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Identity strings parse and display losslessly
//! - Version history is append-only
pub mod config;
pub mod graph;
pub mod id_set;
pub mod lock;
pub mod types;
