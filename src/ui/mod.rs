//! ui
//!
//! User-facing output utilities.
//!
//! # Design
//!
//! All command output goes through this module so quiet/debug handling
//! and formatting stay consistent across commands.

pub mod output;
