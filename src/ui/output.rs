//! ui::output
//!
//! Output formatting and display.
//!
//! # Design
//!
//! Output is formatted consistently and respects the quiet flag.

use std::fmt::Display;

use crate::status::StatusRecord;

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Quiet mode - minimal output
    Quiet,
    /// Normal mode - standard output
    Normal,
    /// Debug mode - verbose output
    Debug,
}

impl Verbosity {
    /// Create verbosity from flags.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if debug {
            Verbosity::Debug
        } else {
            Verbosity::Normal
        }
    }
}

/// Print a message (respects quiet mode).
pub fn print(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", message);
    }
}

/// Print a debug message (only in debug mode).
pub fn debug(message: impl Display, verbosity: Verbosity) {
    if verbosity == Verbosity::Debug {
        eprintln!("[debug] {}", message);
    }
}

/// Print an error message (always shown).
pub fn error(message: impl Display) {
    eprintln!("error: {}", message);
}

/// Print a warning message (respects quiet mode).
pub fn warn(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        eprintln!("warning: {}", message);
    }
}

/// Format a list of items.
pub fn format_list<T: Display>(items: &[T], prefix: &str) -> String {
    items
        .iter()
        .map(|item| format!("{}{}", prefix, item))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format a status record as a comma-separated facet list.
pub fn format_status(record: &StatusRecord) -> String {
    let mut facets = Vec::new();
    if record.is_not_exist() {
        facets.push("not exist");
    }
    if record.is_deleted() {
        facets.push("deleted");
    }
    if record.is_newly_created() {
        facets.push("new");
    }
    if record.is_modified() {
        facets.push("modified");
    }
    if record.is_staged() {
        facets.push("staged");
    }
    if record.is_missing_from_scope() {
        facets.push("missing from scope");
    }
    if facets.is_empty() {
        return "ok".to_string();
    }
    facets.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_from_flags() {
        assert_eq!(Verbosity::from_flags(true, false), Verbosity::Quiet);
        assert_eq!(Verbosity::from_flags(false, true), Verbosity::Debug);
        assert_eq!(Verbosity::from_flags(false, false), Verbosity::Normal);
        // quiet wins over debug
        assert_eq!(Verbosity::from_flags(true, true), Verbosity::Quiet);
    }

    #[test]
    fn status_formatting() {
        assert_eq!(format_status(&StatusRecord::existing()), "ok");
        assert_eq!(
            format_status(&StatusRecord::existing().with_modified(true).with_staged(true)),
            "modified, staged"
        );
        assert_eq!(format_status(&StatusRecord::not_exist()), "not exist");
    }

    #[test]
    fn list_formatting() {
        let formatted = format_list(&["a", "b"], "  - ");
        assert_eq!(formatted, "  - a\n  - b");
    }
}
