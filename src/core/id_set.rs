//! core::id_set
//!
//! Ordered, uniqueness-enforcing collection of component identities.
//!
//! # Design
//!
//! An [`IdentitySet`] is an owned, order-preserving sequence plus a
//! uniqueness index keyed by the full-equality string form. Uniqueness is
//! enforced under *full* equality only: the same component at two versions
//! is two distinct members, which is meaningful (and detectable via
//! [`IdentitySet::find_duplicates_ignoring_version`]).
//!
//! All transformations are mutation-free and return new collections.
//!
//! # Example
//!
//! ```
//! use tessera::core::id_set::IdentitySet;
//! use tessera::core::types::ComponentIdentity;
//!
//! let set: IdentitySet = ["acme.ui/button@1.0.0", "acme.ui/card@1.0.0"]
//!     .iter()
//!     .map(|s| ComponentIdentity::parse(s).unwrap())
//!     .collect();
//!
//! assert_eq!(set.len(), 2);
//! assert!(set.difference(&set).is_empty());
//! ```

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::types::{ComponentIdentity, Scope};

/// Errors from identity-set operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdSetError {
    /// A member has no scope and none could be resolved via the fallback set.
    #[error("no resolvable scope for identity: {0}")]
    MissingScope(String),

    /// Two members collide under version-ignoring equality where
    /// uniqueness was required.
    #[error("ambiguous identity, multiple versions present: {0}")]
    AmbiguousIdentity(String),
}

/// An ordered collection of [`ComponentIdentity`] values, unique under
/// full equality.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<ComponentIdentity>", into = "Vec<ComponentIdentity>")]
pub struct IdentitySet {
    items: Vec<ComponentIdentity>,
    index: HashSet<String>,
}

impl IdentitySet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from identities, dropping full-equality duplicates
    /// while preserving first-seen order.
    pub fn from_identities(ids: impl IntoIterator<Item = ComponentIdentity>) -> Self {
        let mut set = Self::new();
        for id in ids {
            set.push(id);
        }
        set
    }

    fn push(&mut self, id: ComponentIdentity) {
        let key = id.to_string();
        if self.index.insert(key) {
            self.items.push(id);
        }
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True if the set has no members.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate members in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &ComponentIdentity> {
        self.items.iter()
    }

    /// Membership under full equality.
    pub fn contains(&self, id: &ComponentIdentity) -> bool {
        self.index.contains(&id.to_string())
    }

    /// A new set with `id` appended (no-op if already present under
    /// full equality).
    pub fn with(&self, id: ComponentIdentity) -> Self {
        let mut next = self.clone();
        next.push(id);
        next
    }

    /// Union by repeated add, preserving this set's order first.
    pub fn union(&self, other: &Self) -> Self {
        let mut next = self.clone();
        for id in other.iter() {
            next.push(id.clone());
        }
        next
    }

    /// Members of `self` not present in `other` (full equality).
    pub fn difference(&self, other: &Self) -> Self {
        Self::from_identities(
            self.items
                .iter()
                .filter(|id| !other.contains(id))
                .cloned(),
        )
    }

    /// Members of `self` also present in `other` (full equality).
    pub fn intersection(&self, other: &Self) -> Self {
        Self::from_identities(self.items.iter().filter(|id| other.contains(id)).cloned())
    }

    /// First member equal to `id` ignoring version.
    pub fn search_without_version(&self, id: &ComponentIdentity) -> Option<&ComponentIdentity> {
        self.items.iter().find(|m| m.eq_without_version(id))
    }

    /// First member equal to `id` ignoring scope.
    pub fn search_without_scope(&self, id: &ComponentIdentity) -> Option<&ComponentIdentity> {
        self.items.iter().find(|m| m.eq_without_scope(id))
    }

    /// First member equal to `id` ignoring scope and version.
    pub fn search_without_scope_and_version(
        &self,
        id: &ComponentIdentity,
    ) -> Option<&ComponentIdentity> {
        self.items
            .iter()
            .find(|m| m.eq_without_scope_and_version(id))
    }

    /// All members equal to `id` ignoring version.
    pub fn filter_without_version(&self, id: &ComponentIdentity) -> Self {
        Self::from_identities(
            self.items
                .iter()
                .filter(|m| m.eq_without_version(id))
                .cloned(),
        )
    }

    /// All members equal to `id` ignoring scope.
    pub fn filter_without_scope(&self, id: &ComponentIdentity) -> Self {
        Self::from_identities(
            self.items
                .iter()
                .filter(|m| m.eq_without_scope(id))
                .cloned(),
        )
    }

    /// All members belonging to `scope`.
    pub fn filter_by_scope(&self, scope: &Scope) -> Self {
        Self::from_identities(
            self.items
                .iter()
                .filter(|m| m.scope.as_ref() == Some(scope))
                .cloned(),
        )
    }

    /// All members matching a predicate.
    pub fn filter(&self, pred: impl Fn(&ComponentIdentity) -> bool) -> Self {
        Self::from_identities(self.items.iter().filter(|m| pred(m)).cloned())
    }

    /// Group members by their version-stripped string form.
    pub fn group_by_without_version(&self) -> HashMap<String, IdentitySet> {
        let mut groups: HashMap<String, IdentitySet> = HashMap::new();
        for id in &self.items {
            groups
                .entry(id.stripped_string())
                .or_default()
                .push(id.clone());
        }
        groups
    }

    /// Group members by scope.
    ///
    /// A member without a scope is resolved through `fallback`, if given:
    /// the first fallback member with the same name (ignoring scope and
    /// version) supplies its scope.
    ///
    /// # Errors
    ///
    /// Returns `IdSetError::MissingScope` if any member has no scope and
    /// none is resolvable via the fallback set.
    pub fn group_by_scope(
        &self,
        fallback: Option<&IdentitySet>,
    ) -> Result<HashMap<Scope, IdentitySet>, IdSetError> {
        let mut groups: HashMap<Scope, IdentitySet> = HashMap::new();
        for id in &self.items {
            let scope = match &id.scope {
                Some(scope) => scope.clone(),
                None => fallback
                    .and_then(|f| f.search_without_scope_and_version(id))
                    .and_then(|f| f.scope.clone())
                    .ok_or_else(|| IdSetError::MissingScope(id.to_string()))?,
            };
            groups.entry(scope).or_default().push(id.clone());
        }
        Ok(groups)
    }

    /// A copy of this set; duplicates under full equality are already
    /// impossible by construction, so this is the identity transform kept
    /// for symmetry with the looser-equality filters.
    pub fn unique(&self) -> Self {
        self.clone()
    }

    /// Find members that collide when the version is ignored.
    ///
    /// Returns only colliding groups: stripped string form mapped to the
    /// two-or-more full identities that share it.
    pub fn find_duplicates_ignoring_version(&self) -> HashMap<String, Vec<ComponentIdentity>> {
        let mut groups: HashMap<String, Vec<ComponentIdentity>> = HashMap::new();
        for id in &self.items {
            groups.entry(id.stripped_string()).or_default().push(id.clone());
        }
        groups.retain(|_, ids| ids.len() > 1);
        groups
    }

    /// Fail if any member is ambiguous under version-ignoring equality.
    ///
    /// # Errors
    ///
    /// Returns `IdSetError::AmbiguousIdentity` naming the first colliding
    /// component and the versions involved.
    pub fn throw_for_duplication(&self) -> Result<(), IdSetError> {
        let dups = self.find_duplicates_ignoring_version();
        if let Some((stripped, ids)) = dups.into_iter().next() {
            let versions: Vec<String> = ids
                .iter()
                .map(|id| {
                    id.version
                        .as_ref()
                        .map(|v| v.to_string())
                        .unwrap_or_else(|| "latest".to_string())
                })
                .collect();
            return Err(IdSetError::AmbiguousIdentity(format!(
                "{} ({})",
                stripped,
                versions.join(", ")
            )));
        }
        Ok(())
    }

    /// String forms of all members, in order.
    pub fn to_strings(&self) -> Vec<String> {
        self.items.iter().map(|id| id.to_string()).collect()
    }
}

impl FromIterator<ComponentIdentity> for IdentitySet {
    fn from_iter<T: IntoIterator<Item = ComponentIdentity>>(iter: T) -> Self {
        Self::from_identities(iter)
    }
}

impl From<Vec<ComponentIdentity>> for IdentitySet {
    fn from(ids: Vec<ComponentIdentity>) -> Self {
        Self::from_identities(ids)
    }
}

impl From<IdentitySet> for Vec<ComponentIdentity> {
    fn from(set: IdentitySet) -> Self {
        set.items
    }
}

impl<'a> IntoIterator for &'a IdentitySet {
    type Item = &'a ComponentIdentity;
    type IntoIter = std::slice::Iter<'a, ComponentIdentity>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl IntoIterator for IdentitySet {
    type Item = ComponentIdentity;
    type IntoIter = std::vec::IntoIter<ComponentIdentity>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}
