//! deps
//!
//! Workspace-wide dependency indexing.
//!
//! # Design
//!
//! The indexer is a pure aggregation step: it flattens every component's
//! declared dependency buckets into a reverse index from external
//! dependency name to the components requesting it, then annotates
//! entries with root-policy `preserve` overrides. Range intersection and
//! hoisting decisions happen downstream in the range solver and are out
//! of scope here; ranges stay opaque strings.
//!
//! Root overrides never create index entries: a preserved dependency no
//! component requests simply does not appear.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::types::ComponentIdentity;

/// Dependency lifecycle classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleType {
    /// Needed at runtime.
    Runtime,
    /// Needed only while developing the component.
    Dev,
    /// Expected to be provided by the consumer.
    Peer,
}

impl std::fmt::Display for LifecycleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LifecycleType::Runtime => write!(f, "runtime"),
            LifecycleType::Dev => write!(f, "dev"),
            LifecycleType::Peer => write!(f, "peer"),
        }
    }
}

/// A single dependency declaration attributed to its origin component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyRecord {
    /// External dependency (package) name.
    pub dependency_name: String,
    /// Declared semver-range string, opaque at this layer.
    pub range: String,
    /// The component declaring the dependency.
    pub origin: ComponentIdentity,
    /// Which bucket the declaration came from.
    pub lifecycle: LifecycleType,
}

/// Root-policy override value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyValue {
    /// The version the root pins the dependency to.
    pub version: String,
    /// Whether the pinned version must be preserved through hoisting.
    pub preserve: bool,
}

/// One entry of the ordered root override policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspacePolicyEntry {
    /// External dependency name the entry applies to.
    pub dependency_id: String,
    /// Pinned version and preservation flag.
    pub value: PolicyValue,
    /// Lifecycle the root assigns to the dependency.
    pub lifecycle_type: LifecycleType,
}

/// A component's declared dependency buckets.
///
/// `peer_metadata` mirrors the peer bucket's auxiliary metadata and is
/// not relevant to indexing unless explicitly requested.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyBuckets {
    /// Runtime dependencies: name to range.
    #[serde(default)]
    pub runtime: BTreeMap<String, String>,
    /// Development dependencies: name to range.
    #[serde(default)]
    pub dev: BTreeMap<String, String>,
    /// Peer dependencies: name to range.
    #[serde(default)]
    pub peer: BTreeMap<String, String>,
    /// Peer-dependency metadata: name to range-like marker.
    #[serde(default)]
    pub peer_metadata: BTreeMap<String, String>,
}

/// Names a bucket within [`DependencyBuckets`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketKind {
    Runtime,
    Dev,
    Peer,
    PeerMetadata,
}

impl BucketKind {
    fn lifecycle(self) -> LifecycleType {
        match self {
            BucketKind::Runtime => LifecycleType::Runtime,
            BucketKind::Dev => LifecycleType::Dev,
            BucketKind::Peer | BucketKind::PeerMetadata => LifecycleType::Peer,
        }
    }

    fn select(self, buckets: &DependencyBuckets) -> &BTreeMap<String, String> {
        match self {
            BucketKind::Runtime => &buckets.runtime,
            BucketKind::Dev => &buckets.dev,
            BucketKind::Peer => &buckets.peer,
            BucketKind::PeerMetadata => &buckets.peer_metadata,
        }
    }
}

/// Buckets indexed when the caller does not restrict to a subset: all
/// declaration buckets except peer metadata.
const DEFAULT_BUCKETS: [BucketKind; 3] = [BucketKind::Runtime, BucketKind::Dev, BucketKind::Peer];

/// One component's request for a dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentItem {
    /// The requesting component.
    pub origin: ComponentIdentity,
    /// The range it declared.
    pub range: String,
    /// The bucket it declared the dependency in.
    pub lifecycle_type: LifecycleType,
}

/// Root-policy annotations stamped onto an index entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexMetadata {
    /// Version preserved by the root policy, if any.
    pub preserved_version: Option<String>,
    /// Lifecycle the root policy assigns, if any.
    pub preserved_lifecycle_type: Option<LifecycleType>,
}

/// All requests for one dependency name, plus policy annotations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Root-policy annotations.
    pub metadata: IndexMetadata,
    /// Requests in component iteration order.
    pub component_items: Vec<ComponentItem>,
}

/// Reverse index from dependency name to its requesting components.
pub type PackageNameIndex = BTreeMap<String, IndexEntry>;

/// Build the reverse dependency index for a workspace.
///
/// `per_component_deps` maps each component to its declared buckets, in
/// a stable order. `hoisted_buckets` restricts indexing to a subset of
/// buckets (used when only hoistable buckets matter); when `None`, every
/// bucket except peer metadata is indexed.
///
/// Root-policy entries marked `preserve` annotate entries that already
/// exist; they never create new ones.
pub fn index_by_dependency_id(
    root_policy: &[WorkspacePolicyEntry],
    per_component_deps: &[(ComponentIdentity, DependencyBuckets)],
    hoisted_buckets: Option<&[BucketKind]>,
) -> PackageNameIndex {
    let buckets: &[BucketKind] = hoisted_buckets.unwrap_or(&DEFAULT_BUCKETS);

    let mut index = PackageNameIndex::new();
    for (origin, declared) in per_component_deps {
        for kind in buckets {
            for (name, range) in kind.select(declared) {
                index
                    .entry(name.clone())
                    .or_default()
                    .component_items
                    .push(ComponentItem {
                        origin: origin.clone(),
                        range: range.clone(),
                        lifecycle_type: kind.lifecycle(),
                    });
            }
        }
    }

    for entry in root_policy {
        if !entry.value.preserve {
            continue;
        }
        // Annotate only dependencies some component actually requests
        if let Some(indexed) = index.get_mut(&entry.dependency_id) {
            indexed.metadata.preserved_version = Some(entry.value.version.clone());
            indexed.metadata.preserved_lifecycle_type = Some(entry.lifecycle_type);
        }
    }

    index
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cid(s: &str) -> ComponentIdentity {
        ComponentIdentity::parse(s).unwrap()
    }

    fn buckets(
        runtime: &[(&str, &str)],
        dev: &[(&str, &str)],
        peer: &[(&str, &str)],
    ) -> DependencyBuckets {
        let to_map = |pairs: &[(&str, &str)]| {
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        };
        DependencyBuckets {
            runtime: to_map(runtime),
            dev: to_map(dev),
            peer: to_map(peer),
            peer_metadata: BTreeMap::new(),
        }
    }

    fn preserve(name: &str, version: &str, lifecycle: LifecycleType) -> WorkspacePolicyEntry {
        WorkspacePolicyEntry {
            dependency_id: name.into(),
            value: PolicyValue {
                version: version.into(),
                preserve: true,
            },
            lifecycle_type: lifecycle,
        }
    }

    #[test]
    fn indexes_all_default_buckets() {
        let deps = vec![(
            cid("acme.ui/button"),
            buckets(
                &[("left-pad", "^1.0.0")],
                &[("typescript", "~5.0.0")],
                &[("react", ">=17")],
            ),
        )];

        let index = index_by_dependency_id(&[], &deps, None);
        assert_eq!(index.len(), 3);
        assert_eq!(index["left-pad"].component_items[0].lifecycle_type, LifecycleType::Runtime);
        assert_eq!(index["typescript"].component_items[0].lifecycle_type, LifecycleType::Dev);
        assert_eq!(index["react"].component_items[0].lifecycle_type, LifecycleType::Peer);
    }

    #[test]
    fn peer_metadata_bucket_is_dropped_by_default() {
        let mut declared = buckets(&[("left-pad", "^1.0.0")], &[], &[]);
        declared
            .peer_metadata
            .insert("react".into(), "*".into());
        let deps = vec![(cid("acme.ui/button"), declared)];

        let index = index_by_dependency_id(&[], &deps, None);
        assert!(index.contains_key("left-pad"));
        assert!(!index.contains_key("react"));
    }

    #[test]
    fn hoisted_subset_restricts_buckets() {
        let deps = vec![(
            cid("acme.ui/button"),
            buckets(
                &[("left-pad", "^1.0.0")],
                &[("typescript", "~5.0.0")],
                &[],
            ),
        )];

        let index = index_by_dependency_id(&[], &deps, Some(&[BucketKind::Runtime]));
        assert!(index.contains_key("left-pad"));
        assert!(!index.contains_key("typescript"));
    }

    #[test]
    fn aggregates_requests_across_components() {
        let deps = vec![
            (
                cid("acme.ui/button"),
                buckets(&[("left-pad", "^1.0.0")], &[], &[]),
            ),
            (
                cid("acme.ui/card"),
                buckets(&[("left-pad", "^1.2.0")], &[], &[]),
            ),
        ];

        let index = index_by_dependency_id(&[], &deps, None);
        let items = &index["left-pad"].component_items;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].origin, cid("acme.ui/button"));
        assert_eq!(items[0].range, "^1.0.0");
        assert_eq!(items[1].origin, cid("acme.ui/card"));
        assert_eq!(items[1].range, "^1.2.0");
    }

    #[test]
    fn preserve_policy_annotates_existing_entry() {
        let deps = vec![(
            cid("acme.ui/button"),
            buckets(&[("left-pad", "^1.0.0")], &[], &[]),
        )];
        let policy = vec![preserve("left-pad", "1.3.0", LifecycleType::Runtime)];

        let index = index_by_dependency_id(&policy, &deps, None);
        let entry = &index["left-pad"];
        assert_eq!(entry.component_items.len(), 1);
        assert_eq!(entry.component_items[0].range, "^1.0.0");
        assert_eq!(entry.component_items[0].origin, cid("acme.ui/button"));
        assert_eq!(entry.component_items[0].lifecycle_type, LifecycleType::Runtime);
        assert_eq!(entry.metadata.preserved_version.as_deref(), Some("1.3.0"));
        assert_eq!(
            entry.metadata.preserved_lifecycle_type,
            Some(LifecycleType::Runtime)
        );
    }

    #[test]
    fn preserve_policy_never_creates_entries() {
        let policy = vec![preserve("left-pad", "1.3.0", LifecycleType::Runtime)];
        let index = index_by_dependency_id(&policy, &[], None);
        assert!(!index.contains_key("left-pad"));
    }

    #[test]
    fn non_preserve_policy_is_ignored() {
        let deps = vec![(
            cid("acme.ui/button"),
            buckets(&[("left-pad", "^1.0.0")], &[], &[]),
        )];
        let policy = vec![WorkspacePolicyEntry {
            dependency_id: "left-pad".into(),
            value: PolicyValue {
                version: "1.3.0".into(),
                preserve: false,
            },
            lifecycle_type: LifecycleType::Runtime,
        }];

        let index = index_by_dependency_id(&policy, &deps, None);
        assert!(index["left-pad"].metadata.preserved_version.is_none());
    }

    #[test]
    fn later_policy_entry_wins() {
        let deps = vec![(
            cid("acme.ui/button"),
            buckets(&[("left-pad", "^1.0.0")], &[], &[]),
        )];
        let policy = vec![
            preserve("left-pad", "1.3.0", LifecycleType::Runtime),
            preserve("left-pad", "1.4.0", LifecycleType::Dev),
        ];

        let index = index_by_dependency_id(&policy, &deps, None);
        assert_eq!(
            index["left-pad"].metadata.preserved_version.as_deref(),
            Some("1.4.0")
        );
    }
}
