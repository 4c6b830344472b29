//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`Scope`] - Validated scope (remote namespace) name
//! - [`ComponentName`] - Validated hierarchical component name
//! - [`SnapHash`] - Content hash of an immutable snapshot
//! - [`VersionTag`] - Either a semantic version or a snap hash
//! - [`ComponentIdentity`] - Canonical component identifier
//! - [`LaneName`] - Validated lane (branch) name
//! - [`UtcTimestamp`] - RFC3339 timestamp
//!
//! # Validation
//!
//! These types enforce validity at construction time. Invalid values
//! cannot be represented, preventing entire classes of bugs.
//!
//! # Identity grammar
//!
//! The canonical string form of an identity is `[scope/]name[@version]`.
//! A scope always contains at least one `.` (e.g. `acme.ui`), while name
//! path segments never do, so `acme.ui/button` parses unambiguously into
//! scope `acme.ui` and name `button`, and `forms/button` is a scopeless
//! hierarchical name.
//!
//! # Examples
//!
//! ```
//! use tessera::core::types::{ComponentIdentity, Scope};
//!
//! let id = ComponentIdentity::parse("acme.ui/forms/button@1.2.0").unwrap();
//! assert_eq!(id.scope.as_ref().unwrap().as_str(), "acme.ui");
//! assert_eq!(id.name.as_str(), "forms/button");
//!
//! // Round-trips through its string form
//! assert_eq!(id.to_string(), "acme.ui/forms/button@1.2.0");
//!
//! // Invalid constructions fail at creation time
//! assert!(ComponentIdentity::parse("").is_err());
//! assert!(Scope::new("no-dot").is_err());
//! ```

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Errors from identity and type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("malformed identity: {0}")]
    MalformedIdentity(String),

    #[error("invalid scope: {0}")]
    InvalidScope(String),

    #[error("invalid component name: {0}")]
    InvalidName(String),

    #[error("invalid snap hash: {0}")]
    InvalidHash(String),

    #[error("invalid version tag: {0}")]
    InvalidVersion(String),

    #[error("invalid lane name: {0}")]
    InvalidLane(String),
}

/// A validated scope name.
///
/// A scope is the namespace an identity is published under. Scope names
/// are dot-separated (`owner.collection`) and must contain at least one
/// `.` so they can never be confused with a name path segment:
/// - Cannot be empty
/// - Must contain at least one `.`
/// - Segments are non-empty and use only `[A-Za-z0-9_-]`
/// - Cannot contain `/`
///
/// # Example
///
/// ```
/// use tessera::core::types::Scope;
///
/// let scope = Scope::new("acme.ui").unwrap();
/// assert_eq!(scope.as_str(), "acme.ui");
///
/// assert!(Scope::new("").is_err());
/// assert!(Scope::new("nodot").is_err());
/// assert!(Scope::new("has/slash.x").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Scope(String);

impl Scope {
    /// Create a new validated scope name.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::InvalidScope` if the name violates scope rules.
    pub fn new(name: impl Into<String>) -> Result<Self, IdentityError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    fn validate(name: &str) -> Result<(), IdentityError> {
        if name.is_empty() {
            return Err(IdentityError::InvalidScope("scope cannot be empty".into()));
        }
        if !name.contains('.') {
            return Err(IdentityError::InvalidScope(
                "scope must contain at least one '.'".into(),
            ));
        }
        for segment in name.split('.') {
            if segment.is_empty() {
                return Err(IdentityError::InvalidScope(
                    "scope segments cannot be empty".into(),
                ));
            }
            for c in segment.chars() {
                if !(c.is_ascii_alphanumeric() || c == '-' || c == '_') {
                    return Err(IdentityError::InvalidScope(format!(
                        "scope cannot contain '{c}'"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Get the scope as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Scope {
    type Error = IdentityError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Scope> for String {
    fn from(scope: Scope) -> Self {
        scope.0
    }
}

impl AsRef<str> for Scope {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated hierarchical component name.
///
/// Names are `/`-separated paths (`forms/button`):
/// - Cannot be empty
/// - Segments are non-empty and use only `[A-Za-z0-9_-]`
/// - Cannot contain `.` (reserved for scope names)
/// - Cannot start or end with `/`
///
/// # Example
///
/// ```
/// use tessera::core::types::ComponentName;
///
/// let name = ComponentName::new("forms/button").unwrap();
/// assert_eq!(name.as_str(), "forms/button");
///
/// assert!(ComponentName::new("").is_err());
/// assert!(ComponentName::new("has.dot").is_err());
/// assert!(ComponentName::new("/leading").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ComponentName(String);

impl ComponentName {
    /// Create a new validated component name.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::InvalidName` if the name violates naming rules.
    pub fn new(name: impl Into<String>) -> Result<Self, IdentityError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    fn validate(name: &str) -> Result<(), IdentityError> {
        if name.is_empty() {
            return Err(IdentityError::InvalidName("name cannot be empty".into()));
        }
        if name.starts_with('/') || name.ends_with('/') {
            return Err(IdentityError::InvalidName(
                "name cannot start or end with '/'".into(),
            ));
        }
        for segment in name.split('/') {
            if segment.is_empty() {
                return Err(IdentityError::InvalidName(
                    "name path segments cannot be empty".into(),
                ));
            }
            for c in segment.chars() {
                if !(c.is_ascii_alphanumeric() || c == '-' || c == '_') {
                    return Err(IdentityError::InvalidName(format!(
                        "name cannot contain '{c}'"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Get the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterate over the `/`-separated path segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }
}

impl TryFrom<String> for ComponentName {
    type Error = IdentityError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<ComponentName> for String {
    fn from(name: ComponentName) -> Self {
        name.0
    }
}

impl AsRef<str> for ComponentName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ComponentName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The content hash of an immutable snapshot (SHA-256, 64 hex chars).
///
/// Hashes are normalized to lowercase.
///
/// # Example
///
/// ```
/// use tessera::core::types::SnapHash;
///
/// let hash = SnapHash::compute(b"component contents");
/// assert_eq!(hash.as_str().len(), 64);
/// assert_eq!(hash.short(8).len(), 8);
///
/// // The zero hash marks a tracked-but-never-snapped component
/// assert!(SnapHash::zero().is_zero());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SnapHash(String);

impl SnapHash {
    const LEN: usize = 64;

    /// Create a new validated snap hash.
    ///
    /// The hash is normalized to lowercase.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::InvalidHash` if the string is not 64 hex chars.
    pub fn new(hash: impl Into<String>) -> Result<Self, IdentityError> {
        let hash = hash.into().to_ascii_lowercase();
        Self::validate(&hash)?;
        Ok(Self(hash))
    }

    /// Compute the hash of a byte slice.
    pub fn compute(bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        Self(hex::encode(hasher.finalize()))
    }

    /// The zero hash: the "version zero" sentinel for components that are
    /// tracked in the workspace but have never been snapshotted.
    pub fn zero() -> Self {
        Self("0".repeat(Self::LEN))
    }

    /// Check if this is the version-zero sentinel.
    pub fn is_zero(&self) -> bool {
        self.0.chars().all(|c| c == '0')
    }

    /// Get an abbreviated form of the hash.
    ///
    /// Returns the first `len` characters, or the full hash if `len`
    /// exceeds its length.
    pub fn short(&self, len: usize) -> &str {
        let end = len.min(self.0.len());
        &self.0[..end]
    }

    fn validate(hash: &str) -> Result<(), IdentityError> {
        if hash.len() != Self::LEN {
            return Err(IdentityError::InvalidHash(format!(
                "expected {} hex characters, got {}",
                Self::LEN,
                hash.len()
            )));
        }
        if !hash.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(IdentityError::InvalidHash(
                "snap hash must be hexadecimal".into(),
            ));
        }
        Ok(())
    }

    /// Get the hash as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SnapHash {
    type Error = IdentityError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<SnapHash> for String {
    fn from(hash: SnapHash) -> Self {
        hash.0
    }
}

impl AsRef<str> for SnapHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SnapHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The version part of an identity: a semantic version tag or a raw
/// snap hash.
///
/// # Example
///
/// ```
/// use tessera::core::types::VersionTag;
///
/// let tag = VersionTag::parse("1.2.0").unwrap();
/// assert!(matches!(tag, VersionTag::Semver(_)));
///
/// let hash = "a".repeat(64);
/// let tag = VersionTag::parse(&hash).unwrap();
/// assert!(matches!(tag, VersionTag::Hash(_)));
///
/// assert!(VersionTag::parse("not-a-version").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum VersionTag {
    /// A semantic-version tag bound to a snap.
    Semver(semver::Version),
    /// A raw content hash addressing a snap directly.
    Hash(SnapHash),
}

impl VersionTag {
    /// Parse a version tag: tried as semver first, then as a snap hash.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::InvalidVersion` if the string is neither.
    pub fn parse(s: &str) -> Result<Self, IdentityError> {
        if let Ok(v) = semver::Version::parse(s) {
            return Ok(VersionTag::Semver(v));
        }
        SnapHash::new(s).map(VersionTag::Hash).map_err(|_| {
            IdentityError::InvalidVersion(format!(
                "'{s}' is neither a semantic version nor a snap hash"
            ))
        })
    }
}

impl TryFrom<String> for VersionTag {
    type Error = IdentityError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<VersionTag> for String {
    fn from(tag: VersionTag) -> Self {
        tag.to_string()
    }
}

impl std::fmt::Display for VersionTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VersionTag::Semver(v) => write!(f, "{v}"),
            VersionTag::Hash(h) => write!(f, "{h}"),
        }
    }
}

/// The canonical identifier of a component.
///
/// String form: `[scope/]name[@version]`. An identity without a scope is
/// only valid in a purely local, not-yet-published context.
///
/// # Equality granularities
///
/// Full equality is derived (`PartialEq`); three looser comparisons ignore
/// the version, the scope, or both. A `name` is unique within a `scope`,
/// so two identities that are equal without version refer to the same
/// component at possibly different versions.
///
/// # Example
///
/// ```
/// use tessera::core::types::ComponentIdentity;
///
/// let a = ComponentIdentity::parse("acme.ui/button@1.0.0").unwrap();
/// let b = ComponentIdentity::parse("acme.ui/button@2.0.0").unwrap();
/// assert!(a != b);
/// assert!(a.eq_without_version(&b));
///
/// let local = ComponentIdentity::parse("button@1.0.0").unwrap();
/// assert!(local.is_local());
/// assert!(a.eq_without_scope_and_version(&local));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ComponentIdentity {
    /// The namespace the component is published under, if any.
    pub scope: Option<Scope>,
    /// Hierarchical component name, unique within its scope.
    pub name: ComponentName,
    /// Version tag, if the identity pins one.
    pub version: Option<VersionTag>,
}

impl ComponentIdentity {
    /// Create an identity from parts.
    pub fn new(scope: Option<Scope>, name: ComponentName, version: Option<VersionTag>) -> Self {
        Self {
            scope,
            name,
            version,
        }
    }

    /// Parse an identity from its canonical string form.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::MalformedIdentity` on unparsable input.
    pub fn parse(s: &str) -> Result<Self, IdentityError> {
        if s.is_empty() {
            return Err(IdentityError::MalformedIdentity(
                "identity cannot be empty".into(),
            ));
        }

        let (path, version) = match s.split_once('@') {
            Some((path, v)) => {
                let tag = VersionTag::parse(v)
                    .map_err(|e| IdentityError::MalformedIdentity(format!("'{s}': {e}")))?;
                (path, Some(tag))
            }
            None => (s, None),
        };

        // The first path segment is a scope iff it contains a '.'.
        let (scope, name) = match path.split_once('/') {
            Some((head, rest)) if head.contains('.') => {
                let scope = Scope::new(head)
                    .map_err(|e| IdentityError::MalformedIdentity(format!("'{s}': {e}")))?;
                (Some(scope), rest)
            }
            _ => (None, path),
        };

        let name = ComponentName::new(name)
            .map_err(|e| IdentityError::MalformedIdentity(format!("'{s}': {e}")))?;

        Ok(Self {
            scope,
            name,
            version,
        })
    }

    /// Equality ignoring the version field.
    pub fn eq_without_version(&self, other: &Self) -> bool {
        self.scope == other.scope && self.name == other.name
    }

    /// Equality ignoring the scope field.
    pub fn eq_without_scope(&self, other: &Self) -> bool {
        self.name == other.name && self.version == other.version
    }

    /// Equality ignoring both scope and version.
    pub fn eq_without_scope_and_version(&self, other: &Self) -> bool {
        self.name == other.name
    }

    /// True if the identity carries no scope (not yet published).
    pub fn is_local(&self) -> bool {
        self.scope.is_none()
    }

    /// A copy of this identity with the version stripped.
    pub fn without_version(&self) -> Self {
        Self {
            scope: self.scope.clone(),
            name: self.name.clone(),
            version: None,
        }
    }

    /// A copy of this identity pinned to the given version.
    pub fn with_version(&self, version: VersionTag) -> Self {
        Self {
            scope: self.scope.clone(),
            name: self.name.clone(),
            version: Some(version),
        }
    }

    /// The `[scope/]name` half of the string form, used as a graph key.
    pub fn stripped_string(&self) -> String {
        match &self.scope {
            Some(scope) => format!("{}/{}", scope, self.name),
            None => self.name.to_string(),
        }
    }
}

impl TryFrom<String> for ComponentIdentity {
    type Error = IdentityError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<ComponentIdentity> for String {
    fn from(id: ComponentIdentity) -> Self {
        id.to_string()
    }
}

impl std::fmt::Display for ComponentIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(scope) = &self.scope {
            write!(f, "{scope}/")?;
        }
        write!(f, "{}", self.name)?;
        if let Some(version) = &self.version {
            write!(f, "@{version}")?;
        }
        Ok(())
    }
}

/// A validated lane name.
///
/// Lanes are named, divergent lines of history. Lane names follow the
/// same segment rules as component names but are flat (no `/`).
///
/// # Example
///
/// ```
/// use tessera::core::types::LaneName;
///
/// let lane = LaneName::new("feature-x").unwrap();
/// assert_eq!(lane.as_str(), "feature-x");
/// assert!(LaneName::new("has/slash").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LaneName(String);

/// The default lane every workspace starts on.
pub const DEFAULT_LANE: &str = "main";

impl LaneName {
    /// Create a new validated lane name.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::InvalidLane` if the name is empty or
    /// contains characters outside `[A-Za-z0-9._-]`.
    pub fn new(name: impl Into<String>) -> Result<Self, IdentityError> {
        let name = name.into();
        if name.is_empty() {
            return Err(IdentityError::InvalidLane("lane cannot be empty".into()));
        }
        for c in name.chars() {
            if !(c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.') {
                return Err(IdentityError::InvalidLane(format!(
                    "lane cannot contain '{c}'"
                )));
            }
        }
        Ok(Self(name))
    }

    /// The default lane.
    pub fn default_lane() -> Self {
        Self(DEFAULT_LANE.to_string())
    }

    /// True if this is the default lane.
    pub fn is_default(&self) -> bool {
        self.0 == DEFAULT_LANE
    }

    /// Get the lane name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for LaneName {
    type Error = IdentityError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<LaneName> for String {
    fn from(name: LaneName) -> Self {
        name.0
    }
}

impl AsRef<str> for LaneName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LaneName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A UTC timestamp in RFC3339 format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtcTimestamp(chrono::DateTime<chrono::Utc>);

impl UtcTimestamp {
    /// Create a timestamp for the current moment.
    pub fn now() -> Self {
        Self(chrono::Utc::now())
    }

    /// Create a timestamp from a chrono DateTime.
    pub fn from_datetime(dt: chrono::DateTime<chrono::Utc>) -> Self {
        Self(dt)
    }

    /// Get the underlying datetime.
    pub fn as_datetime(&self) -> &chrono::DateTime<chrono::Utc> {
        &self.0
    }
}

impl std::fmt::Display for UtcTimestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}
