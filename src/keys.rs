//! Key derivation
//!
//! Maps a logical key to the physical sub-keys that hold its parts:
//!
//! ```text
//! {ns}{key}#meta           discriminator record (value or array header)
//! {ns}{key}#chunk[i]       i-th segment of a chunked value
//! {ns}{key}#link[s]        prev/next record of array slot s
//! {ns}{key}#slot[s]#...    value of array slot s (itself a chunked value)
//! ```
//!
//! `{ns}` is the namespace prefix, e.g. `"app/users/"`.

use std::fmt;

use crate::error::{PropError, Result};

/// Separates a logical key from its sub-key suffix
pub const SEPARATOR: char = '#';

/// Separates namespace levels
pub const NAMESPACE_SEPARATOR: char = '/';

/// Category of physical key derived from a logical key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubKey {
    /// The discriminator record
    Meta,
    /// One chunk segment
    Chunk(usize),
    /// One array link record
    Link(i64),
}

impl fmt::Display for SubKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubKey::Meta => write!(f, "{}meta", SEPARATOR),
            SubKey::Chunk(i) => write!(f, "{}chunk[{}]", SEPARATOR, i),
            SubKey::Link(s) => write!(f, "{}link[{}]", SEPARATOR, s),
        }
    }
}

/// Check that a caller-supplied logical key can be stored
///
/// Keys must be non-empty and may not contain the reserved separators,
/// otherwise they could collide with derived sub-keys or nested namespaces.
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(PropError::InvalidKey("key must not be empty".to_string()));
    }
    if key.contains(SEPARATOR) || key.contains(NAMESPACE_SEPARATOR) {
        return Err(PropError::InvalidKey(format!(
            "'{}' contains a reserved character ('{}' or '{}')",
            key, SEPARATOR, NAMESPACE_SEPARATOR
        )));
    }
    Ok(())
}

/// Logical key under which the value of array slot `slot` is stored
pub fn slot_key(key: &str, slot: i64) -> String {
    format!("{}{}slot[{}]", key, SEPARATOR, slot)
}

/// A key prefix isolating one logical store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Namespace {
    prefix: String,
}

impl Namespace {
    /// The root namespace (no prefix)
    pub fn root() -> Self {
        Self::default()
    }

    /// Build a namespace from a `/`-separated path such as `"app/users"`
    pub fn from_path(path: &str) -> Result<Self> {
        path.split(NAMESPACE_SEPARATOR)
            .filter(|part| !part.is_empty())
            .try_fold(Self::root(), |ns, part| ns.child(part))
    }

    /// Nested namespace one level below this one
    pub fn child(&self, name: &str) -> Result<Self> {
        validate_key(name)?;
        Ok(Self {
            prefix: format!("{}{}{}", self.prefix, name, NAMESPACE_SEPARATOR),
        })
    }

    /// The raw prefix, empty for the root namespace
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Physical key of `sub` for the logical key `key`
    pub fn physical(&self, key: &str, sub: SubKey) -> String {
        format!("{}{}{}", self.prefix, key, sub)
    }

    /// Prefix shared by every physical key owned by `key`
    pub fn owned_prefix(&self, key: &str) -> String {
        format!("{}{}{}", self.prefix, key, SEPARATOR)
    }

    /// Recover the logical key from a physical `#meta` key that belongs
    /// directly to this namespace
    pub fn logical_from_meta<'a>(&self, physical: &'a str) -> Option<&'a str> {
        let rest = physical.strip_prefix(self.prefix.as_str())?;
        let key = rest.strip_suffix(SubKey::Meta.to_string().as_str())?;
        validate_key(key).ok()?;
        Some(key)
    }
}
