//! Resource addresses
//!
//! Provides [`Address`] for hierarchical addressing of nodes in the resource tree.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// One `(key, value)` segment of an [`Address`]
///
/// The key names the child collection, the value names the child within it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PathElement {
    key: String,
    value: String,
}

impl PathElement {
    /// Create a new element
    #[inline]
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Collection name
    #[inline]
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Child name
    #[inline]
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl Display for PathElement {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

/// Address of a resource in the management tree
///
/// A child's address is its parent's address plus one element. Equality is
/// structural.
///
/// # Examples
/// - `/` is the root
/// - `/socket-binding-group=standard/socket-binding=http`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address(Vec<PathElement>);

impl Address {
    /// The root address
    #[inline]
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Create an address from elements
    #[inline]
    #[must_use]
    pub fn new(elements: Vec<PathElement>) -> Self {
        Self(elements)
    }

    /// Create an address from `(key, value)` pairs
    #[must_use]
    pub fn from_pairs<K, V>(pairs: &[(K, V)]) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        Self(
            pairs
                .iter()
                .map(|(k, v)| PathElement::new(k.as_ref(), v.as_ref()))
                .collect(),
        )
    }

    /// Address elements from root to leaf
    #[inline]
    #[must_use]
    pub fn elements(&self) -> &[PathElement] {
        &self.0
    }

    /// Number of elements
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if this is the root address
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Element at `index`
    #[inline]
    #[must_use]
    pub fn element(&self, index: usize) -> Option<&PathElement> {
        self.0.get(index)
    }

    /// Last element (if not root)
    #[inline]
    #[must_use]
    pub fn last_element(&self) -> Option<&PathElement> {
        self.0.last()
    }

    /// Parent address (if not root)
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.0.is_empty() {
            None
        } else {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    /// Append one element, returning the child address
    #[must_use]
    pub fn append(&self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut new = self.clone();
        new.0.push(PathElement::new(key, value));
        new
    }

    /// Prefix made of the first `len` elements
    #[must_use]
    pub fn sub_address(&self, len: usize) -> Self {
        Self(self.0[..len.min(self.0.len())].to_vec())
    }

    /// Check if this address is a prefix of (or equal to) another
    #[inline]
    #[must_use]
    pub fn is_prefix_of(&self, other: &Self) -> bool {
        self.0.len() <= other.0.len() && self.0 == other.0[..self.0.len()]
    }

    /// Iterator over elements
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &PathElement> {
        self.0.iter()
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "/");
        }
        for element in &self.0 {
            write!(f, "/{element}")?;
        }
        Ok(())
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed == "/" {
            return Ok(Self::root());
        }

        trimmed
            .trim_start_matches('/')
            .split('/')
            .map(|segment| {
                let (key, value) = segment
                    .split_once('=')
                    .ok_or_else(|| AddressError::MissingSeparator(segment.to_string()))?;
                if key.is_empty() || value.is_empty() {
                    return Err(AddressError::EmptySegment(segment.to_string()));
                }
                Ok(PathElement::new(key, value))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

impl From<Vec<PathElement>> for Address {
    fn from(elements: Vec<PathElement>) -> Self {
        Self(elements)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Errors related to parsing addresses
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    /// Segment without a `key=value` separator
    #[error("address segment '{0}' is missing '='")]
    MissingSeparator(String),

    /// Segment with an empty key or value
    #[error("address segment '{0}' has an empty key or value")]
    EmptySegment(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn segment() -> impl Strategy<Value = (String, String)> {
        ("[a-z][a-z-]{0,12}", "[a-z0-9*][a-z0-9.-]{0,12}")
    }

    proptest! {
        #[test]
        fn prop_display_parses_back(pairs in prop::collection::vec(segment(), 0..5)) {
            let addr = Address::from_pairs(&pairs);
            let parsed: Address = addr.to_string().parse().unwrap();
            prop_assert_eq!(parsed, addr);
        }

        #[test]
        fn prop_append_then_parent_is_identity(
            pairs in prop::collection::vec(segment(), 0..4),
            (key, value) in segment(),
        ) {
            let addr = Address::from_pairs(&pairs);
            let child = addr.append(key, value);
            prop_assert_eq!(child.len(), addr.len() + 1);
            prop_assert_eq!(child.parent(), Some(addr));
        }
    }

    #[test]
    fn root_displays_as_slash() {
        assert_eq!(Address::root().to_string(), "/");
        assert!(Address::root().parent().is_none());
    }

    #[test]
    fn parse_and_display() {
        let addr: Address = "/socket-binding-group=standard/socket-binding=http"
            .parse()
            .unwrap();
        assert_eq!(addr.len(), 2);
        assert_eq!(addr.element(0).unwrap().key(), "socket-binding-group");
        assert_eq!(addr.last_element().unwrap().value(), "http");
        assert_eq!(
            addr.to_string(),
            "/socket-binding-group=standard/socket-binding=http"
        );
    }

    #[test]
    fn parse_rejects_bad_segments() {
        assert!(matches!(
            "/host".parse::<Address>(),
            Err(AddressError::MissingSeparator(_))
        ));
        assert!(matches!(
            "/host=".parse::<Address>(),
            Err(AddressError::EmptySegment(_))
        ));
    }

    #[test]
    fn child_is_parent_plus_one() {
        let parent = Address::from_pairs(&[("host", "master")]);
        let child = parent.append("interface", "public");
        assert_eq!(child.parent().unwrap(), parent);
        assert!(parent.is_prefix_of(&child));
        assert!(!child.is_prefix_of(&parent));
    }

    #[test]
    fn sub_address_clamps() {
        let addr = Address::from_pairs(&[("a", "1"), ("b", "2")]);
        assert_eq!(addr.sub_address(1), Address::from_pairs(&[("a", "1")]));
        assert_eq!(addr.sub_address(9), addr);
    }

    #[test]
    fn serde_uses_text_form() {
        let addr = Address::from_pairs(&[("interface", "public")]);
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, "\"/interface=public\"");
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }
}
