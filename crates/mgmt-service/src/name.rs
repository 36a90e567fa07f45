//! Service identities

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Hierarchical service name, rendered with `.` between segments
///
/// Segments are kept separately, so a dynamic segment containing a dot (a host
/// name, say) stays one segment.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ServiceName(Vec<String>);

impl ServiceName {
    /// Name made of one segment per non-empty dotted part of `dotted`
    #[must_use]
    pub fn parse(dotted: &str) -> Self {
        Self(
            dotted
                .split('.')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    /// Name with `segment` appended
    #[must_use]
    pub fn append(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }

    /// Segments
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Last segment
    #[must_use]
    pub fn simple_name(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// Check if `self` is `parent` plus at least one segment
    #[must_use]
    pub fn is_child_of(&self, parent: &ServiceName) -> bool {
        self.0.len() > parent.0.len() && self.0.starts_with(&parent.0)
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

impl Serialize for ServiceName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ServiceName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(|s| Self::parse(&s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_keeps_dynamic_segment_whole() {
        let base = ServiceName::parse("org.wildfly.network.outbound-socket-binding");
        let name = base.append("mail.example.com");
        assert_eq!(name.segments().len(), 5);
        assert_eq!(name.simple_name(), Some("mail.example.com"));
        assert!(name.is_child_of(&base));
        assert_eq!(
            name.to_string(),
            "org.wildfly.network.outbound-socket-binding.mail.example.com"
        );
    }
}
