//! Shared name spaces and inclusion walks
//!
//! Some child collections of one parent share a single name space: a name
//! used in one of them may not be reused in another. Groups may also include
//! other groups by name, forming a graph that can contain cycles.

use crate::error::TreeError;
use crate::resource::Resource;
use mgmt_model::Address;
use std::collections::BTreeSet;
use tracing::debug;

/// Set of sibling collections whose children share one name space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SharedNamespace {
    collections: &'static [&'static str],
}

impl SharedNamespace {
    /// Namespace over `collections`
    #[must_use]
    pub const fn new(collections: &'static [&'static str]) -> Self {
        Self { collections }
    }

    /// Member collections
    #[inline]
    #[must_use]
    pub fn collections(&self) -> &'static [&'static str] {
        self.collections
    }

    /// Check if `collection` belongs to this namespace
    #[must_use]
    pub fn contains(&self, collection: &str) -> bool {
        self.collections.contains(&collection)
    }

    /// Check that `name` is not used by another member collection of `group`
    ///
    /// The collection `kind` itself is skipped; uniqueness within a single
    /// collection is enforced by the tree.
    ///
    /// # Errors
    /// [`TreeError::DuplicateName`] naming the collection already holding
    /// `name`.
    pub fn check(
        &self,
        group: &Resource,
        group_address: &Address,
        kind: &str,
        name: &str,
    ) -> Result<(), TreeError> {
        match self
            .collections
            .iter()
            .filter(|c| **c != kind)
            .find(|c| group.has_child(c, name))
        {
            Some(existing) => Err(TreeError::DuplicateName {
                existing: (*existing).to_string(),
                kind: kind.to_string(),
                name: name.to_string(),
                parent: group_address.clone(),
            }),
            None => Ok(()),
        }
    }
}

/// Walk an inclusion graph from `start`
///
/// `visit` is called once per reachable group and returns the names the
/// group includes, or `None` if the group does not exist; missing groups are
/// skipped. Cycles and diamonds are handled by the visited set. Returns the
/// groups visited, in visit order.
///
/// # Errors
/// The first error returned by `visit`.
pub fn walk_inclusions<E, F>(start: &str, mut visit: F) -> Result<Vec<String>, E>
where
    F: FnMut(&str) -> Result<Option<Vec<String>>, E>,
{
    let mut visited = BTreeSet::new();
    let mut order = Vec::new();
    let mut frontier = vec![start.to_string()];

    while let Some(group) = frontier.pop() {
        if !visited.insert(group.clone()) {
            continue;
        }
        match visit(&group)? {
            Some(includes) => {
                frontier.extend(
                    includes
                        .into_iter()
                        .rev()
                        .filter(|included| !visited.contains(included)),
                );
                order.push(group);
            }
            None => debug!(group = %group, "included group missing, skipped"),
        }
    }

    Ok(order)
}
