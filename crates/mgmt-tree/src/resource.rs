//! Resource nodes
//!
//! A [`Resource`] is a persistent value: cloning shares structure, so taking a
//! snapshot of the whole tree is O(1) and each write copies only the path it
//! touches.

use im::OrdMap;
use mgmt_model::{Address, ModelValue};
use std::collections::{BTreeMap, BTreeSet};

/// Attribute map of a single resource
pub type AttributeMap = OrdMap<String, ModelValue>;

/// Node of the resource tree
///
/// Child collections exist only while they hold at least one child.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resource {
    model: AttributeMap,
    children: OrdMap<String, OrdMap<String, Resource>>,
}

impl Resource {
    /// Resource with the given attributes and no children
    #[must_use]
    pub fn new(model: impl IntoIterator<Item = (String, ModelValue)>) -> Self {
        Self {
            model: model.into_iter().collect(),
            children: OrdMap::new(),
        }
    }

    /// Attribute map
    #[inline]
    #[must_use]
    pub fn model(&self) -> &AttributeMap {
        &self.model
    }

    /// Attributes as an object value
    #[must_use]
    pub fn model_value(&self) -> ModelValue {
        ModelValue::Object(
            self.model
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect::<BTreeMap<_, _>>(),
        )
    }

    /// Single attribute, `Undefined` when absent
    #[must_use]
    pub fn attribute(&self, name: &str) -> &ModelValue {
        static UNDEFINED: ModelValue = ModelValue::Undefined;
        self.model.get(name).unwrap_or(&UNDEFINED)
    }

    /// Replace the attribute map
    pub fn set_model(&mut self, model: AttributeMap) {
        self.model = model;
    }

    /// Names of the non-empty child collections
    #[must_use]
    pub fn collection_names(&self) -> BTreeSet<String> {
        self.children.keys().cloned().collect()
    }

    /// Names of the children in `collection`; empty if the collection is absent
    #[must_use]
    pub fn children_names(&self, collection: &str) -> BTreeSet<String> {
        self.children
            .get(collection)
            .map(|c| c.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Check if a child exists
    #[must_use]
    pub fn has_child(&self, collection: &str, name: &str) -> bool {
        self.child(collection, name).is_some()
    }

    /// Child by collection and name
    #[must_use]
    pub fn child(&self, collection: &str, name: &str) -> Option<&Resource> {
        self.children.get(collection).and_then(|c| c.get(name))
    }

    /// Insert or replace a child
    pub fn set_child(&mut self, collection: &str, name: &str, child: Resource) {
        let mut members = self.children.get(collection).cloned().unwrap_or_default();
        members.insert(name.to_string(), child);
        self.children.insert(collection.to_string(), members);
    }

    /// Remove a child, dropping the collection when it becomes empty
    pub fn remove_child(&mut self, collection: &str, name: &str) -> Option<Resource> {
        let members = self.children.get_mut(collection)?;
        let removed = members.remove(name);
        if members.is_empty() {
            self.children.remove(collection);
        }
        removed
    }

    /// Descendant at a relative address
    #[must_use]
    pub fn navigate(&self, address: &Address) -> Option<&Resource> {
        address
            .iter()
            .try_fold(self, |node, element| node.child(element.key(), element.value()))
    }

    /// Mutable descendant at a relative address, copying shared nodes on the way
    pub fn navigate_mut(&mut self, address: &Address) -> Option<&mut Resource> {
        let mut node = self;
        for element in address.iter() {
            node = node
                .children
                .get_mut(element.key())?
                .get_mut(element.value())?;
        }
        Some(node)
    }

    /// Copy whose children are attribute-less placeholders
    #[must_use]
    pub fn shallow(&self) -> Resource {
        Resource {
            model: self.model.clone(),
            children: self
                .children
                .iter()
                .map(|(collection, members)| {
                    let placeholders: OrdMap<String, Resource> = members
                        .keys()
                        .map(|name| (name.clone(), Resource::default()))
                        .collect();
                    (collection.clone(), placeholders)
                })
                .collect(),
        }
    }

    /// JSON rendering in read-resource form
    ///
    /// Children appear as `collection -> name -> node`; when not recursive the
    /// child nodes are rendered as `null`.
    #[must_use]
    pub fn to_json(&self, recursive: bool) -> serde_json::Value {
        let mut out: serde_json::Map<String, serde_json::Value> = self
            .model
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect();
        for (collection, members) in &self.children {
            let rendered = members
                .iter()
                .map(|(name, child)| {
                    let value = if recursive {
                        child.to_json(true)
                    } else {
                        serde_json::Value::Null
                    };
                    (name.clone(), value)
                })
                .collect();
            out.insert(collection.clone(), serde_json::Value::Object(rendered));
        }
        serde_json::Value::Object(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn group() -> Resource {
        let mut group = Resource::new([("default-interface".to_string(), "public".into())]);
        group.set_child(
            "socket-binding",
            "http",
            Resource::new([("port".to_string(), ModelValue::Int(8080))]),
        );
        group
    }

    #[test]
    fn collections_vanish_when_empty() {
        let mut group = group();
        assert_eq!(group.collection_names().len(), 1);
        assert!(group.remove_child("socket-binding", "http").is_some());
        assert!(group.collection_names().is_empty());
        assert!(group.children_names("socket-binding").is_empty());
    }

    #[test]
    fn navigate_and_mutate_copy_on_write() {
        let original = group();
        let mut copy = original.clone();
        let address = Address::root().append("socket-binding", "http");
        copy.navigate_mut(&address)
            .unwrap()
            .set_model([("port".to_string(), ModelValue::Int(8443))].into_iter().collect());

        assert_eq!(
            original.navigate(&address).unwrap().attribute("port"),
            &ModelValue::Int(8080)
        );
        assert_eq!(
            copy.navigate(&address).unwrap().attribute("port"),
            &ModelValue::Int(8443)
        );
    }

    #[test]
    fn json_forms() {
        let group = group();
        assert_eq!(
            group.to_json(true),
            json!({
                "default-interface": "public",
                "socket-binding": { "http": { "port": 8080 } }
            })
        );
        assert_eq!(
            group.to_json(false),
            json!({
                "default-interface": "public",
                "socket-binding": { "http": null }
            })
        );
        assert_eq!(group.shallow().child("socket-binding", "http"), Some(&Resource::default()));
    }
}
