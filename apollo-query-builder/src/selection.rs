//! Selection trees: which fields of a schema an operation should select.
use indexmap::IndexMap;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use serde::ser::SerializeMap;
use serde_json::Value;

use crate::error::InputTypeError;

pub const TYPENAME: &str = "__typename";

/// Prefix of the keys holding inline fragment branches, as in `on_User`.
pub const FRAGMENT_PREFIX: &str = "on_";

/// Key of the inline fragment branch for `type_name`.
pub fn fragment_key(type_name: &str) -> String {
    format!("{FRAGMENT_PREFIX}{type_name}")
}

/// The type condition of a fragment key, if `key` is one.
pub fn fragment_type(key: &str) -> Option<&str> {
    key.strip_prefix(FRAGMENT_PREFIX)
        .filter(|type_name| !type_name.is_empty())
}

/// A single entry of a [`SelectionTree`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Toggle for a scalar or enum field, or for `__typename`.
    Leaf(bool),
    /// Sub-selection of an object field.
    Node(SelectionTree),
    /// Sub-selection of an interface or union field. Branches for concrete
    /// types live under `on_<TypeName>` keys.
    Fragment(SelectionTree),
}

impl Selection {
    pub fn as_tree(&self) -> Option<&SelectionTree> {
        match self {
            Selection::Leaf(_) => None,
            Selection::Node(tree) | Selection::Fragment(tree) => Some(tree),
        }
    }

    pub fn as_tree_mut(&mut self) -> Option<&mut SelectionTree> {
        match self {
            Selection::Leaf(_) => None,
            Selection::Node(tree) | Selection::Fragment(tree) => Some(tree),
        }
    }

    pub fn is_selected_leaf(&self) -> bool {
        matches!(self, Selection::Leaf(true))
    }
}

/// Field name to [`Selection`], in insertion order.
///
/// A tree is plain data: it does not borrow the schema it was generated from
/// and can be cloned, edited and serialized any number of times.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionTree(IndexMap<String, Selection>);

impl SelectionTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Selection> {
        self.0.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Selection> {
        self.0.get_mut(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, selection: Selection) -> Option<Selection> {
        self.0.insert(key.into(), selection)
    }

    pub fn remove(&mut self, key: &str) -> Option<Selection> {
        self.0.shift_remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Selection)> {
        self.0.iter().map(|(key, selection)| (key.as_str(), selection))
    }

    /// Whether any key holds an inline fragment branch.
    pub fn has_fragments(&self) -> bool {
        self.0.keys().any(|key| fragment_type(key).is_some())
    }

    /// Follows `path` through nested trees.
    pub fn get_path(&self, path: &[&str]) -> Option<&Selection> {
        let (last, parents) = path.split_last()?;
        let mut tree = self;
        for key in parents {
            tree = tree.get(key)?.as_tree()?;
        }
        tree.get(last)
    }

    /// Sets the leaf at `path`. Returns `false`, leaving the tree untouched,
    /// when the path does not lead to an existing leaf.
    pub fn set(&mut self, path: &[&str], value: bool) -> bool {
        let Some((last, parents)) = path.split_last() else {
            return false;
        };
        let mut tree = self;
        for key in parents {
            match tree.get_mut(key).and_then(Selection::as_tree_mut) {
                Some(subtree) => tree = subtree,
                None => return false,
            }
        }
        match tree.get_mut(last) {
            Some(Selection::Leaf(leaf)) => {
                *leaf = value;
                true
            }
            _ => false,
        }
    }

    /// Shorthand for `set(path, true)`.
    pub fn select(&mut self, path: &[&str]) -> bool {
        self.set(path, true)
    }

    /// Shorthand for `set(path, false)`.
    pub fn deselect(&mut self, path: &[&str]) -> bool {
        self.set(path, false)
    }

    /// Every leaf with its path, depth first.
    pub fn leaves(&self) -> Vec<(Vec<String>, bool)> {
        let mut leaves = Vec::new();
        self.collect_leaves(&mut Vec::new(), &mut leaves);
        leaves
    }

    fn collect_leaves(&self, path: &mut Vec<String>, leaves: &mut Vec<(Vec<String>, bool)>) {
        for (key, selection) in &self.0 {
            path.push(key.clone());
            match selection {
                Selection::Leaf(value) => leaves.push((path.clone(), *value)),
                Selection::Node(tree) | Selection::Fragment(tree) => {
                    tree.collect_leaves(path, leaves)
                }
            }
            path.pop();
        }
    }
}

impl FromIterator<(String, Selection)> for SelectionTree {
    fn from_iter<I: IntoIterator<Item = (String, Selection)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<(String, Selection)> for SelectionTree {
    fn extend<I: IntoIterator<Item = (String, Selection)>>(&mut self, iter: I) {
        self.0.extend(iter)
    }
}

impl IntoIterator for SelectionTree {
    type Item = (String, Selection);
    type IntoIter = indexmap::map::IntoIter<String, Selection>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a SelectionTree {
    type Item = (&'a String, &'a Selection);
    type IntoIter = indexmap::map::Iter<'a, String, Selection>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl TryFrom<&Value> for SelectionTree {
    type Error = InputTypeError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(object) => tree_from_json(object, &mut Vec::new()),
            other => Err(InputTypeError::NotAnObject(json_kind(other))),
        }
    }
}

impl TryFrom<Value> for SelectionTree {
    type Error = InputTypeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        SelectionTree::try_from(&value)
    }
}

fn tree_from_json(
    object: &serde_json::Map<String, Value>,
    path: &mut Vec<String>,
) -> Result<SelectionTree, InputTypeError> {
    object
        .iter()
        .map(|(key, value)| {
            path.push(key.clone());
            let selection = match value {
                Value::Bool(leaf) => Ok(Selection::Leaf(*leaf)),
                Value::Object(object) => {
                    let tree = tree_from_json(object, path)?;
                    if tree.has_fragments() {
                        Ok(Selection::Fragment(tree))
                    } else {
                        Ok(Selection::Node(tree))
                    }
                }
                other => Err(InputTypeError::InvalidSelection {
                    path: path.join("."),
                    found: json_kind(other),
                }),
            };
            path.pop();
            Ok((key.clone(), selection?))
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

impl From<&SelectionTree> for Value {
    fn from(tree: &SelectionTree) -> Self {
        Value::Object(
            tree.iter()
                .map(|(key, selection)| {
                    let value = match selection {
                        Selection::Leaf(leaf) => Value::Bool(*leaf),
                        Selection::Node(tree) | Selection::Fragment(tree) => Value::from(tree),
                    };
                    (key.to_string(), value)
                })
                .collect(),
        )
    }
}

impl Serialize for Selection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Selection::Leaf(leaf) => serializer.serialize_bool(*leaf),
            Selection::Node(tree) | Selection::Fragment(tree) => tree.serialize(serializer),
        }
    }
}

impl Serialize for SelectionTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, selection) in self.iter() {
            map.serialize_entry(key, selection)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for SelectionTree {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        SelectionTree::try_from(&value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn sample() -> SelectionTree {
        SelectionTree::try_from(json!({
            "user": {
                "id": false,
                "friends": { "name": false },
            },
            "node": {
                "__typename": false,
                "id": false,
                "on_User": { "name": false },
            },
        }))
        .unwrap()
    }

    #[test]
    fn fragment_keys() {
        assert_eq!(fragment_key("User"), "on_User");
        assert_eq!(fragment_type("on_User"), Some("User"));
        assert_eq!(fragment_type("on_"), None);
        assert_eq!(fragment_type("online"), None);
    }

    #[test]
    fn objects_with_fragment_keys_become_fragments() {
        let tree = sample();
        assert!(matches!(tree.get("user"), Some(Selection::Node(_))));
        assert!(matches!(tree.get("node"), Some(Selection::Fragment(_))));
        assert!(matches!(
            tree.get_path(&["node", "on_User"]),
            Some(Selection::Node(_))
        ));
    }

    #[test]
    fn select_follows_paths() {
        let mut tree = sample();
        assert!(tree.select(&["user", "friends", "name"]));
        assert!(tree.select(&["node", "on_User", "name"]));
        assert!(!tree.select(&["user", "friends"]));
        assert!(!tree.select(&["user", "missing"]));
        assert!(!tree.select(&[]));
        assert_eq!(
            tree.get_path(&["user", "friends", "name"]),
            Some(&Selection::Leaf(true))
        );
        assert!(tree.deselect(&["user", "friends", "name"]));
        assert_eq!(
            tree.get_path(&["user", "friends", "name"]),
            Some(&Selection::Leaf(false))
        );
    }

    #[test]
    fn leaves_are_listed_depth_first() {
        let leaves: Vec<_> = sample()
            .leaves()
            .into_iter()
            .map(|(path, _)| path.join("."))
            .collect();
        assert_eq!(
            leaves,
            [
                "user.id",
                "user.friends.name",
                "node.__typename",
                "node.id",
                "node.on_User.name",
            ]
        );
    }

    #[test]
    fn rejects_malformed_json() {
        assert_eq!(
            SelectionTree::try_from(json!([true])),
            Err(InputTypeError::NotAnObject("an array"))
        );
        assert_eq!(
            SelectionTree::try_from(json!({ "user": { "id": 1 } })),
            Err(InputTypeError::InvalidSelection {
                path: "user.id".to_string(),
                found: "a number",
            })
        );
    }

    #[test]
    fn json_preserves_key_order() {
        let tree = sample();
        let text = serde_json::to_string(&tree).unwrap();
        assert_eq!(
            text,
            r#"{"user":{"id":false,"friends":{"name":false}},"node":{"__typename":false,"id":false,"on_User":{"name":false}}}"#
        );
        let parsed: SelectionTree = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, tree);
        assert_eq!(Value::from(&tree), serde_json::from_str::<Value>(&text).unwrap());
    }
}
