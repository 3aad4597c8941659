use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{DocumentError, Result};

/// A single cluster resource manifest, addressed with dot separated paths.
///
/// Paths only ever match map keys. Sequences can be read or replaced as a whole, but there is no
/// syntax to address one of their elements. Leading dots are ignored, so `.status` and `status`
/// point at the same field.
///
/// Reads and deletes have deliberately different contracts:
///
/// - [`Document::get`] fails with [`DocumentError::PathNotFound`] when any segment is missing;
/// - [`Document::delete`] treats a missing segment as "nothing to delete".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Value);

impl Document {
    pub fn new(value: Value) -> Self {
        Document(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_inner(self) -> Value {
        self.0
    }

    /// Value at `path`.
    pub fn get(&self, path: &str) -> Result<&Value> {
        segments(path).try_fold(&self.0, |node, segment| match node {
            Value::Object(map) => map
                .get(segment)
                .ok_or_else(|| DocumentError::path_not_found(path, segment)),
            Value::Array(_)
            | Value::String(_)
            | Value::Number(_)
            | Value::Bool(_)
            | Value::Null => Err(DocumentError::path_not_found(path, segment)),
        })
    }

    /// Mutable counterpart of [`Document::get`], with the same failure modes.
    pub fn get_mut(&mut self, path: &str) -> Result<&mut Value> {
        segments(path).try_fold(&mut self.0, |node, segment| match node {
            Value::Object(map) => map
                .get_mut(segment)
                .ok_or_else(|| DocumentError::path_not_found(path, segment)),
            Value::Array(_)
            | Value::String(_)
            | Value::Number(_)
            | Value::Bool(_)
            | Value::Null => Err(DocumentError::path_not_found(path, segment)),
        })
    }

    /// Deserializes the value at `path` into `T`.
    pub fn get_as<'de, T>(&'de self, path: &str) -> Result<T>
    where
        T: Deserialize<'de>,
    {
        T::deserialize(self.get(path)?).map_err(|source| DocumentError::UnexpectedShape {
            path: path.to_owned(),
            source,
        })
    }

    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_ok()
    }

    /// Assigns `value` at `path`, overwriting whatever was there.
    ///
    /// Missing intermediate segments are created as empty maps, and intermediate nodes that are
    /// not maps are replaced by empty maps. Sequences are never created implicitly.
    pub fn set<V>(&mut self, path: &str, value: V)
    where
        V: Into<Value>,
    {
        let (mut parents, last) = split_path(path);

        let parent = parents.try_fold(&mut self.0, |node, segment| {
            ensure_object(node).map(|map| {
                map.entry(segment)
                    .or_insert_with(|| Value::Object(Map::new()))
            })
        });

        if let Some(map) = parent.and_then(ensure_object) {
            map.insert(last.to_owned(), value.into());
        }
    }

    /// Removes the field at `path` from its parent map, returning the removed value.
    ///
    /// A path that does not exist is a no-op, so this can be called on documents that never had
    /// the field.
    pub fn delete(&mut self, path: &str) -> Option<Value> {
        let (parents, last) = split_path(path);

        let mut node = &mut self.0;
        for segment in parents {
            node = match node {
                Value::Object(map) => map.get_mut(segment)?,
                Value::Array(_)
                | Value::String(_)
                | Value::Number(_)
                | Value::Bool(_)
                | Value::Null => return None,
            };
        }

        match node {
            Value::Object(map) => map.remove(last),
            Value::Array(_)
            | Value::String(_)
            | Value::Number(_)
            | Value::Bool(_)
            | Value::Null => None,
        }
    }

    /// Removes every map entry named `key`, at any depth, including maps nested in sequences.
    ///
    /// The match is on the key name alone, wherever it appears in the tree. Returns how many
    /// entries were removed.
    pub fn delete_any(&mut self, key: &str) -> usize {
        remove_key(&mut self.0, key)
    }

    /// `metadata.name`
    pub fn name(&self) -> Option<&str> {
        self.get("metadata.name").ok()?.as_str()
    }

    /// `metadata.namespace`
    pub fn namespace(&self) -> Option<&str> {
        self.get("metadata.namespace").ok()?.as_str()
    }

    pub fn kind(&self) -> Option<&str> {
        self.get("kind").ok()?.as_str()
    }
}

impl From<Value> for Document {
    fn from(value: Value) -> Self {
        Document(value)
    }
}

impl From<Document> for Value {
    fn from(document: Document) -> Self {
        document.0
    }
}

impl AsRef<Value> for Document {
    fn as_ref(&self) -> &Value {
        &self.0
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

fn segments(path: &str) -> std::str::Split<'_, char> {
    path.trim_start_matches('.').split('.')
}

/// Splits `path` into its parent segments and the final one.
fn split_path(path: &str) -> (impl Iterator<Item = &str>, &str) {
    let path = path.trim_start_matches('.');

    match path.rsplit_once('.') {
        Some((parents, last)) => (Some(parents.split('.')).into_iter().flatten(), last),
        None => (None::<std::str::Split<'_, char>>.into_iter().flatten(), path),
    }
}

/// Replaces `node` with an empty map unless it already is one.
///
/// Always returns `Some`.
fn ensure_object(node: &mut Value) -> Option<&mut Map<String, Value>> {
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }

    node.as_object_mut()
}

fn remove_key(node: &mut Value, key: &str) -> usize {
    match node {
        Value::Object(map) => {
            let removed = usize::from(map.remove(key).is_some());

            removed
                + map
                    .values_mut()
                    .map(|value| remove_key(value, key))
                    .sum::<usize>()
        }
        Value::Array(items) => items.iter_mut().map(|item| remove_key(item, key)).sum(),
        Value::String(_) | Value::Number(_) | Value::Bool(_) | Value::Null => 0,
    }
}
