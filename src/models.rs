// src/models.rs

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

// --- KEYS ---

/// A single key inside a stored table.
///
/// Numeric keys come from bracketed integer indices (`list[2]`), names from
/// plain identifiers and bracketed barewords. Indices sort before names so
/// enumeration order is stable.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Key {
    /// A numeric key, e.g. the `2` in `list[2]`.
    Index(i64),
    /// A string key, e.g. `list` or the `foo` in `list[foo]`.
    Name(String),
}

impl Key {
    /// Returns the name if this is a string key.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Key::Name(name) => Some(name),
            Key::Index(_) => None,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Index(i) => write!(f, "{}", i),
            Key::Name(name) => f.write_str(name),
        }
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Key::Name(name.to_string())
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Key::Name(name)
    }
}

impl From<i32> for Key {
    fn from(index: i32) -> Self {
        Key::Index(i64::from(index))
    }
}

impl From<i64> for Key {
    fn from(index: i64) -> Self {
        Key::Index(index)
    }
}

/// Renders a key sequence back into path syntax (`a.b[2]`).
pub fn render_path(keys: &[Key]) -> String {
    let mut out = String::new();
    for key in keys {
        match key {
            Key::Index(i) => {
                out.push('[');
                out.push_str(&i.to_string());
                out.push(']');
            }
            Key::Name(name) => {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(name);
            }
        }
    }
    out
}

// --- VALUES ---

/// A value stored in a [`Table`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum Value {
    /// A boolean flag.
    Bool(bool),
    /// A signed integer.
    Integer(i64),
    /// A floating point number.
    Float(f64),
    /// A string.
    String(String),
    /// A nested container.
    Table(Table),
}

impl Value {
    /// A short human readable name for the variant, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Table(_) => "table",
        }
    }

    /// Returns the nested table handle, if this value is a container.
    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Value::Table(t) => Some(t),
            _ => None,
        }
    }

    /// Returns the string contents, if this value is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the boolean, if this value is a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the integer, if this value is an integer.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the number as a float, accepting integers too.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Copies the value, deep-copying nested tables into fresh containers.
    pub fn deep_clone(&self) -> Self {
        match self {
            Value::Table(t) => Value::Table(t.deep_clone()),
            other => other.clone(),
        }
    }

    /// Converts a TOML value. Arrays become tables keyed `1..=n`; datetimes
    /// are kept as their string form.
    pub fn from_toml(value: &toml::Value) -> Self {
        match value {
            toml::Value::String(s) => Value::String(s.clone()),
            toml::Value::Integer(i) => Value::Integer(*i),
            toml::Value::Float(f) => Value::Float(*f),
            toml::Value::Boolean(b) => Value::Bool(*b),
            toml::Value::Datetime(d) => Value::String(d.to_string()),
            toml::Value::Array(items) => {
                let table = Table::new();
                for (i, item) in (1_i64..).zip(items) {
                    table.insert(Key::Index(i), Value::from_toml(item));
                }
                Value::Table(table)
            }
            toml::Value::Table(t) => Value::Table(Table::from_toml(t)),
        }
    }

    /// Converts into a TOML value. Numeric keys are written as strings.
    pub fn to_toml(&self) -> toml::Value {
        match self {
            Value::Bool(b) => toml::Value::Boolean(*b),
            Value::Integer(i) => toml::Value::Integer(*i),
            Value::Float(f) => toml::Value::Float(*f),
            Value::String(s) => toml::Value::String(s.clone()),
            Value::Table(t) => toml::Value::Table(t.to_toml()),
        }
    }

    /// Converts into a JSON value. Numeric keys are written as strings.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Integer(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Value::from(*f),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Table(t) => t.to_json(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Table(t) => write!(f, "<table: {} entries>", t.len()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Table> for Value {
    fn from(t: Table) -> Self {
        Value::Table(t)
    }
}

// --- TABLES ---

/// A shared handle to a mutable, ordered map of [`Key`] to [`Value`].
///
/// Cloning the handle does NOT copy the contents: both handles point to the
/// same container, which is how nested containers keep their identity while
/// Views hold on to them. Use [`Table::deep_clone`] for an independent copy.
/// Equality (`==`) is structural; [`Table::ptr_eq`] checks identity.
#[derive(Clone, Default)]
pub struct Table(Rc<RefCell<BTreeMap<Key, Value>>>);

impl Table {
    /// Creates a new, empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an existing map in a new container.
    pub fn from_map(map: BTreeMap<Key, Value>) -> Self {
        Self(Rc::new(RefCell::new(map)))
    }

    /// Returns `true` if both handles point to the same container.
    pub fn ptr_eq(&self, other: &Table) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Returns the value stored at `key`. Nested tables are returned as
    /// handles to the same container.
    pub fn get(&self, key: &Key) -> Option<Value> {
        self.0.borrow().get(key).cloned()
    }

    /// Returns the nested container at `key`, if the value there is a table.
    pub fn get_table(&self, key: &Key) -> Option<Table> {
        match self.0.borrow().get(key) {
            Some(Value::Table(t)) => Some(t.clone()),
            _ => None,
        }
    }

    /// Stores `value` at `key`, returning the previous value.
    pub fn insert(&self, key: Key, value: Value) -> Option<Value> {
        self.0.borrow_mut().insert(key, value)
    }

    /// Removes the value at `key`, returning it.
    pub fn remove(&self, key: &Key) -> Option<Value> {
        self.0.borrow_mut().remove(key)
    }

    /// Returns `true` if a value is stored at `key`.
    pub fn contains_key(&self, key: &Key) -> bool {
        self.0.borrow().contains_key(key)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    /// Returns `true` if the container has no entries.
    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Removes every entry, keeping the container identity.
    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    /// Snapshot of the keys, in order.
    pub fn keys(&self) -> Vec<Key> {
        self.0.borrow().keys().cloned().collect()
    }

    /// Snapshot of the entries, in order. Nested tables are shared handles.
    pub fn entries(&self) -> Vec<(Key, Value)> {
        self.0
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Fully independent copy of this container and everything under it.
    pub fn deep_clone(&self) -> Self {
        let map = self
            .0
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.deep_clone()))
            .collect();
        Self::from_map(map)
    }

    /// Builds a container from a TOML table.
    pub fn from_toml(table: &toml::Table) -> Self {
        let map = table
            .iter()
            .map(|(k, v)| (Key::Name(k.clone()), Value::from_toml(v)))
            .collect();
        Self::from_map(map)
    }

    /// Converts into a TOML table.
    pub fn to_toml(&self) -> toml::Table {
        self.0
            .borrow()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_toml()))
            .collect()
    }

    /// Converts into a JSON object.
    pub fn to_json(&self) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = self
            .0
            .borrow()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_json()))
            .collect();
        serde_json::Value::Object(map)
    }
}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || *self.0.borrow() == *other.0.borrow()
    }
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.0.borrow().iter()).finish()
    }
}

impl Serialize for Table {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.borrow().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Table {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        BTreeMap::<Key, Value>::deserialize(deserializer).map(Self::from_map)
    }
}

impl FromIterator<(Key, Value)> for Table {
    fn from_iter<I: IntoIterator<Item = (Key, Value)>>(iter: I) -> Self {
        Self::from_map(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_shares_container_deep_clone_does_not() {
        let table = Table::new();
        let alias = table.clone();
        let copy = table.deep_clone();
        alias.insert("a".into(), Value::Integer(1));

        assert!(table.ptr_eq(&alias));
        assert_eq!(table.get(&"a".into()), Some(Value::Integer(1)));
        assert!(!copy.contains_key(&"a".into()));
    }

    #[test]
    fn test_structural_equality_ignores_identity() {
        let a: Table = [(Key::from("x"), Value::from(true))].into_iter().collect();
        let b: Table = [(Key::from("x"), Value::from(true))].into_iter().collect();
        assert!(!a.ptr_eq(&b));
        assert_eq!(a, b);
    }

    #[test]
    fn test_render_path_mixes_names_and_indices() {
        let keys = vec![Key::from("list"), Key::Index(2), Key::from("name")];
        assert_eq!(render_path(&keys), "list[2].name");
    }

    #[test]
    fn test_toml_arrays_become_indexed_tables() {
        let doc: toml::Table = toml::from_str("colors = [\"red\", \"blue\"]").unwrap();
        let table = Table::from_toml(&doc);
        let colors = table.get_table(&"colors".into()).unwrap();
        assert_eq!(colors.get(&Key::Index(2)), Some(Value::from("blue")));
    }
}
