//! Order-preserving `Name -> Value` mapping.

use crate::objects::primitive::{Name, Value};
use indexmap::IndexMap;

/// A PDF dictionary. Insertion order is preserved so that output is
/// deterministic; a duplicate key overwrites the earlier value in place
/// (last wins on read, single emitted on write).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dictionary {
    entries: IndexMap<Name, Value>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    pub fn set(&mut self, key: impl Into<Name>, value: impl Into<Value>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(&Name::new(key))
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.entries.get_mut(&Name::new(key))
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.shift_remove(&Name::new(key))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(&Name::new(key))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Name, &Value)> {
        self.entries.iter()
    }

    pub fn get_name(&self, key: &str) -> Option<&Name> {
        self.get(key).and_then(Value::as_name)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_i64)
    }

    pub fn get_dict(&self, key: &str) -> Option<&Dictionary> {
        self.get(key).and_then(Value::as_dict)
    }

    pub fn get_array(&self, key: &str) -> Option<&[Value]> {
        self.get(key).and_then(Value::as_array)
    }

    pub fn is_type(&self, expected: &str) -> bool {
        self.get_name("Type").map(|n| n.body() == expected).unwrap_or(false)
    }
}

impl FromIterator<(Name, Value)> for Dictionary {
    fn from_iter<T: IntoIterator<Item = (Name, Value)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
