use std::{collections::HashMap, fmt};

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::http::multipart::FileItem;

/// Snapshot of the parameters in first-insertion order of names.
pub type ParameterMap = Vec<(String, Vec<String>)>;

/// A single parameter value: decoded text or an uploaded file.
#[derive(Debug, Clone)]
pub enum ParamValue {
    Text(String),
    File(FileItem),
}

impl ParamValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ParamValue::Text(s) => Some(s),
            ParamValue::File(_) => None,
        }
    }

    pub fn as_file(&self) -> Option<&FileItem> {
        match self {
            ParamValue::File(f) => Some(f),
            ParamValue::Text(_) => None,
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self, ParamValue::File(_))
    }
}

/// Text renders as itself, a file as its original file name.
impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Text(s) => f.write_str(s),
            ParamValue::File(item) => fmt::Display::fmt(item, f),
        }
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        ParamValue::Text(s)
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Text(s.to_string())
    }
}

impl From<FileItem> for ParamValue {
    fn from(item: FileItem) -> Self {
        ParamValue::File(item)
    }
}

/// Append-only multi-valued map that keeps keys in first-insertion order and
/// values per key in insertion order.
#[derive(Debug, Clone, Default)]
pub struct MultiMap {
    entries: Vec<(String, Vec<ParamValue>)>,
    index: HashMap<String, usize>,
}

impl MultiMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        let key = key.into();
        let value = value.into();
        match self.index.get(&key) {
            Some(&pos) => self.entries[pos].1.push(value),
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, vec![value]));
            }
        }
    }

    /// First value added under `key`.
    pub fn value(&self, key: &str) -> Option<&ParamValue> {
        self.values(key).first()
    }

    /// All values under `key`; empty when the key is absent.
    pub fn values(&self, key: &str) -> &[ParamValue] {
        self.index
            .get(key)
            .map(|&pos| self.entries[pos].1.as_slice())
            .unwrap_or(&[])
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[ParamValue])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every value rendered as a string, keys in insertion order.
    pub fn as_map(&self) -> ParameterMap {
        self.entries
            .iter()
            .map(|(k, vs)| (k.clone(), vs.iter().map(ToString::to_string).collect()))
            .collect()
    }
}

impl Serialize for MultiMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, values) in &self.entries {
            let rendered: Vec<String> = values.iter().map(ToString::to_string).collect();
            map.serialize_entry(key, &rendered)?;
        }
        map.end()
    }
}
