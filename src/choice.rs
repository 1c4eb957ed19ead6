//! Host-supplied lookup tables.
//!
//! Everything here is read-only for the life of the page session.

use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

use crate::error::{FormworkError, FormworkResult};

/// Ordered `(key, label)` choices for a dependent select
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChoiceTable {
    entries: Vec<(String, String)>,
}

impl ChoiceTable {
    pub fn new<K: Into<String>, L: Into<String>>(entries: impl IntoIterator<Item = (K, L)>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, l)| (k.into(), l.into()))
                .collect(),
        }
    }

    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl<'de> Deserialize<'de> for ChoiceTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TableVisitor;

        impl<'de> Visitor<'de> for TableVisitor {
            type Value = ChoiceTable;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object of key to label, or an array of [key, label] pairs")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<ChoiceTable, A::Error> {
                let mut entries = Vec::new();
                while let Some((key, label)) = map.next_entry::<String, Value>()? {
                    let key = if key == "null" { String::new() } else { key };
                    entries.push((key, scalar_to_string(&label)));
                }
                Ok(ChoiceTable { entries })
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<ChoiceTable, A::Error> {
                let mut entries = Vec::new();
                while let Some((key, label)) = seq.next_element::<(Value, Value)>()? {
                    entries.push((scalar_to_string(&key), scalar_to_string(&label)));
                }
                Ok(ChoiceTable { entries })
            }
        }

        deserializer.deserialize_any(TableVisitor)
    }
}

fn stringly<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::String(_) | Value::Number(_) | Value::Null => Ok(scalar_to_string(&value)),
        other => Err(de::Error::custom(format!("expected a number or string, got {}", other))),
    }
}

/// Physical dimensions pre-filled from a package type
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PackageDimensions {
    #[serde(deserialize_with = "stringly")]
    pub length: String,
    #[serde(deserialize_with = "stringly")]
    pub width: String,
    #[serde(deserialize_with = "stringly")]
    pub height: String,
    #[serde(deserialize_with = "stringly")]
    pub weight: String,
}

impl PackageDimensions {
    /// Value for a sibling field name, if this tuple carries one
    pub fn get(&self, field: &str) -> Option<&str> {
        match field {
            "length" => Some(&self.length),
            "width" => Some(&self.width),
            "height" => Some(&self.height),
            "weight" => Some(&self.weight),
            _ => None,
        }
    }
}

/// Driver value to unit label, parsed from inline JSON
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelLookup {
    labels: HashMap<String, String>,
}

impl LabelLookup {
    pub fn parse(attribute: &str, raw: &str) -> FormworkResult<Self> {
        let parsed: HashMap<String, Value> =
            serde_json::from_str(raw).map_err(|e| FormworkError::MalformedLookup {
                attribute: attribute.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            labels: parsed
                .into_iter()
                .map(|(k, v)| (k, scalar_to_string(&v)))
                .collect(),
        })
    }

    pub fn label(&self, value: &str) -> Option<&str> {
        self.labels.get(value).map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for LabelLookup {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            labels: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// Named tables handed over by the host page
#[derive(Debug, Clone, Default)]
pub struct ChoiceStore {
    choices: HashMap<String, ChoiceTable>,
    dimensions: HashMap<String, HashMap<String, PackageDimensions>>,
}

impl ChoiceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_choices(mut self, name: &str, table: ChoiceTable) -> Self {
        self.choices.insert(name.to_string(), table);
        self
    }

    pub fn with_dimensions(mut self, name: &str, table: HashMap<String, PackageDimensions>) -> Self {
        self.dimensions.insert(name.to_string(), table);
        self
    }

    /// Builds a store from the host's globals object.
    ///
    /// Members that decode as dimension tables become dimension tables;
    /// members that decode as choice tables become choice tables. Anything
    /// else is ignored.
    pub fn from_globals(globals: &Value) -> Self {
        let mut store = Self::new();
        let Some(members) = globals.as_object() else {
            return store;
        };
        for (name, value) in members {
            if let Ok(dims) = serde_json::from_value::<HashMap<String, PackageDimensions>>(value.clone()) {
                if !dims.is_empty() {
                    store.dimensions.insert(name.clone(), dims);
                    continue;
                }
            }
            match serde_json::from_value::<ChoiceTable>(value.clone()) {
                Ok(table) => {
                    store.choices.insert(name.clone(), table);
                }
                Err(e) => tracing::debug!("Ignoring host global '{}': {}", name, e),
            }
        }
        store
    }

    pub fn choices(&self, name: &str) -> FormworkResult<&ChoiceTable> {
        self.choices
            .get(name)
            .ok_or_else(|| FormworkError::UnknownTable(name.to_string()))
    }

    pub fn dimensions(&self, name: &str) -> FormworkResult<&HashMap<String, PackageDimensions>> {
        self.dimensions
            .get(name)
            .ok_or_else(|| FormworkError::UnknownTable(name.to_string()))
    }
}
