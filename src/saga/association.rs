use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

// ============================================================================
// Association Values - Saga Correlation Keys
// ============================================================================
//
// An association value is a (key, value) business-key pair linking incoming
// events to the saga instances that should receive them.
//
// ============================================================================

/// Immutable correlation key pair. Equality is structural on both fields.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct AssociationValue {
    key: String,
    value: String,
}

impl AssociationValue {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Unordered set of association values. Duplicates by (key, value) collapse;
/// distinct values for the same key may coexist.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct AssociationValues {
    values: HashSet<AssociationValue>,
}

impl AssociationValues {
    pub fn new(values: impl IntoIterator<Item = AssociationValue>) -> Self {
        Self {
            values: values.into_iter().collect(),
        }
    }

    pub fn add(&mut self, value: AssociationValue) {
        self.values.insert(value);
    }

    pub fn contains(&self, value: &AssociationValue) -> bool {
        self.values.contains(value)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AssociationValue> {
        self.values.iter()
    }
}

impl<'a> IntoIterator for &'a AssociationValues {
    type Item = &'a AssociationValue;
    type IntoIter = std::collections::hash_set::Iter<'a, AssociationValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

/// Flattened `{key: value}` record stored as the saga's association index.
///
/// Lossy when two association values share a key (last write wins); sagas
/// should avoid duplicate keys in their association values.
pub type AssociationValueDescriptor = HashMap<String, String>;

pub fn descriptor_from_values(values: &AssociationValues) -> AssociationValueDescriptor {
    values
        .iter()
        .map(|v| (v.key().to_string(), v.value().to_string()))
        .collect()
}

pub fn descriptor_from_value(value: &AssociationValue) -> AssociationValueDescriptor {
    let mut descriptor = AssociationValueDescriptor::new();
    descriptor.insert(value.key().to_string(), value.value().to_string());
    descriptor
}
