//! Ordered record collections.

use std::collections::HashSet;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::{Record, RecordId};

/// The full, ordered set of records for one entity type.
///
/// Order is insertion order. No two records share an id; this is enforced
/// on deserialization and on [`push`](RecordCollection::push).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordCollection {
    records: Vec<Record>,
}

impl RecordCollection {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a collection from records, rejecting duplicate ids.
    ///
    /// Returns the first duplicated id on failure.
    pub fn from_records(records: Vec<Record>) -> Result<Self, RecordId> {
        let mut seen = HashSet::with_capacity(records.len());
        for record in &records {
            if !seen.insert(record.id()) {
                return Err(record.id().clone());
            }
        }
        Ok(Self { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    /// Find a record by id.
    pub fn get(&self, id: &RecordId) -> Option<&Record> {
        self.records.iter().find(|r| r.id() == id)
    }

    /// Position of the record with the given id.
    pub fn position(&self, id: &RecordId) -> Option<usize> {
        self.records.iter().position(|r| r.id() == id)
    }

    /// Append a record. Returns it back if its id is already taken.
    pub fn push(&mut self, record: Record) -> Result<(), Record> {
        if self.position(record.id()).is_some() {
            return Err(record);
        }
        self.records.push(record);
        Ok(())
    }

    /// Replace the record with the same id, returning the previous one.
    /// Returns the new record back if no such id exists.
    pub fn replace(&mut self, record: Record) -> Result<Record, Record> {
        match self.position(record.id()) {
            Some(index) => Ok(std::mem::replace(&mut self.records[index], record)),
            None => Err(record),
        }
    }

    /// Remove and return the record with the given id.
    pub fn remove(&mut self, id: &RecordId) -> Option<Record> {
        self.position(id).map(|index| self.records.remove(index))
    }

    pub fn into_vec(self) -> Vec<Record> {
        self.records
    }
}

impl IntoIterator for RecordCollection {
    type Item = Record;
    type IntoIter = std::vec::IntoIter<Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a RecordCollection {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl Serialize for RecordCollection {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.records.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RecordCollection {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let records = Vec::<Record>::deserialize(deserializer)?;
        RecordCollection::from_records(records)
            .map_err(|id| serde::de::Error::custom(format!("duplicate record id '{id}'")))
    }
}
