//! The record type.
//!
//! A [`Record`] is a JSON object that is guaranteed to carry a valid `id`.
//! The id is held apart from the other fields so that no field operation
//! can ever change it.

use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use super::RecordId;
use crate::error::{Error, InvalidInputError};

/// Name of the identifier field in serialized records.
pub const ID_FIELD: &str = "id";

/// One entity instance.
///
/// # Example
///
/// ```
/// use tabula_core::{Record, RecordId};
/// use serde_json::json;
///
/// let record = Record::from_value(json!({
///     "id": "c1",
///     "nome": "Ana",
/// })).unwrap();
///
/// assert_eq!(record.id().as_str(), "c1");
/// assert_eq!(record.get("nome").unwrap(), "Ana");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    id: RecordId,
    fields: Map<String, Value>,
}

impl Record {
    /// Create a record from an id and a set of fields.
    ///
    /// Any `id` key inside `fields` is discarded; the explicit id wins.
    pub fn new(id: RecordId, mut fields: Map<String, Value>) -> Self {
        fields.shift_remove(ID_FIELD);
        Self { id, fields }
    }

    /// Create a record from a JSON value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not an object or lacks a valid `id`.
    pub fn from_value(value: Value) -> Result<Self, Error> {
        let Value::Object(mut fields) = value else {
            return Err(InvalidInputError::Record {
                reason: "record must be a JSON object".to_string(),
            }
            .into());
        };

        let id = fields.shift_remove(ID_FIELD).ok_or_else(|| InvalidInputError::Record {
            reason: "record must contain an id field".to_string(),
        })?;

        Ok(Self {
            id: RecordId::from_value(&id)?,
            fields,
        })
    }

    /// Returns the record id.
    pub fn id(&self) -> &RecordId {
        &self.id
    }

    /// Returns the non-id fields.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Get a field value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        if key == ID_FIELD {
            return None;
        }
        self.fields.get(key)
    }

    /// Set a field value. Attempts to set `id` are ignored.
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        if key != ID_FIELD {
            self.fields.insert(key, value);
        }
    }

    /// Remove a field, returning its previous value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.shift_remove(key)
    }

    /// Convert to a JSON object with `id` first.
    pub fn to_value(&self) -> Value {
        let mut object = Map::with_capacity(self.fields.len() + 1);
        object.insert(ID_FIELD.to_string(), Value::String(self.id.to_string()));
        for (key, value) in &self.fields {
            object.insert(key.clone(), value.clone());
        }
        Value::Object(object)
    }
}

impl Serialize for Record {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 1))?;
        map.serialize_entry(ID_FIELD, &self.id)?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Record::from_value(value).map_err(serde::de::Error::custom)
    }
}
