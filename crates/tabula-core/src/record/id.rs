//! Record identifier type.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::{Error, InvalidInputError};

/// An opaque, validated record identifier.
///
/// Ids are assigned once at creation and never change. The only structural
/// requirements are that the id is non-empty and carries no surrounding
/// whitespace, so that it round-trips cleanly through URL path segments.
///
/// # Example
///
/// ```
/// use tabula_core::RecordId;
///
/// let id = RecordId::new("3f2a9c").unwrap();
/// assert_eq!(id.as_str(), "3f2a9c");
/// assert!(RecordId::new("  ").is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(String);

impl RecordId {
    /// Create a new record id, validating the format.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is empty or has leading/trailing whitespace.
    pub fn new(s: impl Into<String>) -> Result<Self, Error> {
        let s = s.into();
        Self::validate(&s)?;
        Ok(Self(s))
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume and return the inner string.
    pub fn into_string(self) -> String {
        self.0
    }

    /// Interpret a JSON value as an id.
    ///
    /// Strings are taken as-is. Non-negative integers are accepted and
    /// normalised to their decimal form so hand-written documents with
    /// numeric ids stay loadable.
    pub fn from_value(value: &Value) -> Result<Self, Error> {
        match value {
            Value::String(s) => Self::new(s.as_str()),
            Value::Number(n) if n.is_u64() || n.is_i64() => Self::new(n.to_string()),
            other => Err(InvalidInputError::RecordId {
                value: other.to_string(),
                reason: "must be a string".to_string(),
            }
            .into()),
        }
    }

    fn validate(s: &str) -> Result<(), Error> {
        if s.is_empty() {
            return Err(InvalidInputError::RecordId {
                value: s.to_string(),
                reason: "cannot be empty".to_string(),
            }
            .into());
        }

        if s.trim() != s {
            return Err(InvalidInputError::RecordId {
                value: s.to_string(),
                reason: "cannot have surrounding whitespace".to_string(),
            }
            .into());
        }

        Ok(())
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RecordId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for RecordId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for RecordId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        RecordId::from_value(&value).map_err(serde::de::Error::custom)
    }
}
