//! Mapping between schema fields, table columns and JSON values.

use rusqlite::types::{Value as SqlValue, ValueRef};
use serde_json::{Number, Value};

use tabula_core::{FieldKind, Schema};

/// What a column stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ColumnKind {
    Field(FieldKind),
    Timestamp,
}

/// One data column of an entity table.
#[derive(Debug, Clone)]
pub(crate) struct Column {
    pub name: String,
    pub kind: ColumnKind,
    pub not_null: bool,
}

impl Column {
    pub fn sql_type(&self) -> &'static str {
        match self.kind {
            ColumnKind::Field(FieldKind::Text) | ColumnKind::Timestamp => "TEXT",
            ColumnKind::Field(FieldKind::Number) => "REAL",
            ColumnKind::Field(FieldKind::Boolean) => "INTEGER",
        }
    }

    /// Column definition for `CREATE TABLE`.
    pub fn definition(&self) -> String {
        let mut def = format!("{} {}", quote(&self.name), self.sql_type());
        if self.not_null {
            def.push_str(" NOT NULL");
        }
        def
    }

    /// Convert a JSON field value to a bindable SQL value.
    pub fn to_sql(&self, value: Option<&Value>) -> SqlValue {
        match value {
            None | Some(Value::Null) => SqlValue::Null,
            Some(Value::Bool(b)) => SqlValue::Integer(i64::from(*b)),
            Some(Value::Number(n)) => match n.as_i64() {
                Some(i) if self.kind != ColumnKind::Field(FieldKind::Number) => {
                    SqlValue::Integer(i)
                }
                _ => SqlValue::Real(n.as_f64().unwrap_or_default()),
            },
            Some(Value::String(s)) => SqlValue::Text(s.clone()),
            Some(other) => SqlValue::Text(other.to_string()),
        }
    }

    /// Convert a stored SQL value back to JSON. NULL maps to `None`.
    pub fn from_sql(&self, value: ValueRef<'_>) -> Option<Value> {
        match value {
            ValueRef::Null => None,
            ValueRef::Integer(i) => match self.kind {
                ColumnKind::Field(FieldKind::Boolean) => Some(Value::Bool(i != 0)),
                _ => Some(Value::Number(i.into())),
            },
            ValueRef::Real(f) => Some(Number::from_f64(f).map_or(Value::Null, Value::Number)),
            ValueRef::Text(bytes) => Some(Value::String(String::from_utf8_lossy(bytes).into_owned())),
            ValueRef::Blob(_) => None,
        }
    }
}

/// Data columns for a schema: writable fields in order, then timestamps.
pub(crate) fn columns(schema: &Schema) -> Vec<Column> {
    let fields = schema.fields().iter().map(|spec| Column {
        name: spec.name().to_string(),
        kind: ColumnKind::Field(spec.kind()),
        not_null: spec.is_required(),
    });

    let timestamps = schema.timestamp_fields().map(|name| Column {
        name: name.to_string(),
        kind: ColumnKind::Timestamp,
        not_null: false,
    });

    fields.chain(timestamps).collect()
}

/// Quote an identifier for use in SQL.
pub(crate) fn quote(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
