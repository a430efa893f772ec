//! Declarative entity schemas.
//!
//! A [`Schema`] is the field-constraint table for one entity type: which
//! fields are writable, what kind of value each holds, which are required,
//! and which system timestamps the service maintains. Validation,
//! sanitization and the SQLite column layout are all derived from it.

use serde_json::{Map, Value};

use crate::record::ID_FIELD;

/// The kind of value a field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Number,
    Boolean,
}

/// Additional format constraints on text fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// `local-part@domain.tld`, no whitespace.
    Email,
}

/// Constraints on one writable field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    name: String,
    kind: FieldKind,
    required: bool,
    min_len: Option<usize>,
    max_len: Option<usize>,
    min: Option<f64>,
    max: Option<f64>,
    format: Option<Format>,
    default: Option<Value>,
}

impl FieldSpec {
    fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            min_len: None,
            max_len: None,
            min: None,
            max: None,
            format: None,
            default: None,
        }
    }

    /// A text field. Values are trimmed before storage.
    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Text)
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Number)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Boolean)
    }

    /// Require the field on creation.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Minimum length in characters, after trimming.
    pub fn min_len(mut self, len: usize) -> Self {
        self.min_len = Some(len);
        self
    }

    /// Maximum length in characters, after trimming.
    pub fn max_len(mut self, len: usize) -> Self {
        self.max_len = Some(len);
        self
    }

    /// Inclusive numeric lower bound.
    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    /// Inclusive numeric upper bound.
    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    /// Require an email-shaped value when non-empty.
    pub fn email(mut self) -> Self {
        self.format = Some(Format::Email);
        self
    }

    /// Value stored on creation when the field is omitted.
    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn min_len_bound(&self) -> Option<usize> {
        self.min_len
    }

    pub fn max_len_bound(&self) -> Option<usize> {
        self.max_len
    }

    pub fn min_bound(&self) -> Option<f64> {
        self.min
    }

    pub fn max_bound(&self) -> Option<f64> {
        self.max
    }

    pub fn format(&self) -> Option<Format> {
        self.format
    }

    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }
}

/// Whether a payload describes a new record or a partial update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Create,
    Update,
}

/// The field-constraint table for one entity type.
///
/// # Example
///
/// ```
/// use tabula_core::{FieldSpec, Schema};
///
/// let schema = Schema::new("contatos", "Contact")
///     .field(FieldSpec::text("nome").required())
///     .field(FieldSpec::text("email").email())
///     .created_at("createdAt")
///     .updated_at("updatedAt");
///
/// assert!(schema.is_writable("nome"));
/// assert!(!schema.is_writable("createdAt"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    resource: String,
    label: String,
    fields: Vec<FieldSpec>,
    created_at: Option<String>,
    updated_at: Option<String>,
    read_only: bool,
}

impl Schema {
    /// Create an empty schema for the given resource path segment.
    ///
    /// `label` is the human-readable singular name used in messages.
    pub fn new(resource: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            label: label.into(),
            fields: Vec::new(),
            created_at: None,
            updated_at: None,
            read_only: false,
        }
    }

    /// Add a writable field.
    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    /// Name of the timestamp set once at creation.
    pub fn created_at(mut self, name: impl Into<String>) -> Self {
        self.created_at = Some(name.into());
        self
    }

    /// Name of the timestamp set at creation and refreshed on every update.
    pub fn updated_at(mut self, name: impl Into<String>) -> Self {
        self.updated_at = Some(name.into());
        self
    }

    /// Only expose read operations over HTTP.
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field_spec(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn created_field(&self) -> Option<&str> {
        self.created_at.as_deref()
    }

    pub fn updated_field(&self) -> Option<&str> {
        self.updated_at.as_deref()
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Returns true if clients may set this field.
    pub fn is_writable(&self, name: &str) -> bool {
        name != ID_FIELD && self.field_spec(name).is_some()
    }

    /// Timestamp fields managed by the service, creation first.
    pub fn timestamp_fields(&self) -> impl Iterator<Item = &str> {
        self.created_at
            .as_deref()
            .into_iter()
            .chain(self.updated_at.as_deref())
    }

    /// Reduce a payload to the writable fields, in schema order.
    ///
    /// Text values are trimmed. In create mode, omitted or null fields take
    /// their default when one is declared, and are dropped otherwise. In
    /// update mode only supplied fields are kept; an explicit null is kept
    /// so the caller can clear the field.
    pub fn sanitize(&self, input: &Map<String, Value>, mode: Mode) -> Map<String, Value> {
        let mut out = Map::new();

        for spec in &self.fields {
            match (input.get(spec.name()), mode) {
                (Some(Value::String(s)), _) if spec.kind == FieldKind::Text => {
                    out.insert(spec.name.clone(), Value::String(s.trim().to_string()));
                }
                (Some(Value::Null), Mode::Update) => {
                    out.insert(spec.name.clone(), Value::Null);
                }
                (Some(value), _) if !value.is_null() => {
                    out.insert(spec.name.clone(), value.clone());
                }
                (_, Mode::Create) => {
                    if let Some(default) = &spec.default {
                        out.insert(spec.name.clone(), default.clone());
                    }
                }
                _ => {}
            }
        }

        out
    }
}
