//! Field-level validation driven by a [`Schema`].
//!
//! Validation is pure: it never touches storage and always yields the same
//! violations for the same input. Violations are accumulated rather than
//! short-circuited, so one response can report every problem at once.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::schema::{FieldKind, FieldSpec, Format, Mode, Schema};

/// Pseudo-field name used for violations about the payload as a whole.
pub const BODY_FIELD: &str = "body";

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("static email pattern"));

/// A single failed field constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    field: String,
    message: String,
}

impl Violation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    /// The offending field, or [`BODY_FIELD`].
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Human-readable description, naming the field.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// An ordered list of violations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Violations(Vec<Violation>);

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, violation: Violation) {
        self.0.push(violation);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Violation> {
        self.0.iter()
    }

    /// Returns true if any violation concerns the given field.
    pub fn mentions(&self, field: &str) -> bool {
        self.0.iter().any(|v| v.field == field)
    }

    /// Messages only, in order.
    pub fn messages(&self) -> Vec<String> {
        self.0.iter().map(|v| v.message.clone()).collect()
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, violation) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{violation}")?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Violations {
    type Item = &'a Violation;
    type IntoIter = std::slice::Iter<'a, Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Checks payloads against a schema.
#[derive(Debug, Clone, Copy)]
pub struct Validator<'a> {
    schema: &'a Schema,
}

impl<'a> Validator<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        Self { schema }
    }

    /// Validate a payload, returning every violation found.
    ///
    /// In [`Mode::Create`] all required fields must be present and
    /// non-blank. In [`Mode::Update`] at least one writable field must be
    /// supplied, and only supplied fields are checked.
    pub fn validate(&self, input: &Value, mode: Mode) -> Violations {
        let mut violations = Violations::new();

        let Some(object) = input.as_object() else {
            violations.push(Violation::new(
                BODY_FIELD,
                "request body must be a JSON object",
            ));
            return violations;
        };

        if mode == Mode::Update && !self.has_writable_field(object) {
            let names: Vec<_> = self.schema.fields().iter().map(FieldSpec::name).collect();
            violations.push(Violation::new(
                BODY_FIELD,
                format!(
                    "at least one of the fields {} must be provided",
                    names.join(", ")
                ),
            ));
            return violations;
        }

        for spec in self.schema.fields() {
            match object.get(spec.name()) {
                None => {
                    if mode == Mode::Create && spec.is_required() && spec.default().is_none() {
                        violations.push(required(spec));
                    }
                }
                Some(Value::Null) => {
                    if spec.is_required() && (mode == Mode::Update || spec.default().is_none()) {
                        violations.push(required(spec));
                    }
                }
                Some(value) => check_value(spec, value, &mut violations),
            }
        }

        violations
    }

    fn has_writable_field(&self, object: &Map<String, Value>) -> bool {
        object.keys().any(|key| self.schema.is_writable(key))
    }
}

fn required(spec: &FieldSpec) -> Violation {
    Violation::new(spec.name(), format!("{} is required", spec.name()))
}

fn check_value(spec: &FieldSpec, value: &Value, violations: &mut Violations) {
    let name = spec.name();

    match spec.kind() {
        FieldKind::Text => {
            let Some(text) = value.as_str() else {
                violations.push(Violation::new(name, format!("{name} must be a string")));
                return;
            };

            let text = text.trim();
            if text.is_empty() {
                if spec.is_required() {
                    violations.push(required(spec));
                }
                return;
            }

            let len = text.chars().count();
            if let Some(min) = spec.min_len_bound()
                && len < min
            {
                violations.push(Violation::new(
                    name,
                    format!("{name} must be at least {min} characters"),
                ));
            }
            if let Some(max) = spec.max_len_bound()
                && len > max
            {
                violations.push(Violation::new(
                    name,
                    format!("{name} must be at most {max} characters"),
                ));
            }

            if spec.format() == Some(Format::Email) && !EMAIL.is_match(text) {
                violations.push(Violation::new(
                    name,
                    format!("{name} must be a valid email address"),
                ));
            }
        }
        FieldKind::Number => {
            let Some(number) = value.as_f64().filter(|n| n.is_finite()) else {
                violations.push(Violation::new(name, format!("{name} must be a number")));
                return;
            };

            if let Some(min) = spec.min_bound()
                && number < min
            {
                violations.push(Violation::new(
                    name,
                    format!("{name} must be greater than or equal to {min}"),
                ));
            }
            if let Some(max) = spec.max_bound()
                && number > max
            {
                violations.push(Violation::new(
                    name,
                    format!("{name} must be less than or equal to {max}"),
                ));
            }
        }
        FieldKind::Boolean => {
            if !value.is_boolean() {
                violations.push(Violation::new(name, format!("{name} must be a boolean")));
            }
        }
    }
}
