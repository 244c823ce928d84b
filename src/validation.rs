//! Request validation rule sets.
//!
//! A [`RuleSet`] maps field names (dot-paths for nested objects, e.g.
//! `customer.address.zip`) to per-field constraints. Running a rule set over
//! a JSON body produces a [`ValidatedRequest`] that either carries the data
//! or a structured list of field errors — validation never throws into the
//! dispatcher; the action decides what a failure means.

use crate::server::response::Response;
use serde::Serialize;
use serde_json::Value;

/// Declared type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Int,
    Number,
    Bool,
    Array,
    Object,
}

impl FieldType {
    fn name(self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Int => "int",
            FieldType::Number => "number",
            FieldType::Bool => "bool",
            FieldType::Array => "array",
            FieldType::Object => "object",
        }
    }

    fn matches(self, value: &Value) -> bool {
        match self {
            FieldType::String => value.is_string(),
            FieldType::Int => value.is_i64() || value.is_u64(),
            FieldType::Number => value.is_number(),
            FieldType::Bool => value.is_boolean(),
            FieldType::Array => value.is_array(),
            FieldType::Object => value.is_object(),
        }
    }
}

/// Constraints for a single field.
///
/// `min`/`max` bound numeric values numerically and strings/arrays by length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldRules {
    pub required: bool,
    pub type_of: Option<FieldType>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub equals: Option<Value>,
    pub one_of: Option<Vec<Value>>,
}

impl FieldRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn of_type(mut self, ty: FieldType) -> Self {
        self.type_of = Some(ty);
        self
    }

    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    pub fn equals(mut self, value: impl Into<Value>) -> Self {
        self.equals = Some(value.into());
        self
    }

    pub fn one_of(mut self, values: Vec<Value>) -> Self {
        self.one_of = Some(values);
        self
    }
}

/// Ordered map of field path → rules. Order only affects error ordering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSet {
    fields: Vec<(String, FieldRules)>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, path: impl Into<String>, rules: FieldRules) -> Self {
        self.fields.push((path.into(), rules));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, FieldRules)> {
        self.fields.iter()
    }
}

/// A single violated constraint.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FieldError {
    pub field: String,
    pub rule: String,
    pub message: String,
}

/// Result of running a [`RuleSet`] over a request body.
///
/// Always constructed, valid or not; inspect [`ValidatedRequest::is_valid`]
/// or use [`ValidatedRequest::check`] to short-circuit with a 422 envelope.
#[derive(Debug, Clone)]
pub struct ValidatedRequest {
    data: Value,
    errors: Vec<FieldError>,
}

impl ValidatedRequest {
    /// Run `rules` over `body`. A missing body validates as an empty object,
    /// so `required` rules report instead of panicking.
    pub fn validate(rules: &RuleSet, body: Option<&Value>) -> Self {
        let data = body.cloned().unwrap_or_else(|| Value::Object(Default::default()));
        let mut errors = Vec::new();

        for (path, field_rules) in rules.iter() {
            match lookup(&data, path) {
                None | Some(Value::Null) => {
                    if field_rules.required {
                        errors.push(FieldError {
                            field: path.clone(),
                            rule: "required".to_string(),
                            message: format!("field `{path}` is required"),
                        });
                    }
                }
                Some(value) => {
                    check_field(path, field_rules, value, &mut errors);
                }
            }
        }

        Self { data, errors }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    /// Fetch a field from the validated data by dot-path.
    pub fn get(&self, path: &str) -> Option<&Value> {
        lookup(&self.data, path)
    }

    /// Convenience short-circuit: `Some(422 envelope)` when invalid.
    pub fn check(&self) -> Option<Response> {
        if self.is_valid() {
            None
        } else {
            let errors = serde_json::to_value(&self.errors).unwrap_or(Value::Null);
            Some(Response::envelope_error(422, errors))
        }
    }
}

fn check_field(path: &str, rules: &FieldRules, value: &Value, errors: &mut Vec<FieldError>) {
    if let Some(ty) = rules.type_of {
        if !ty.matches(value) {
            errors.push(FieldError {
                field: path.to_string(),
                rule: "type".to_string(),
                message: format!("field `{path}` must be of type {}", ty.name()),
            });
            // Size/equality checks against a mistyped value only produce noise.
            return;
        }
    }

    if let Some(size) = measure(value) {
        if let Some(min) = rules.min {
            if size < min {
                errors.push(FieldError {
                    field: path.to_string(),
                    rule: "min".to_string(),
                    message: format!("field `{path}` is below the minimum of {min}"),
                });
            }
        }
        if let Some(max) = rules.max {
            if size > max {
                errors.push(FieldError {
                    field: path.to_string(),
                    rule: "max".to_string(),
                    message: format!("field `{path}` exceeds the maximum of {max}"),
                });
            }
        }
    }

    if let Some(expected) = &rules.equals {
        if value != expected {
            errors.push(FieldError {
                field: path.to_string(),
                rule: "equals".to_string(),
                message: format!("field `{path}` does not match the expected value"),
            });
        }
    }

    if let Some(allowed) = &rules.one_of {
        if !allowed.contains(value) {
            errors.push(FieldError {
                field: path.to_string(),
                rule: "enum".to_string(),
                message: format!("field `{path}` is not one of the allowed values"),
            });
        }
    }
}

/// Magnitude used by `min`/`max`: numeric value for numbers, length for
/// strings and arrays; objects and booleans have no magnitude.
fn measure(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => Some(s.chars().count() as f64),
        Value::Array(a) => Some(a.len() as f64),
        _ => None,
    }
}

/// Walk a dot-path through nested objects.
fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}
