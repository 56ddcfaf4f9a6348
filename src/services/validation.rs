//! Validation pipeline for submitted forms
//!
//! A pipeline is an explicit, ordered list of pure stages. Normalizers rewrite
//! the form in place, checks report field errors. Every stage runs, so the
//! caller gets the complete error list in declaration order.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A single field-level complaint shown next to the form
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

enum Stage<F> {
    Normalize(fn(&mut F)),
    Check(fn(&F) -> Vec<FieldError>),
}

/// Ordered list of normalizers and checks
pub struct ValidationPipeline<F> {
    stages: Vec<Stage<F>>,
}

impl<F> Default for ValidationPipeline<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F> ValidationPipeline<F> {
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    pub fn normalize(mut self, step: fn(&mut F)) -> Self {
        self.stages.push(Stage::Normalize(step));
        self
    }

    pub fn check(mut self, step: fn(&F) -> Vec<FieldError>) -> Self {
        self.stages.push(Stage::Check(step));
        self
    }

    /// Run every stage in order
    pub fn run(&self, mut form: F) -> (F, Vec<FieldError>) {
        let mut errors = Vec::new();
        for stage in &self.stages {
            match stage {
                Stage::Normalize(step) => step(&mut form),
                Stage::Check(step) => errors.extend(step(&form)),
            }
        }
        (form, errors)
    }
}

/// A submitted form with its own pipeline and typed output
pub trait Submitted: Sized {
    type Data;

    fn pipeline() -> ValidationPipeline<Self>;

    /// Typed field set. Only called once the pipeline reported no errors.
    fn to_data(&self) -> Result<Self::Data, Vec<FieldError>>;
}

/// Outcome of running a form through its pipeline
pub enum Checked<F: Submitted> {
    Valid { form: F, data: F::Data },
    Invalid { form: F, errors: Vec<FieldError> },
}

pub fn check<F: Submitted>(form: F) -> Checked<F> {
    let (form, errors) = F::pipeline().run(form);
    if !errors.is_empty() {
        tracing::debug!("Form rejected with {} field error(s)", errors.len());
        return Checked::Invalid { form, errors };
    }
    match form.to_data() {
        Ok(data) => Checked::Valid { form, data },
        Err(errors) => Checked::Invalid { form, errors },
    }
}

/// Field order used when reporting `validator` derive errors
pub trait FormFields {
    const FIELDS: &'static [&'static str];
}

/// Rules declared with `#[validate(...)]`, reported in `FIELDS` order
pub fn declared_rules<F: Validate + FormFields>(form: &F) -> Vec<FieldError> {
    let errors = match form.validate() {
        Ok(()) => return Vec::new(),
        Err(errors) => errors,
    };
    let by_field = errors.field_errors();
    let mut out = Vec::new();
    for field in F::FIELDS {
        if let Some(list) = by_field.get(*field) {
            for error in list.iter() {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", field));
                out.push(FieldError::new(*field, message));
            }
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Relation inputs
// ---------------------------------------------------------------------------

/// Many-valued relation field as it arrives on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RelationInput {
    One(String),
    Many(Vec<String>),
}

/// Total mapping of absent / single / list input onto an ordered set.
/// Order of first appearance is kept and repeats are dropped.
pub fn normalize_relation(input: Option<RelationInput>) -> Vec<String> {
    let values = match input {
        None => Vec::new(),
        Some(RelationInput::One(value)) => vec![value],
        Some(RelationInput::Many(values)) => values,
    };
    let mut set: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        if !set.contains(&value) {
            set.push(value);
        }
    }
    set
}

// ---------------------------------------------------------------------------
// Field helpers
// ---------------------------------------------------------------------------

pub fn trim(value: &mut String) {
    let trimmed = value.trim();
    if trimmed.len() != value.len() {
        *value = trimmed.to_string();
    }
}

/// Trim an optional field; blank counts as absent
pub fn trim_optional(value: &mut Option<String>) {
    if let Some(inner) = value.as_mut() {
        trim(inner);
        if inner.is_empty() {
            *value = None;
        }
    }
}

/// Escape HTML-significant characters in free text, using the entity set of
/// express-validator's `escape` sanitizer
pub fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '/' => out.push_str("&#x2F;"),
            '\\' => out.push_str("&#x5C;"),
            '`' => out.push_str("&#96;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn is_alphanumeric(value: &str) -> bool {
    value.chars().all(char::is_alphanumeric)
}

/// ISO-8601 calendar date, or a timestamp (with or without offset) whose
/// date part is taken
pub fn parse_iso_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
                .into_iter()
                .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
                .map(|dt| dt.date())
        })
}

/// Error for an optional date field that is present but unparsable
pub fn optional_date_error(
    field: &str,
    value: &Option<String>,
    message: &str,
) -> Option<FieldError> {
    match value {
        Some(raw) if parse_iso_date(raw).is_none() => Some(FieldError::new(field, message)),
        _ => None,
    }
}

pub fn parse_record_id(value: &str) -> Option<Uuid> {
    Uuid::parse_str(value.trim()).ok()
}
