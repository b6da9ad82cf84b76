use serde_json::Value as JsonValue;

use hireflow_core::FieldViolation;

/// Accumulates field violations for one input object.
#[derive(Debug, Default)]
pub(crate) struct Violations(Vec<FieldViolation>);

impl Violations {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn reject(&mut self, field: &str, message: &str, value: impl Into<JsonValue>) {
        self.0.push(FieldViolation::new(field, message, value.into()));
    }

    pub(crate) fn required_text(&mut self, field: &str, value: &str, max_len: usize) {
        if value.trim().is_empty() {
            self.reject(field, "must not be empty", value);
        } else if value.chars().count() > max_len {
            self.reject(field, &format!("must be at most {max_len} characters"), value);
        }
    }

    pub(crate) fn optional_text(&mut self, field: &str, value: Option<&str>, max_len: usize) {
        if let Some(value) = value {
            if value.chars().count() > max_len {
                self.reject(field, &format!("must be at most {max_len} characters"), value);
            }
        }
    }

    pub(crate) fn optional_url(&mut self, field: &str, value: Option<&str>) {
        if let Some(value) = value {
            let scheme_ok = value.starts_with("https://") || value.starts_with("http://");
            if !scheme_ok || value.contains(char::is_whitespace) || value.len() > 2048 {
                self.reject(field, "must be an absolute http(s) URL", value);
            }
        }
    }

    pub(crate) fn finish(self) -> hireflow_core::DomainResult<()> {
        hireflow_core::DomainError::check_fields(self.0)
    }
}
