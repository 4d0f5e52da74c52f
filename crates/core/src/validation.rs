//! Input schema checks shared by every action.
//!
//! Rules mirror what the admin forms enforce: fields are trimmed first, then
//! checked against length bounds. Errors are collected per field so a caller
//! sees every problem at once.

use serde::Serialize;

/// One rejected field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// All field errors of one input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.push(field, message);
        errors
    }

    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> &[FieldError] {
        &self.0
    }

    /// `Ok(value)` when nothing was collected.
    pub fn finish<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

impl core::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut first = true;
        for e in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", e.field, e.message)?;
            first = false;
        }
        Ok(())
    }
}

/// Trim + length rule for a text field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextRule {
    pub label: &'static str,
    pub min: usize,
    pub max: usize,
}

impl TextRule {
    pub const fn new(label: &'static str, min: usize, max: usize) -> Self {
        Self { label, min, max }
    }

    /// Trim `raw` and check its length (in characters).
    ///
    /// On failure the error is recorded in `errors` under `field` and `None`
    /// is returned.
    pub fn apply(
        &self,
        field: &'static str,
        raw: &str,
        errors: &mut ValidationErrors,
    ) -> Option<String> {
        let value = raw.trim();
        let len = value.chars().count();
        if len < self.min {
            if self.min == 1 {
                errors.push(field, format!("{} is required", self.label));
            } else {
                errors.push(
                    field,
                    format!("{} must be at least {} characters", self.label, self.min),
                );
            }
            return None;
        }
        if len > self.max {
            errors.push(
                field,
                format!("{} must be at most {} characters", self.label, self.max),
            );
            return None;
        }
        Some(value.to_string())
    }
}

/// Minimal structural e-mail check (`local@domain.tld`), after trimming.
///
/// Returns the lower-cased address.
pub fn email(field: &'static str, raw: &str, errors: &mut ValidationErrors) -> Option<String> {
    let value = raw.trim().to_lowercase();
    let valid = match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && domain.contains('.')
                && !domain.contains('@')
                && !value.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        errors.push(field, "Email must be a valid email address");
        return None;
    }
    if value.len() > 255 {
        errors.push(field, "Email must be at most 255 characters");
        return None;
    }
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAME: TextRule = TextRule::new("Name", 2, 64);

    #[test]
    fn text_rule_trims_before_measuring() {
        let mut errors = ValidationErrors::new();
        assert_eq!(NAME.apply("name", "  ab  ", &mut errors).as_deref(), Some("ab"));
        assert!(errors.is_empty());

        assert_eq!(NAME.apply("name", "  a  ", &mut errors), None);
        assert_eq!(errors.fields()[0].message, "Name must be at least 2 characters");
    }

    #[test]
    fn text_rule_rejects_too_long() {
        let mut errors = ValidationErrors::new();
        let long = "x".repeat(65);
        assert_eq!(NAME.apply("name", &long, &mut errors), None);
        assert_eq!(errors.fields()[0].field, "name");
        assert_eq!(errors.fields()[0].message, "Name must be at most 64 characters");
    }

    #[test]
    fn email_is_normalized() {
        let mut errors = ValidationErrors::new();
        assert_eq!(
            email("email", " Alice@Example.COM ", &mut errors).as_deref(),
            Some("alice@example.com")
        );
        assert!(email("email", "invalid-email", &mut errors).is_none());
        assert!(email("email", "a@b", &mut errors).is_none());
        assert_eq!(errors.fields().len(), 2);
    }

    #[test]
    fn finish_reports_all_fields() {
        let mut errors = ValidationErrors::new();
        NAME.apply("name", "", &mut errors);
        email("email", "nope", &mut errors);
        let err = errors.finish(()).unwrap_err();
        assert_eq!(err.fields().len(), 2);
        assert_eq!(err.to_string(), "name: Name must be at least 2 characters; email: Email must be a valid email address");
    }
}
