//! Field-level payload validation.
//!
//! Incoming payloads deserialize into structs whose fields are all optional, so a
//! missing field becomes a field error instead of a rejected body. Each payload's
//! `validate` threads its raw fields through a [`FieldErrors`] collector, which
//! records every problem at once and hands back the checked value when the field
//! is fine.

use crate::errors::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;
use std::{collections::BTreeMap, fmt, str::FromStr};

/// Longest value accepted by a text column.
pub const MAX_TEXT_LENGTH: usize = 255;

/// Money columns hold at most ten digits, two of them after the point.
pub const MONEY_DECIMAL_PLACES: u32 = 2;
const MONEY_MAX_DIGITS: u32 = 10;

/// Message for a field that is absent or null.
pub const REQUIRED: &str = "This field is required.";
/// Message for a text field that is empty or only whitespace.
pub const BLANK: &str = "This field may not be blank.";

static EMAIL_RE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").ok());
static URL_RE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^https?://[^\s/$.?#][^\s]*$").ok());

/// Validation messages keyed by field name, rendered as `{"field": ["msg"]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    /// An empty set of errors.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `message` against `field`.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// True when no field has an error.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Messages recorded for `field`, if any.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// True when `field` has at least one error.
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// `Ok(())` when nothing was recorded, the collected errors otherwise.
    pub fn finish(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation { errors: self })
        }
    }

    /// Requires a value to be present.
    pub fn required<T>(&mut self, field: &str, value: Option<T>) -> Option<T> {
        if value.is_none() {
            self.add(field, REQUIRED);
        }
        value
    }

    /// Requires non-blank text no longer than [`MAX_TEXT_LENGTH`]; returns it trimmed.
    pub fn text(&mut self, field: &str, value: Option<String>) -> Option<String> {
        let value = self.required(field, value)?;
        let trimmed = value.trim();
        if trimmed.is_empty() {
            self.add(field, BLANK);
            return None;
        }
        if trimmed.chars().count() > MAX_TEXT_LENGTH {
            self.add(
                field,
                format!("Ensure this field has no more than {MAX_TEXT_LENGTH} characters."),
            );
            return None;
        }
        Some(trimmed.to_string())
    }

    /// Requires a syntactically valid email address.
    pub fn email(&mut self, field: &str, value: Option<String>) -> Option<String> {
        let value = self.text(field, value)?;
        if EMAIL_RE.as_ref().is_some_and(|re| re.is_match(&value)) {
            Some(value)
        } else {
            self.add(field, "Enter a valid email address.");
            None
        }
    }

    /// Requires an absolute http(s) URL.
    pub fn url(&mut self, field: &str, value: Option<String>) -> Option<String> {
        let value = self.text(field, value)?;
        if URL_RE.as_ref().is_some_and(|re| re.is_match(&value)) {
            Some(value)
        } else {
            self.add(field, "Enter a valid URL.");
            None
        }
    }

    /// Requires a non-negative amount that fits a `DECIMAL(10, 2)` column.
    pub fn money(&mut self, field: &str, value: Option<Decimal>) -> Option<Decimal> {
        let value = self.required(field, value)?;
        self.check_money(field, value)
    }

    /// Like [`FieldErrors::money`] but the field may be omitted.
    pub fn optional_money(&mut self, field: &str, value: Option<Decimal>) -> Option<Decimal> {
        value.and_then(|v| self.check_money(field, v))
    }

    fn check_money(&mut self, field: &str, value: Decimal) -> Option<Decimal> {
        if value.is_sign_negative() && !value.is_zero() {
            self.add(field, "Ensure this value is greater than or equal to 0.");
            return None;
        }
        let normalized = value.normalize();
        if normalized.scale() > MONEY_DECIMAL_PLACES {
            self.add(
                field,
                format!(
                    "Ensure that there are no more than {MONEY_DECIMAL_PLACES} decimal places."
                ),
            );
            return None;
        }
        let limit = Decimal::from(10_i64.pow(MONEY_MAX_DIGITS - MONEY_DECIMAL_PLACES));
        if normalized >= limit {
            self.add(
                field,
                format!("Ensure that there are no more than {MONEY_MAX_DIGITS} digits in total."),
            );
            return None;
        }
        Some(normalized.round_dp(MONEY_DECIMAL_PLACES))
    }

    /// Requires a value from an enumerated set of choices.
    pub fn choice<E: FromStr>(&mut self, field: &str, value: Option<String>) -> Option<E> {
        let value = self.required(field, value)?;
        match value.trim().parse() {
            Ok(parsed) => Some(parsed),
            Err(_) => {
                self.add(field, format!("\"{value}\" is not a valid choice."));
                None
            }
        }
    }

    /// Requires a non-negative integer.
    pub fn non_negative(&mut self, field: &str, value: Option<i64>) -> Option<i64> {
        let value = self.required(field, value)?;
        if value < 0 {
            self.add(field, "Ensure this value is greater than or equal to 0.");
            return None;
        }
        Some(value)
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(field, messages)| format!("{field}: {}", messages.join(" ")))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// Message used when a payload references a record that does not exist.
#[must_use]
pub fn missing_reference(id: i64) -> String {
    format!("Invalid pk \"{id}\" - object does not exist.")
}

/// Error returned when an enum string is outside its declared set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownChoice(pub String);

impl fmt::Display for UnknownChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown choice {:?}", self.0)
    }
}

impl std::error::Error for UnknownChoice {}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_required_records_missing_field() {
        let mut errors = FieldErrors::new();
        let value: Option<String> = errors.required("title", None);
        assert!(value.is_none());
        assert_eq!(errors.get("title").unwrap(), [REQUIRED.to_string()]);
        assert!(errors.finish().is_err());
    }

    #[test]
    fn test_text_trims_and_rejects_blank() {
        let mut errors = FieldErrors::new();
        assert_eq!(
            errors.text("title", Some("  Lunch  ".to_string())),
            Some("Lunch".to_string())
        );
        assert!(errors.is_empty());

        assert!(errors.text("title", Some("   ".to_string())).is_none());
        assert_eq!(errors.get("title").unwrap(), [BLANK.to_string()]);
    }

    #[test]
    fn test_text_rejects_overlong_values() {
        let mut errors = FieldErrors::new();
        let long = "x".repeat(MAX_TEXT_LENGTH + 1);
        assert!(errors.text("title", Some(long)).is_none());
        assert!(errors.contains("title"));
    }

    #[test]
    fn test_money_bounds() {
        let mut errors = FieldErrors::new();
        assert_eq!(
            errors.money("price", Some(Decimal::new(1250, 2))),
            Some(Decimal::new(1250, 2))
        );
        assert_eq!(errors.money("zero", Some(Decimal::ZERO)), Some(Decimal::ZERO));
        assert!(errors.is_empty());

        assert!(errors.money("negative", Some(Decimal::new(-1, 0))).is_none());
        assert!(errors.money("precise", Some(Decimal::new(1, 3))).is_none());
        assert!(errors.money("huge", Some(Decimal::new(100_000_000, 0))).is_none());
        assert!(errors.contains("negative"));
        assert!(errors.contains("precise"));
        assert!(errors.contains("huge"));
    }

    #[test]
    fn test_money_accepts_trailing_zeros_beyond_two_places() {
        let mut errors = FieldErrors::new();
        // 1.500 normalizes to 1.5
        assert_eq!(
            errors.money("price", Some(Decimal::new(1500, 3))),
            Some(Decimal::new(15, 1))
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn test_email_and_url() {
        let mut errors = FieldErrors::new();
        assert!(errors.email("email", Some("a@b.com".to_string())).is_some());
        assert!(errors
            .url("document_url", Some("https://files.example.com/a.pdf".to_string()))
            .is_some());
        assert!(errors.is_empty());

        assert!(errors.email("email", Some("not-an-email".to_string())).is_none());
        assert!(errors.url("document_url", Some("ftp:/nope".to_string())).is_none());
        assert_eq!(
            errors.get("email").unwrap(),
            ["Enter a valid email address.".to_string()]
        );
        assert!(errors.contains("document_url"));
    }

    #[test]
    fn test_display_joins_fields() {
        let mut errors = FieldErrors::new();
        errors.add("a", "first");
        errors.add("b", "second");
        assert_eq!(errors.to_string(), "a: first; b: second");
    }
}
