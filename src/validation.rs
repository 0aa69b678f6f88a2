//! Field checks applied to student payloads before they reach a repository.
//!
//! Checks run in a fixed order (name, age, email) and the first failure is returned. Uniqueness
//! is not checked here because it needs visibility into stored records.

use crate::student::StudentPayload;
use regex::Regex;
use std::ops::RangeInclusive;
use std::sync::LazyLock;
use thiserror::Error;

/// Accepted age range, inclusive on both ends.
pub const AGE_RANGE: RangeInclusive<i32> = 1..=150;

const EMAIL_PATTERN: &str = r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9](?:[A-Za-z0-9\-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9\-]*[A-Za-z0-9])?)*\.[A-Za-z]{2,}$";

// Compiled on first use. The pattern is a constant covered by `email_pattern_compiles`.
static EMAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(EMAIL_PATTERN).expect("email pattern compiles"));

/// Reasons a student payload can be rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Name was empty or whitespace only.
    #[error("name is required")]
    MissingName,
    /// Age fell outside [`AGE_RANGE`].
    #[error("age must be between 1 and 150, got {0}")]
    AgeOutOfRange(i32),
    /// Email was empty.
    #[error("email is required")]
    MissingEmail,
    /// Email did not look like an address.
    #[error("email '{0}' is not a valid address")]
    InvalidEmail(String),
}

/// Validate a payload, returning the first failing constraint.
///
/// Never panics: the only fallible step is compiling the constant email pattern, which is
/// checked by this module's tests.
pub fn validate(payload: &StudentPayload) -> Result<(), ValidationError> {
    if payload.name.trim().is_empty() {
        return Err(ValidationError::MissingName);
    }
    if !AGE_RANGE.contains(&payload.age) {
        return Err(ValidationError::AgeOutOfRange(payload.age));
    }
    if payload.email.trim().is_empty() {
        return Err(ValidationError::MissingEmail);
    }
    if !is_valid_email(&payload.email) {
        return Err(ValidationError::InvalidEmail(payload.email.clone()));
    }
    Ok(())
}

fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(name: &str, age: i32, email: &str) -> StudentPayload {
        StudentPayload::new(name, age, email)
    }

    #[test]
    fn email_pattern_compiles() {
        assert!(Regex::new(EMAIL_PATTERN).is_ok());
        assert!(EMAIL_REGEX.is_match("john@example.com"));
    }

    #[test]
    fn accepts_well_formed_student() {
        assert_eq!(validate(&payload("John Doe", 20, "john@example.com")), Ok(()));
        assert_eq!(validate(&payload("A", 1, "a.b+c@mail.example.org")), Ok(()));
        assert_eq!(validate(&payload("Old", 150, "old@example.io")), Ok(()));
    }

    #[test]
    fn rejects_empty_name() {
        assert_eq!(
            validate(&payload("", 20, "john@example.com")),
            Err(ValidationError::MissingName)
        );
        assert_eq!(
            validate(&payload("   ", 20, "john@example.com")),
            Err(ValidationError::MissingName)
        );
    }

    #[test]
    fn rejects_age_outside_bounds() {
        assert_eq!(
            validate(&payload("John", 0, "john@example.com")),
            Err(ValidationError::AgeOutOfRange(0))
        );
        assert_eq!(
            validate(&payload("John", 151, "john@example.com")),
            Err(ValidationError::AgeOutOfRange(151))
        );
        assert_eq!(
            validate(&payload("John", -3, "john@example.com")),
            Err(ValidationError::AgeOutOfRange(-3))
        );
    }

    #[test]
    fn rejects_missing_or_malformed_email() {
        assert_eq!(
            validate(&payload("John", 20, "")),
            Err(ValidationError::MissingEmail)
        );
        for bad in ["not-an-email", "john@", "@example.com", "john@example", "jo hn@example.com"] {
            assert!(
                matches!(
                    validate(&payload("John", 20, bad)),
                    Err(ValidationError::InvalidEmail(_))
                ),
                "expected {bad} to be rejected"
            );
        }
    }

    #[test]
    fn reports_first_failure_in_order() {
        assert_eq!(
            validate(&payload("", 0, "")),
            Err(ValidationError::MissingName)
        );
        assert_eq!(
            validate(&payload("John", 0, "")),
            Err(ValidationError::AgeOutOfRange(0))
        );
    }
}
