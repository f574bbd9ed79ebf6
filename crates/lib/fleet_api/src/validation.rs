//! Request validation helpers.
//!
//! Validation runs at the boundary, before any store access; violations are
//! reported per field in the response envelope.

use crate::response::FieldError;

/// Minimum password length accepted anywhere a password is set.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Record an error if `value` is not a plausible email address.
pub fn require_email(errors: &mut Vec<FieldError>, field: &str, value: &str) {
    if !is_valid_email(value) {
        push(errors, field, "must be a valid email address");
    }
}

/// Record an error if `value` is shorter than `min` characters.
pub fn require_min_len(errors: &mut Vec<FieldError>, field: &str, value: &str, min: usize) {
    if value.chars().count() < min {
        push(errors, field, &format!("must be at least {min} characters"));
    }
}

/// Record an error if `value` is empty or whitespace.
pub fn require_non_empty(errors: &mut Vec<FieldError>, field: &str, value: &str) {
    if value.trim().is_empty() {
        push(errors, field, "is required");
    }
}

fn push(errors: &mut Vec<FieldError>, field: &str, message: &str) {
    errors.push(FieldError {
        field: field.to_string(),
        message: message.to_string(),
    });
}

/// Cheap structural email check: one `@`, non-empty local part, a dot in the
/// domain, no whitespace. Deliverability is not this layer's problem.
pub fn is_valid_email(value: &str) -> bool {
    if value.is_empty() || value.chars().any(char::is_whitespace) {
        return false;
    }
    let mut parts = value.splitn(2, '@');
    let local = parts.next().unwrap_or("");
    let domain = parts.next().unwrap_or("");
    if local.is_empty() || domain.is_empty() {
        return false;
    }
    domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_addresses() {
        assert!(is_valid_email("alice@example.com"));
        assert!(is_valid_email("a.b+tag@sub.example.co"));
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("alice"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("alice@"));
        assert!(!is_valid_email("alice@example"));
        assert!(!is_valid_email("alice@.com"));
        assert!(!is_valid_email("al ice@example.com"));
    }

    #[test]
    fn min_len_counts_chars_not_bytes() {
        let mut errors = Vec::new();
        require_min_len(&mut errors, "password", "pässwörd", MIN_PASSWORD_LEN);
        assert!(errors.is_empty());
    }

    #[test]
    fn short_password_is_reported_once_per_field() {
        let mut errors = Vec::new();
        require_min_len(&mut errors, "password", "short", MIN_PASSWORD_LEN);
        assert_eq!(1, errors.len());
        assert_eq!("password", errors[0].field);
    }

    #[test]
    fn blank_name_is_required() {
        let mut errors = Vec::new();
        require_non_empty(&mut errors, "firstName", "   ");
        assert_eq!("firstName", errors[0].field);
    }
}
