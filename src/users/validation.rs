use lazy_static::lazy_static;
use regex::Regex;

use crate::{
    config::UserRules,
    error::{Field, ValidationErrors, Violation},
};

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Emails are compared and stored trimmed and lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Records problems with an already normalized email. Returns `true` when
/// the value may go on to the uniqueness check.
pub(crate) fn check_email(email: &str, errors: &mut ValidationErrors) -> bool {
    if email.is_empty() {
        errors.add(Field::Email, Violation::Blank);
        return false;
    }
    if !is_valid_email(email) {
        errors.add(Field::Email, Violation::Invalid);
        return false;
    }
    true
}

pub(crate) fn check_password(password: &str, rules: &UserRules, errors: &mut ValidationErrors) -> bool {
    if password.is_empty() {
        errors.add(Field::Password, Violation::Blank);
        return false;
    }
    let len = password.chars().count();
    if len < rules.password_min_length {
        errors.add(
            Field::Password,
            Violation::TooShort { min: rules.password_min_length },
        );
        return false;
    }
    if len > rules.password_max_length {
        errors.add(
            Field::Password,
            Violation::TooLong { max: rules.password_max_length },
        );
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_and_whitespace() {
        assert_eq!(normalize_email("  Alice@Example.COM \n"), "alice@example.com");
    }

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.de"));
        assert!(!is_valid_email("@c.de"));
    }

    #[test]
    fn blank_email_is_reported_once() {
        let mut errors = ValidationErrors::new();
        assert!(!check_email("", &mut errors));
        assert!(errors.has(Field::Email, Violation::Blank));
        assert_eq!(errors.on(Field::Email).count(), 1);
    }

    #[test]
    fn password_bounds() {
        let rules = UserRules::default();
        let mut errors = ValidationErrors::new();
        assert!(!check_password("", &rules, &mut errors));
        assert!(!check_password("12345", &rules, &mut errors));
        assert!(!check_password(&"x".repeat(129), &rules, &mut errors));
        assert!(check_password("123456", &rules, &mut errors));

        assert!(errors.has(Field::Password, Violation::Blank));
        assert!(errors.has(Field::Password, Violation::TooShort { min: 6 }));
        assert!(errors.has(Field::Password, Violation::TooLong { max: 128 }));
    }
}
