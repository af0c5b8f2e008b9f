//! Pure predicates over user-entered text.
//!
//! Names, breeds, and usernames share one character rule: ASCII letters, digits, and single
//! spaces. Usernames additionally carry a length window.

use std::fmt;

pub const USERNAME_MIN_LEN: usize = 4;
pub const USERNAME_MAX_LEN: usize = 20;
pub const STRONG_PASSWORD_MIN_LEN: usize = 8;

/// Validation failures surfaced to the caller before a record is built.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("username must be 4-20 letters, digits, or single spaces")]
    InvalidUsername,
    #[error("password does not satisfy the {0} password policy")]
    InvalidPassword(PasswordPolicy),
    #[error("name must be letters, digits, or single spaces")]
    InvalidName,
    #[error("breed must be letters, digits, or single spaces")]
    InvalidBreed,
    #[error("invalid age '{0}': use '2', '3 years', or '6 months'")]
    InvalidAge(String),
}

/// Which password rule applies at registration and password change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PasswordPolicy {
    /// Any non-empty password.
    #[default]
    Basic,
    /// At least eight characters with one letter and one digit.
    Strict,
}

impl PasswordPolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "basic" => Some(Self::Basic),
            "strict" => Some(Self::Strict),
            _ => None,
        }
    }

    pub fn accepts(self, password: &str) -> bool {
        match self {
            PasswordPolicy::Basic => is_valid_password(password),
            PasswordPolicy::Strict => is_strong_password(password),
        }
    }

    pub fn validate(self, password: &str) -> Result<(), ValidationError> {
        if self.accepts(password) {
            Ok(())
        } else {
            Err(ValidationError::InvalidPassword(self))
        }
    }
}

impl fmt::Display for PasswordPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PasswordPolicy::Basic => write!(f, "basic"),
            PasswordPolicy::Strict => write!(f, "strict"),
        }
    }
}

fn has_allowed_chars(value: &str) -> bool {
    value
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || ch == ' ')
}

fn has_double_space(value: &str) -> bool {
    value.contains("  ")
}

pub fn is_valid_username(username: &str) -> bool {
    let len = username.chars().count();
    (USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&len)
        && has_allowed_chars(username)
        && !has_double_space(username)
}

fn has_line_break(value: &str) -> bool {
    value.contains(&['\r', '\n'][..])
}

/// Non-empty and on a single line; records are stored one per line.
pub fn is_valid_password(password: &str) -> bool {
    !password.is_empty() && !has_line_break(password)
}

pub fn is_strong_password(password: &str) -> bool {
    !has_line_break(password)
        && password.chars().count() >= STRONG_PASSWORD_MIN_LEN
        && password.chars().any(|ch| ch.is_ascii_alphabetic())
        && password.chars().any(|ch| ch.is_ascii_digit())
}

pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && has_allowed_chars(name) && !has_double_space(name)
}

pub fn is_valid_breed(breed: &str) -> bool {
    is_valid_name(breed)
}

pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if is_valid_username(username) {
        Ok(())
    } else {
        Err(ValidationError::InvalidUsername)
    }
}

pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    if is_valid_name(name) {
        Ok(())
    } else {
        Err(ValidationError::InvalidName)
    }
}

pub fn validate_breed(breed: &str) -> Result<(), ValidationError> {
    if is_valid_breed(breed) {
        Ok(())
    } else {
        Err(ValidationError::InvalidBreed)
    }
}

/// Parse an age entered as `"5"`, `"3 years"`, or `"18 months"` into whole years.
///
/// Months are floor-divided by twelve, so anything under a year collapses to `0`.
pub fn parse_age(raw: &str) -> Result<u32, ValidationError> {
    let invalid = || ValidationError::InvalidAge(raw.to_string());
    let trimmed = raw.trim();

    let digits_end = trimmed
        .find(|ch: char| !ch.is_ascii_digit())
        .unwrap_or(trimmed.len());
    if digits_end == 0 {
        return Err(invalid());
    }

    let value: u32 = trimmed[..digits_end].parse().map_err(|_| invalid())?;
    match trimmed[digits_end..].trim_start() {
        "" | "year" | "years" => Ok(value),
        "month" | "months" => Ok(value / 12),
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usernames_follow_length_and_charset_rules() {
        assert!(is_valid_username("rex1"));
        assert!(is_valid_username("Jane Doe"));
        assert!(is_valid_username("a".repeat(20).as_str()));

        assert!(!is_valid_username("abc"));
        assert!(!is_valid_username("a".repeat(21).as_str()));
        assert!(!is_valid_username("jane_doe"));
        assert!(!is_valid_username("jane  doe"));
        assert!(!is_valid_username("jane,doe"));
        assert!(!is_valid_username("jösé"));
    }

    #[test]
    fn names_and_breeds_reject_empty_and_double_spaces() {
        assert!(is_valid_name("Rex"));
        assert!(is_valid_name("Mr Whiskers 2"));
        assert!(is_valid_breed("Golden Retriever"));

        assert!(!is_valid_name(""));
        assert!(!is_valid_name("Mr  Whiskers"));
        assert!(!is_valid_breed("Lab-mix"));
        assert_eq!(validate_breed(""), Err(ValidationError::InvalidBreed));
    }

    #[test]
    fn password_policies_disagree_on_weak_passwords() {
        assert!(PasswordPolicy::Basic.accepts("x"));
        assert!(!PasswordPolicy::Basic.accepts(""));

        assert!(!PasswordPolicy::Strict.accepts("password"));
        assert!(!PasswordPolicy::Strict.accepts("12345678"));
        assert!(!PasswordPolicy::Strict.accepts("abc123"));
        assert!(PasswordPolicy::Strict.accepts("hunter22"));
        assert!(!PasswordPolicy::Basic.accepts("pass\nword"));
        assert!(!PasswordPolicy::Strict.accepts("hunter22\r\n"));

        assert_eq!(
            PasswordPolicy::Strict.validate("short"),
            Err(ValidationError::InvalidPassword(PasswordPolicy::Strict))
        );
    }

    #[test]
    fn password_policy_parses_config_values() {
        assert_eq!(PasswordPolicy::parse(" Strict "), Some(PasswordPolicy::Strict));
        assert_eq!(PasswordPolicy::parse("basic"), Some(PasswordPolicy::Basic));
        assert_eq!(PasswordPolicy::parse("paranoid"), None);
    }

    #[test]
    fn ages_convert_months_with_floor_division() {
        assert_eq!(parse_age("5"), Ok(5));
        assert_eq!(parse_age("3 years"), Ok(3));
        assert_eq!(parse_age("1 year"), Ok(1));
        assert_eq!(parse_age("6 months"), Ok(0));
        assert_eq!(parse_age("18 months"), Ok(1));
        assert_eq!(parse_age("24months"), Ok(2));
        assert_eq!(parse_age(" 7 "), Ok(7));
    }

    #[test]
    fn ages_reject_other_formats() {
        for raw in ["", "-1", "two", "3 weeks", "years", "3 years old", "99999999999"] {
            assert_eq!(
                parse_age(raw),
                Err(ValidationError::InvalidAge(raw.to_string())),
                "{raw:?} should be rejected"
            );
        }
    }
}
