use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ApiError;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    static ref USERNAME_RE: Regex = Regex::new(r"^[A-Za-z0-9_]{3,30}$").unwrap();
}

pub fn username(value: &str) -> Result<(), ApiError> {
    if USERNAME_RE.is_match(value) {
        Ok(())
    } else {
        Err(ApiError::Validation {
            field: "username",
            message: "Username must be 3-30 characters of letters, digits and underscores",
        })
    }
}

pub fn email(value: &str) -> Result<(), ApiError> {
    if EMAIL_RE.is_match(value) {
        Ok(())
    } else {
        Err(ApiError::Validation {
            field: "email",
            message: "Invalid email address",
        })
    }
}

/// At least 6 characters with one lowercase letter, one uppercase letter and
/// one digit.
pub fn password(field: &'static str, value: &str) -> Result<(), ApiError> {
    let strong = value.len() >= 6
        && value.chars().any(|c| c.is_ascii_lowercase())
        && value.chars().any(|c| c.is_ascii_uppercase())
        && value.chars().any(|c| c.is_ascii_digit());
    if strong {
        Ok(())
    } else {
        Err(ApiError::Validation {
            field,
            message: "Password must be at least 6 characters and contain an uppercase letter, a lowercase letter and a digit",
        })
    }
}

pub fn name(field: &'static str, value: Option<&str>) -> Result<(), ApiError> {
    match value {
        Some(v) if v.chars().count() > 50 => Err(ApiError::Validation {
            field,
            message: "Name must be at most 50 characters",
        }),
        _ => Ok(()),
    }
}

pub fn required(field: &'static str, value: &str) -> Result<(), ApiError> {
    if value.is_empty() {
        Err(ApiError::Validation {
            field,
            message: "This field is required",
        })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_rules() {
        assert!(username("alice").is_ok());
        assert!(username("a_1").is_ok());
        assert!(username("ab").is_err());
        assert!(username("has space").is_err());
        assert!(username(&"x".repeat(31)).is_err());
    }

    #[test]
    fn email_rules() {
        assert!(email("alice@x.com").is_ok());
        assert!(email("no-at-sign").is_err());
        assert!(email("two@@x.com").is_err());
        assert!(email("missing@tld").is_err());
    }

    #[test]
    fn password_rules() {
        assert!(password("password", "Passw0rd").is_ok());
        assert!(password("password", "short").is_err());
        assert!(password("password", "alllowercase1").is_err());
        assert!(password("password", "ALLUPPERCASE1").is_err());
        assert!(password("password", "NoDigitsHere").is_err());
    }

    #[test]
    fn name_rules() {
        assert!(name("firstName", None).is_ok());
        assert!(name("firstName", Some("Grace")).is_ok());
        assert!(name("firstName", Some(&"x".repeat(51))).is_err());
    }
}
