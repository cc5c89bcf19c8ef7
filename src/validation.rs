//! Input normalisation shared by signup, employee management and the
//! warehouse catalog.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::RepositoryError;

pub const TAX_ID_DIGITS: usize = 14;
pub const USERNAME_MAX_LEN: usize = 150;

fn username_regex() -> &'static Regex {
    static USERNAME: OnceLock<Regex> = OnceLock::new();
    USERNAME.get_or_init(|| Regex::new(r"^[A-Za-z0-9@.+_-]+$").expect("static username pattern"))
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("static email pattern")
    })
}

/// Strip punctuation from a tax id and require exactly 14 digits.
pub fn normalize_tax_id(raw: &str) -> Result<String, RepositoryError> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() != TAX_ID_DIGITS {
        return Err(RepositoryError::field_error(
            "tax_id",
            "Tax id must contain 14 digits.",
        ));
    }
    Ok(digits)
}

/// Like [`normalize_tax_id`] but blank input clears the tax id.
pub fn normalize_optional_tax_id(raw: Option<&str>) -> Result<Option<String>, RepositoryError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => normalize_tax_id(value).map(Some),
    }
}

/// Trim and check a username: letters, digits and `@ . + - _`, at most 150 chars.
pub fn normalize_username(raw: &str) -> Result<String, RepositoryError> {
    let username = raw.trim();
    if username.is_empty() {
        return Err(RepositoryError::field_error("username", "This field is required."));
    }
    if username.chars().count() > USERNAME_MAX_LEN {
        return Err(RepositoryError::field_error(
            "username",
            "Ensure this value has at most 150 characters.",
        ));
    }
    if !username_regex().is_match(username) {
        return Err(RepositoryError::field_error(
            "username",
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        ));
    }
    Ok(username.to_string())
}

/// Trim and lowercase an email address.
pub fn normalize_email(raw: &str) -> Result<String, RepositoryError> {
    let email = raw.trim().to_lowercase();
    if !email_regex().is_match(&email) {
        return Err(RepositoryError::field_error("email", "Enter a valid email address."));
    }
    Ok(email)
}

/// Trim a required display name and bound its length in characters.
pub fn required_name(field: &str, raw: &str, max_len: usize) -> Result<String, RepositoryError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(RepositoryError::field_error(field, "This field is required."));
    }
    if value.chars().count() > max_len {
        return Err(RepositoryError::field_error(
            field,
            format!("Ensure this value has at most {max_len} characters."),
        ));
    }
    Ok(value.to_string())
}

/// Trim an optional personal name, bounding its length.
pub fn person_name(field: &str, raw: &str) -> Result<String, RepositoryError> {
    let value = raw.trim();
    if value.chars().count() > 150 {
        return Err(RepositoryError::field_error(
            field,
            "Ensure this value has at most 150 characters.",
        ));
    }
    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tax_id_punctuation_is_stripped() {
        assert_eq!(
            normalize_tax_id("12.345.678/0001-99").unwrap(),
            "12345678000199"
        );
        assert!(normalize_tax_id("1234").is_err());
        assert_eq!(normalize_optional_tax_id(Some("  ")).unwrap(), None);
        assert_eq!(normalize_optional_tax_id(None).unwrap(), None);
    }

    #[test]
    fn username_rules() {
        assert_eq!(normalize_username("  jane.doe+1@x ").unwrap(), "jane.doe+1@x");
        assert!(normalize_username("jane doe").is_err());
        assert!(normalize_username("").is_err());
        assert!(normalize_username(&"a".repeat(151)).is_err());
        assert_eq!(normalize_username("jane_doe-2").unwrap(), "jane_doe-2");
    }

    #[test]
    fn username_rejects_non_ascii_letters() {
        assert!(normalize_username("joão").is_err());
        assert!(normalize_username("ñandú").is_err());
        assert!(normalize_username("用户").is_err());
    }

    #[test]
    fn email_is_lowercased() {
        assert_eq!(normalize_email(" Jane@Example.COM ").unwrap(), "jane@example.com");
        assert!(normalize_email("not-an-email").is_err());
    }

    #[test]
    fn required_name_trims_and_bounds() {
        assert_eq!(required_name("name", "  PLC ", 50).unwrap(), "PLC");
        assert!(required_name("name", "   ", 50).is_err());
        assert!(required_name("name", &"x".repeat(51), 50).is_err());
    }
}
