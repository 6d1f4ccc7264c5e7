use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::error::AppError;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)+$")
        .expect("email pattern is valid")
});

pub const MAX_SLUG_LEN: usize = 100;

/// NFKD-decompose and drop non-ASCII, lower-case, keep only letters, digits,
/// `_`, `-` and whitespace, collapse whitespace/hyphen runs into one `-`,
/// trim `-` and `_` from the ends.
pub fn slugify(name: &str) -> String {
    let kept: String = name
        .nfkd()
        .filter(char::is_ascii)
        .collect::<String>()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-' || c.is_ascii_whitespace())
        .collect();

    kept.split(|c: char| c == '-' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
        .trim_matches(|c| c == '-' || c == '_')
        .to_string()
}

pub fn validate_slug(slug: &str) -> Result<(), AppError> {
    if slug.is_empty() || slug.len() > MAX_SLUG_LEN {
        return Err(AppError::BadRequest(format!(
            "Slug must be between 1 and {MAX_SLUG_LEN} characters"
        )));
    }
    if !slug
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(AppError::BadRequest(
            "Slug must contain only letters, numbers, underscores, and hyphens".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_email(field: &str, email: &str) -> Result<(), AppError> {
    if email.len() > 254 || !EMAIL.is_match(email) {
        return Err(AppError::BadRequest(format!(
            "Enter a valid email address for {field}"
        )));
    }
    Ok(())
}

/// Required text field: non-blank and at most `max` characters.
pub fn validate_text(field: &str, value: &str, max: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::BadRequest(format!("{field} must not be empty")));
    }
    if value.chars().count() > max {
        return Err(AppError::BadRequest(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(())
}

/// Parse an optional enumerated value such as a status or priority.
pub fn parse_choice<T>(value: Option<&str>) -> Result<Option<T>, AppError>
where
    T: std::str::FromStr<Err = String>,
{
    value
        .map(|v| v.parse::<T>().map_err(AppError::BadRequest))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskStatus;

    #[test]
    fn slugify_derives_url_safe_identifiers() {
        assert_eq!(slugify("My Org"), "my-org");
        assert_eq!(slugify("  Acme   Corp  "), "acme-corp");
        assert_eq!(slugify("Bob's Big -- Team!"), "bobs-big-team");
        assert_eq!(slugify("under_score"), "under_score");
        assert_eq!(slugify("_edge_"), "edge");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn slugify_folds_accents_to_ascii() {
        assert_eq!(slugify("Café Org"), "cafe-org");
        assert_eq!(slugify("Ærøskøbing Ñandú"), "rskbing-nandu");
        assert!(validate_slug(&slugify("Crème Brûlée Ltd")).is_ok());
    }

    #[test]
    fn slug_validation() {
        assert!(validate_slug("my-org").is_ok());
        assert!(validate_slug("My_Org-2").is_ok());
        assert!(validate_slug("").is_err());
        assert!(validate_slug("has space").is_err());
        assert!(validate_slug(&"a".repeat(101)).is_err());
    }

    #[test]
    fn email_validation() {
        assert!(validate_email("contact_email", "ops@acme.test").is_ok());
        assert!(validate_email("contact_email", "first.last+tag@sub.example.com").is_ok());
        assert!(validate_email("contact_email", "invalid-email").is_err());
        assert!(validate_email("contact_email", "a@b").is_err());
        assert!(validate_email("contact_email", "a b@c.com").is_err());
    }

    #[test]
    fn text_validation() {
        assert!(validate_text("name", "Roadmap", 200).is_ok());
        assert!(validate_text("name", "   ", 200).is_err());
        assert!(validate_text("name", &"x".repeat(201), 200).is_err());
    }

    #[test]
    fn choices_parse_or_report() {
        assert_eq!(parse_choice::<TaskStatus>(None).unwrap(), None);
        assert_eq!(
            parse_choice::<TaskStatus>(Some("DONE")).unwrap(),
            Some(TaskStatus::Done)
        );
        match parse_choice::<TaskStatus>(Some("FINISHED")) {
            Err(AppError::BadRequest(msg)) => assert!(msg.contains("TODO, IN_PROGRESS, DONE")),
            other => panic!("expected BadRequest, got {other:?}"),
        }
    }
}
