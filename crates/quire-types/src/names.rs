//! Name validation for identifiers that end up inside object keys.
//!
//! Job ids become part of every key for a document, so they are held to a
//! strict alphabet: ASCII alphanumerics, `-` and `_`. Page keys only ever
//! appear inside the manifest JSON, so they are allowed anything printable.

use crate::error::TypeError;

/// Longest accepted job id or page key, in bytes.
pub const MAX_NAME_LEN: usize = 128;

/// Validate a job id, returning `Ok(())` if valid.
///
/// # Examples
///
/// ```
/// use quire_types::names::validate_job_id;
///
/// assert!(validate_job_id("J1").is_ok());
/// assert!(validate_job_id("7f3c-41aa_b").is_ok());
/// assert!(validate_job_id("").is_err());
/// assert!(validate_job_id("../etc").is_err());
/// ```
pub fn validate_job_id(value: &str) -> Result<(), TypeError> {
    let fail = |reason: &str| TypeError::InvalidJobId {
        value: value.to_string(),
        reason: reason.to_string(),
    };

    if value.is_empty() {
        return Err(fail("must not be empty"));
    }
    if value.len() > MAX_NAME_LEN {
        return Err(fail("too long"));
    }
    if let Some(ch) = value
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
    {
        return Err(fail(&format!("contains forbidden character: {ch:?}")));
    }
    Ok(())
}

/// Validate a page key, returning `Ok(())` if valid.
pub fn validate_page_key(value: &str) -> Result<(), TypeError> {
    let fail = |reason: &str| TypeError::InvalidPageKey {
        value: value.to_string(),
        reason: reason.to_string(),
    };

    if value.trim().is_empty() {
        return Err(fail("must not be empty"));
    }
    if value.len() > MAX_NAME_LEN {
        return Err(fail("too long"));
    }
    if value.chars().any(char::is_control) {
        return Err(fail("must not contain control characters"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_job_ids() {
        assert!(validate_job_id("J1").is_ok());
        assert!(validate_job_id("job_2024-10-19").is_ok());
        assert!(validate_job_id("a").is_ok());
    }

    #[test]
    fn reject_empty_job_id() {
        assert!(validate_job_id("").is_err());
    }

    #[test]
    fn reject_traversal_and_separators() {
        assert!(validate_job_id("..").is_err());
        assert!(validate_job_id("a/b").is_err());
        assert!(validate_job_id("a\\b").is_err());
        assert!(validate_job_id("a.b").is_err());
    }

    #[test]
    fn reject_whitespace_in_job_id() {
        assert!(validate_job_id("has space").is_err());
        assert!(validate_job_id("tab\there").is_err());
    }

    #[test]
    fn reject_overlong_job_id() {
        let long = "a".repeat(MAX_NAME_LEN + 1);
        assert!(validate_job_id(&long).is_err());
        assert!(validate_job_id(&"a".repeat(MAX_NAME_LEN)).is_ok());
    }

    #[test]
    fn page_keys() {
        assert!(validate_page_key("storyPage3").is_ok());
        assert!(validate_page_key("cover back").is_ok());
        assert!(validate_page_key("").is_err());
        assert!(validate_page_key("   ").is_err());
        assert!(validate_page_key("bad\nkey").is_err());
    }
}
