//! Reference name validation following git-style conventions.
//!
//! Valid reference names:
//! - Must be non-empty
//! - Must not contain whitespace, `~`, `^`, `:`, `?`, `*`, `[`, `\`
//! - Must not contain `..` (double dot) or `@{`
//! - Must not start or end with `.` or `/`
//! - Must not end with `.lock`
//! - Components between slashes must be non-empty and not start with `.`

use crate::error::{RefError, RefResult};

/// Characters that are forbidden anywhere in a ref name.
const FORBIDDEN_CHARS: &[char] = &[' ', '\t', '\n', '\r', '~', '^', ':', '?', '*', '[', '\\'];

fn invalid(name: &str, reason: impl Into<String>) -> RefError {
    RefError::InvalidName {
        name: name.to_string(),
        reason: reason.into(),
    }
}

/// Validate a branch or tag name, returning `Ok(())` if valid.
///
/// # Examples
///
/// ```
/// use vcat_refs::names::validate_ref_name;
///
/// assert!(validate_ref_name("main").is_ok());
/// assert!(validate_ref_name("etl/daily").is_ok());
/// assert!(validate_ref_name("").is_err());
/// assert!(validate_ref_name("bad..name").is_err());
/// ```
pub fn validate_ref_name(name: &str) -> RefResult<()> {
    if name.is_empty() {
        return Err(invalid(name, "ref name must not be empty"));
    }

    if let Some(ch) = FORBIDDEN_CHARS.iter().find(|ch| name.contains(**ch)) {
        return Err(invalid(name, format!("contains forbidden character: {ch:?}")));
    }

    if name.contains("..") {
        return Err(invalid(name, "must not contain '..'"));
    }

    if name.contains("@{") {
        return Err(invalid(name, "must not contain '@{'"));
    }

    if name.starts_with('.') || name.ends_with('.') {
        return Err(invalid(name, "must not start or end with '.'"));
    }

    if name.starts_with('/') || name.ends_with('/') {
        return Err(invalid(name, "must not start or end with '/'"));
    }

    if name.ends_with(".lock") {
        return Err(invalid(name, "must not end with '.lock'"));
    }

    for component in name.split('/') {
        if component.is_empty() {
            return Err(invalid(name, "path components must not be empty"));
        }
        if component.starts_with('.') {
            return Err(invalid(
                name,
                format!("component must not start with '.': {component:?}"),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_simple_names() {
        assert!(validate_ref_name("main").is_ok());
        assert!(validate_ref_name("my-branch").is_ok());
        assert!(validate_ref_name("v1.0").is_ok());
    }

    #[test]
    fn valid_nested_names() {
        assert!(validate_ref_name("etl/daily").is_ok());
        assert!(validate_ref_name("user/alice/fix-123").is_ok());
    }

    #[test]
    fn reject_empty_name() {
        assert!(validate_ref_name("").is_err());
    }

    #[test]
    fn reject_double_dot() {
        assert!(validate_ref_name("bad..name").is_err());
    }

    #[test]
    fn reject_whitespace() {
        assert!(validate_ref_name("has space").is_err());
        assert!(validate_ref_name("has\ttab").is_err());
    }

    #[test]
    fn reject_forbidden_chars() {
        for bad in ["a~b", "a^b", "a:b", "a?b", "a*b", "a[b", "a\\b"] {
            assert!(validate_ref_name(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn reject_boundaries() {
        assert!(validate_ref_name(".hidden").is_err());
        assert!(validate_ref_name("trailing.").is_err());
        assert!(validate_ref_name("/leading").is_err());
        assert!(validate_ref_name("trailing/").is_err());
    }

    #[test]
    fn reject_consecutive_slashes() {
        assert!(validate_ref_name("a//b").is_err());
    }

    #[test]
    fn reject_lock_suffix_and_reflog_syntax() {
        assert!(validate_ref_name("main.lock").is_err());
        assert!(validate_ref_name("ref@{0}").is_err());
    }

    #[test]
    fn reject_component_starting_with_dot() {
        assert!(matches!(
            validate_ref_name("etl/.hidden"),
            Err(RefError::InvalidName { .. })
        ));
    }
}
