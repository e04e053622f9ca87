//! Branch name validation.
//!
//! A branch name becomes a file path under `refs/heads/`, so the rules keep
//! it inside that directory and away from names git-style tools treat
//! specially:
//! - non-empty, and not `HEAD`
//! - no whitespace, control characters, or any of `~ ^ : ? * [ \`
//! - no `..` and no `@{`
//! - no leading or trailing `.` or `/`, no `.lock` suffix
//! - every `/`-separated component non-empty and not starting with `.`

use crate::error::{RefError, Result};

/// Characters that are forbidden anywhere in a branch name.
const FORBIDDEN_CHARS: &[char] = &['~', '^', ':', '?', '*', '[', '\\'];

fn invalid(name: &str, reason: impl Into<String>) -> RefError {
    RefError::InvalidBranchName {
        name: name.to_string(),
        reason: reason.into(),
    }
}

/// Validate a branch name, returning `Ok(())` if valid.
///
/// # Examples
///
/// ```
/// use twig_refs::names::validate_branch_name;
///
/// assert!(validate_branch_name("master").is_ok());
/// assert!(validate_branch_name("feature/auth").is_ok());
/// assert!(validate_branch_name("").is_err());
/// assert!(validate_branch_name("bad..name").is_err());
/// ```
pub fn validate_branch_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(invalid(name, "branch name must not be empty"));
    }
    if name == "HEAD" {
        return Err(invalid(name, "'HEAD' is reserved"));
    }
    if let Some(ch) = name
        .chars()
        .find(|c| c.is_whitespace() || c.is_control() || FORBIDDEN_CHARS.contains(c))
    {
        return Err(invalid(name, format!("contains forbidden character: {ch:?}")));
    }

    let banned_fragments = [("..", "must not contain '..'"), ("@{", "must not contain '@{'")];
    if let Some((_, reason)) = banned_fragments.iter().find(|(frag, _)| name.contains(frag)) {
        return Err(invalid(name, *reason));
    }

    if name.ends_with('.') || name.ends_with('/') {
        return Err(invalid(name, "must not end with '.' or '/'"));
    }
    if name.ends_with(".lock") {
        return Err(invalid(name, "must not end with '.lock'"));
    }

    // Covers leading '/' and '.', and '//'.
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
