//! Username normalization and shape validation.

use regex::Regex;

pub const USERNAME_MIN_LENGTH: usize = 3;
pub const USERNAME_MAX_LENGTH: usize = 32;

/// Lowercase, trimmed form used as the store key and uniqueness domain.
#[must_use]
pub fn normalize_username(username: &str) -> String {
    username.trim().to_lowercase()
}

/// Validate an already-normalized username, returning every violated rule.
///
/// # Errors
/// Returns the list of human-readable rule violations.
pub fn validate_username(username: &str) -> Result<(), Vec<String>> {
    let mut violations = Vec::new();

    if username.is_empty() {
        violations.push("Username is required".to_string());
        return Err(violations);
    }

    if username.chars().count() < USERNAME_MIN_LENGTH {
        violations.push(format!(
            "Username must be at least {USERNAME_MIN_LENGTH} characters"
        ));
    }

    if username.chars().count() > USERNAME_MAX_LENGTH {
        violations.push(format!(
            "Username cannot exceed {USERNAME_MAX_LENGTH} characters"
        ));
    }

    let charset = Regex::new(r"^[a-zA-Z0-9._-]+$");
    if !charset.is_ok_and(|re| re.is_match(username)) {
        violations.push(
            "Username may contain only letters, numbers, dots, underscores, and hyphens"
                .to_string(),
        );
    }

    if username.starts_with('.') || username.ends_with('.') {
        violations.push("Username cannot start or end with a dot".to_string());
    }

    if username.contains("..") {
        violations.push("Username cannot contain consecutive dots".to_string());
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}
