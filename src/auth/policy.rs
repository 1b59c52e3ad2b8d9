//! Password strength policy.
//!
//! Pure validation, no I/O: a fixed set of required checks plus a set of
//! optional character-class checks gated by a pass threshold.

pub const PASSWORD_MIN_LENGTH: usize = 6;
pub const PASSWORD_MAX_LENGTH: usize = 128;

/// How many of the optional checks must pass.
const MIN_OPTIONAL_TESTS: usize = 4;

/// A rejected password: joined message for display plus the individual
/// violated-rule descriptions for field-level feedback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyViolation {
    pub message: String,
    pub details: Vec<String>,
}

impl PolicyViolation {
    fn new(details: Vec<String>) -> Self {
        let message = if details.is_empty() {
            "Password too weak".to_string()
        } else {
            details.join("; ")
        };
        Self { message, details }
    }
}

/// Validate password shape and strength.
///
/// # Errors
/// Returns every violated rule when the password is rejected.
pub fn validate_password(password: &str) -> Result<(), PolicyViolation> {
    if password.is_empty() {
        return Err(PolicyViolation::new(vec![
            "Password is required".to_string()
        ]));
    }

    let mut details = Vec::new();
    let length = password.chars().count();

    if length < PASSWORD_MIN_LENGTH {
        details.push(format!(
            "Password must be at least {PASSWORD_MIN_LENGTH} characters"
        ));
    }

    if length > PASSWORD_MAX_LENGTH {
        details.push(format!(
            "Password cannot exceed {PASSWORD_MAX_LENGTH} characters"
        ));
    }

    if password.contains(' ') {
        details.push("Password cannot contain spaces".to_string());
    }

    if has_repeated_run(password) {
        details.push(
            "Password may not contain sequences of three or more repeated characters".to_string(),
        );
    }

    // Character-class diversity applies to every password, long
    // pass-phrases included.
    let optional: [(bool, &str); 4] = [
        (
            password.chars().any(|c| c.is_ascii_lowercase()),
            "Password must contain at least one lowercase letter",
        ),
        (
            password.chars().any(|c| c.is_ascii_uppercase()),
            "Password must contain at least one uppercase letter",
        ),
        (
            password.chars().any(|c| c.is_ascii_digit()),
            "Password must contain at least one number",
        ),
        (
            password.chars().any(|c| !c.is_ascii_alphanumeric()),
            "Password must contain at least one special character",
        ),
    ];

    let passed = optional.iter().filter(|(ok, _)| *ok).count();
    if passed < MIN_OPTIONAL_TESTS {
        for (ok, description) in optional {
            if !ok {
                details.push(description.to_string());
            }
        }
    }

    if details.is_empty() {
        Ok(())
    } else {
        Err(PolicyViolation::new(details))
    }
}

fn has_repeated_run(password: &str) -> bool {
    let chars: Vec<char> = password.chars().collect();
    chars
        .windows(3)
        .any(|window| window[0] == window[1] && window[1] == window[2])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_strong_password() {
        assert!(validate_password("TestPass123!").is_ok());
    }

    #[test]
    fn empty_is_distinct_from_too_short() {
        let required = validate_password("").unwrap_err();
        assert_eq!(required.details, vec!["Password is required".to_string()]);

        let short = validate_password("Ab1!").unwrap_err();
        assert!(short
            .details
            .iter()
            .any(|detail| detail.contains("at least 6 characters")));
        assert!(!short.details.contains(&"Password is required".to_string()));
    }

    #[test]
    fn rejects_over_maximum_length() {
        let long = format!("Aa1!{}", "x".repeat(130));
        let violation = validate_password(&long).unwrap_err();
        assert!(violation
            .details
            .iter()
            .any(|detail| detail.contains("cannot exceed 128 characters")));
    }

    #[test]
    fn rejects_missing_character_classes() {
        let violation = validate_password("alllowercase1!").unwrap_err();
        assert!(violation
            .details
            .iter()
            .any(|detail| detail.contains("uppercase")));

        let violation = validate_password("NoDigitsHere!").unwrap_err();
        assert!(violation
            .details
            .iter()
            .any(|detail| detail.contains("number")));
    }

    #[test]
    fn rejects_spaces_and_repeats() {
        let violation = validate_password("Has Space1!").unwrap_err();
        assert!(violation
            .details
            .iter()
            .any(|detail| detail.contains("spaces")));

        let violation = validate_password("Haaas1!x").unwrap_err();
        assert!(violation
            .details
            .iter()
            .any(|detail| detail.contains("repeated characters")));
    }

    #[test]
    fn long_passphrases_still_need_character_classes() {
        let violation = validate_password("correcthorsebatterystaple").unwrap_err();
        assert!(violation
            .details
            .iter()
            .any(|detail| detail.contains("uppercase")));
        assert!(violation
            .details
            .iter()
            .any(|detail| detail.contains("number")));
        assert!(violation
            .details
            .iter()
            .any(|detail| detail.contains("special character")));

        assert!(validate_password("CorrectHorseBattery1!").is_ok());
    }

    #[test]
    fn joined_message_lists_every_rule() {
        let violation = validate_password("abc").unwrap_err();
        assert!(violation.details.len() > 1);
        assert_eq!(violation.message, violation.details.join("; "));
    }
}
