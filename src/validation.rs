//! Input Validation
//! Mission: Sanitize every untrusted identity field before it reaches
//! storage or an authorization decision

use lazy_static::lazy_static;
use regex::Regex;

const MAX_USERNAME_LENGTH: usize = 50;
const MAX_EMAIL_LENGTH: usize = 100;

lazy_static! {
    static ref USERNAME_PATTERN: Regex = Regex::new(r"^[a-zA-Z0-9_-]{3,50}$").unwrap();
    static ref EMAIL_PATTERN: Regex =
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap();
    static ref TAG_PATTERN: Regex = Regex::new(r"<.*?>").unwrap();
}

/// Outcome of a single validation call.
///
/// The sanitized value is present only when the input was accepted;
/// the error message only when it was rejected.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub sanitized_value: Option<String>,
    pub error_message: Option<String>,
}

impl ValidationResult {
    fn valid(value: String) -> Self {
        Self {
            is_valid: true,
            sanitized_value: Some(value),
            error_message: None,
        }
    }

    fn invalid(message: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            sanitized_value: None,
            error_message: Some(message.into()),
        }
    }

    /// Collapse into the sanitized value or the violation message.
    pub fn into_result(self) -> Result<String, String> {
        if self.is_valid {
            Ok(self.sanitized_value.unwrap_or_default())
        } else {
            Err(self
                .error_message
                .unwrap_or_else(|| "Invalid input".to_string()))
        }
    }
}

/// Validates and sanitizes a username.
///
/// The trimmed input is HTML-encoded before the length and pattern checks
/// run, so entity expansion (`<` becomes `&lt;`) counts against the length
/// limit and any input that needed encoding fails the character-class
/// check. This also rejects usernames with non-ASCII letters; that
/// trade-off is intentional and must not be relaxed here.
pub fn validate_username(username: &str) -> ValidationResult {
    if username.trim().is_empty() {
        return ValidationResult::invalid("Username cannot be empty");
    }

    let sanitized = html_encode(username.trim());

    if sanitized.chars().count() > MAX_USERNAME_LENGTH {
        return ValidationResult::invalid(format!(
            "Username must not exceed {} characters",
            MAX_USERNAME_LENGTH
        ));
    }

    if !USERNAME_PATTERN.is_match(&sanitized) {
        return ValidationResult::invalid(
            "Username can only contain letters, numbers, underscores, and hyphens",
        );
    }

    ValidationResult::valid(sanitized)
}

/// Validates and sanitizes an email address.
///
/// Lower-cased, trimmed, and HTML-encoded before the length and pattern
/// checks, for the same reasons as [`validate_username`].
pub fn validate_email(email: &str) -> ValidationResult {
    if email.trim().is_empty() {
        return ValidationResult::invalid("Email cannot be empty");
    }

    let sanitized = html_encode(&email.trim().to_lowercase());

    if sanitized.chars().count() > MAX_EMAIL_LENGTH {
        return ValidationResult::invalid(format!(
            "Email must not exceed {} characters",
            MAX_EMAIL_LENGTH
        ));
    }

    if !EMAIL_PATTERN.is_match(&sanitized) {
        return ValidationResult::invalid("Invalid email format");
    }

    ValidationResult::valid(sanitized)
}

/// Strips a fixed denylist of dangerous substrings from free-text input.
///
/// Used for search terms and other fields that cannot go through strict
/// validation. This is defense-in-depth layered on top of parameterized
/// storage access, never the sole SQL/XSS defense.
pub fn strip_dangerous(input: &str) -> String {
    if input.is_empty() {
        return String::new();
    }

    const DENYLIST: [&str; 9] = [
        "'", "\"", ";", "--", "/*", "*/", "xp_", "<script>", "</script>",
    ];

    let mut cleaned = input.to_string();
    for token in DENYLIST {
        cleaned = cleaned.replace(token, "");
    }

    TAG_PATTERN.replace_all(&cleaned, "").into_owned()
}

/// Minimal HTML entity encoding, applied before length and pattern checks.
fn html_encode(input: &str) -> String {
    let mut encoded = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => encoded.push_str("&amp;"),
            '<' => encoded.push_str("&lt;"),
            '>' => encoded.push_str("&gt;"),
            '"' => encoded.push_str("&quot;"),
            '\'' => encoded.push_str("&#39;"),
            _ => encoded.push(ch),
        }
    }
    encoded
}
