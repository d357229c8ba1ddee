//! Input validation and sanitization for request payloads.

use thiserror::Error;
use unicode_normalization::UnicodeNormalization;

/// Validation error types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Input exceeds maximum allowed length.
    #[error("{field} exceeds maximum length ({max} bytes, got {actual})")]
    TooLong {
        /// Field name.
        field: &'static str,
        /// Maximum allowed length.
        max: usize,
        /// Actual input length.
        actual: usize,
    },

    /// Required field is missing or blank.
    #[error("{0} is required")]
    Empty(&'static str),

    /// Field holds a value outside its domain.
    #[error("invalid {field}: {reason}")]
    Invalid {
        /// Field name.
        field: &'static str,
        /// What was wrong.
        reason: String,
    },

    /// Email address is not well formed.
    #[error("invalid email address: {0}")]
    InvalidEmail(String),

    /// Disallowed characters in input.
    #[error("disallowed characters in {0}")]
    DisallowedChars(&'static str),
}

/// Size limits per input type.
pub mod limits {
    /// Maximum comment length (8KB).
    pub const MAX_COMMENT_LENGTH: usize = 8 * 1024;

    /// Maximum contact message length (16KB).
    pub const MAX_MESSAGE_LENGTH: usize = 16 * 1024;

    /// Maximum short text field length (titles, names, subjects).
    pub const MAX_SHORT_TEXT: usize = 512;

    /// Maximum email length.
    pub const MAX_EMAIL_LENGTH: usize = 254;

    /// Maximum upload filename length.
    pub const MAX_FILENAME_LENGTH: usize = 200;
}

/// Sanitize free text from a public form.
///
/// Strips control characters other than newlines and tabs, applies NFKC
/// normalization and trims surrounding whitespace.
///
/// # Errors
///
/// Returns `ValidationError::TooLong` if input exceeds `max_len` and
/// `ValidationError::Empty` if nothing is left after trimming.
pub fn sanitize_text(
    field: &'static str,
    input: &str,
    max_len: usize,
) -> Result<String, ValidationError> {
    if input.len() > max_len {
        return Err(ValidationError::TooLong {
            field,
            max: max_len,
            actual: input.len(),
        });
    }

    let sanitized: String = input
        .chars()
        .filter(|c| !c.is_control() || matches!(c, '\n' | '\t' | '\r'))
        .collect::<String>()
        .nfkc()
        .collect();

    let trimmed = sanitized.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty(field));
    }
    Ok(trimmed.to_string())
}

/// Require a non-blank value.
///
/// # Errors
///
/// Returns `ValidationError::Empty` if `value` is blank.
pub fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Empty(field));
    }
    Ok(())
}

/// Normalize an email address for storage and lookup (trim + lowercase).
///
/// # Errors
///
/// Returns `ValidationError::InvalidEmail` unless the result has exactly one
/// `@` with a non-empty local part and a dotted domain.
pub fn normalize_email(input: &str) -> Result<String, ValidationError> {
    let email = input.trim().to_lowercase();
    if email.is_empty() {
        return Err(ValidationError::Empty("email"));
    }
    if email.len() > limits::MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong {
            field: "email",
            max: limits::MAX_EMAIL_LENGTH,
            actual: email.len(),
        });
    }

    let well_formed = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };

    if well_formed {
        Ok(email)
    } else {
        Err(ValidationError::InvalidEmail(input.trim().to_string()))
    }
}

/// Whether `email` belongs to the organisation domain.
///
/// The comparison is case-insensitive and anchored on the `@`, so
/// `x@notyiaga.org` does not match `yiaga.org`.
#[must_use]
pub fn email_in_domain(email: &str, domain: &str) -> bool {
    let email = email.trim().to_lowercase();
    let suffix = format!("@{}", domain.trim().to_lowercase());
    email.len() > suffix.len() && email.ends_with(&suffix)
}

/// Derive a URL slug from a title.
///
/// Lowercases, maps every run of non-alphanumeric characters to a single
/// `-`, and trims dashes from both ends.
#[must_use]
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut dash = false;
    for c in title.nfkc().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            slug.push(c);
            dash = false;
        } else if !dash && !slug.is_empty() {
            slug.push('-');
            dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Reduce a client-supplied upload name to a safe file name.
///
/// Keeps only the final path component and ASCII alphanumerics, `.`, `-`
/// and `_`; other characters become `_`.
///
/// # Errors
///
/// Returns `ValidationError::DisallowedChars` when nothing usable remains.
pub fn sanitize_filename(name: &str) -> Result<String, ValidationError> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();

    let cleaned: String = base
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .take(limits::MAX_FILENAME_LENGTH)
        .collect();

    let trimmed = cleaned.trim_start_matches('.');
    if trimmed.is_empty() || trimmed.chars().all(|c| c == '_') {
        return Err(ValidationError::DisallowedChars("filename"));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_text() {
        assert_eq!(sanitize_text("content", "  Hello\x00 world ", 100).unwrap(), "Hello world");
        assert_eq!(sanitize_text("content", "Line1\nLine2", 100).unwrap(), "Line1\nLine2");
        assert_eq!(sanitize_text("content", "\u{FB01}ne", 100).unwrap(), "fine");

        assert_eq!(
            sanitize_text("content", "   ", 100),
            Err(ValidationError::Empty("content"))
        );
        assert!(matches!(
            sanitize_text("content", &"x".repeat(200), 100),
            Err(ValidationError::TooLong { max: 100, actual: 200, .. })
        ));
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email(" Ada@Yiaga.ORG ").unwrap(), "ada@yiaga.org");
        assert!(normalize_email("no-at-sign").is_err());
        assert!(normalize_email("a@@b.org").is_err());
        assert!(normalize_email("@yiaga.org").is_err());
        assert!(normalize_email("a@localhost").is_err());
        assert!(normalize_email("a b@yiaga.org").is_err());
        assert_eq!(normalize_email(""), Err(ValidationError::Empty("email")));
    }

    #[test]
    fn test_email_in_domain() {
        assert!(email_in_domain("ada@yiaga.org", "yiaga.org"));
        assert!(email_in_domain("ADA@YIAGA.ORG", "yiaga.org"));
        assert!(!email_in_domain("ada@notyiaga.org", "yiaga.org"));
        assert!(!email_in_domain("ada@gmail.com", "yiaga.org"));
        assert!(!email_in_domain("@yiaga.org", "yiaga.org"));
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Watching The Vote 2027"), "watching-the-vote-2027");
        assert_eq!(slugify("  Ready to Run!  "), "ready-to-run");
        assert_eq!(slugify("A -- B"), "a-b");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("report.pdf").unwrap(), "report.pdf");
        assert_eq!(sanitize_filename("../../etc/passwd").unwrap(), "passwd");
        assert_eq!(sanitize_filename("C:\\docs\\my file.png").unwrap(), "my_file.png");
        assert_eq!(sanitize_filename(".hidden").unwrap(), "hidden");
        assert!(sanitize_filename("..").is_err());
        assert!(sanitize_filename("").is_err());
    }
}
