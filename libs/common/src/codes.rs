//! Domain error codes reported by the board API
//!
//! Every error body the API returns carries a `<DOMAIN>-<NUMBER>` token in its
//! message (for example `"USER-002: Email already exists"`). This module
//! extracts that token and maps the known ones to user-facing text.

use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// Login rejected because the email/password pair does not match.
pub const AUTH_INVALID_CREDENTIALS: &str = "AUTH-001";
/// Current password does not match (password change).
pub const USER_PASSWORD_MISMATCH: &str = "USER-006";
/// New password violates the password policy.
pub const USER_PASSWORD_POLICY: &str = "USER-004";
/// Email already registered.
pub const USER_EMAIL_TAKEN: &str = "USER-002";
/// Nickname already registered.
pub const USER_NICKNAME_TAKEN: &str = "USER-003";
/// Post does not exist.
pub const POST_NOT_FOUND: &str = "POST-001";
/// Comment does not exist.
pub const COMMENT_NOT_FOUND: &str = "COMMENT-001";
/// Comment was already deleted.
pub const COMMENT_ALREADY_DELETED: &str = "COMMENT-003";
/// The post is already liked by the caller.
pub const LIKE_ALREADY_LIKED: &str = "LIKE-001";

/// Codes that mean the submitted credentials are wrong, not that the
/// access token expired. A refresh never helps for these.
pub const CREDENTIAL_MISMATCH_CODES: &[&str] = &[AUTH_INVALID_CREDENTIALS];

/// Code table: code -> user-facing text
const MESSAGES: &[(&str, &str)] = &[
    // AUTH
    ("AUTH-001", "Email or password does not match."),
    ("AUTH-002", "Invalid token."),
    ("AUTH-003", "Token has expired."),
    ("AUTH-004", "Invalid refresh token."),
    // USER
    ("USER-001", "User not found."),
    ("USER-002", "This email is already in use."),
    ("USER-003", "This nickname is already in use."),
    (
        "USER-004",
        "Password must be 8-20 characters with at least one uppercase, one lowercase and one special character.",
    ),
    ("USER-005", "This account has been deactivated."),
    ("USER-006", "Password does not match."),
    ("USER-007", "You do not have permission."),
    // POST
    ("POST-001", "Post not found."),
    ("POST-002", "Only the author can edit or delete this post."),
    ("POST-003", "This post has already been deleted."),
    ("POST-004", "Invalid post status."),
    // COMMENT
    ("COMMENT-001", "Comment not found."),
    ("COMMENT-002", "Only the author can edit or delete this comment."),
    ("COMMENT-003", "This comment has already been deleted."),
    // LIKE
    ("LIKE-001", "You already liked this post."),
    ("LIKE-002", "Like not found."),
    // IMAGE
    ("IMAGE-001", "Image not found."),
    ("IMAGE-002", "File size must be 5MB or less."),
    ("IMAGE-003", "Unsupported file type (JPG, PNG and GIF only)."),
    // COMMON
    ("COMMON-001", "Invalid input."),
    ("COMMON-002", "Resource not found."),
    ("COMMON-003", "Resource conflict."),
    ("COMMON-004", "Too many requests. Please try again shortly."),
    ("COMMON-999", "A server error occurred."),
];

fn code_pattern() -> &'static Regex {
    static CODE_REGEX: OnceLock<Regex> = OnceLock::new();
    CODE_REGEX.get_or_init(|| Regex::new(r"[A-Z]{2,}-\d+").expect("Failed to compile code regex"))
}

/// A `<DOMAIN>-<NUMBER>` error code token
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ErrorCode(String);

impl ErrorCode {
    /// Extract the first code token from a raw server message
    pub fn extract(raw: &str) -> Option<Self> {
        code_pattern()
            .find(raw)
            .map(|m| ErrorCode(m.as_str().to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this code is one of the given constants
    pub fn is(&self, code: &str) -> bool {
        self.0 == code
    }

    pub fn is_credential_mismatch(&self) -> bool {
        CREDENTIAL_MISMATCH_CODES.contains(&self.0.as_str())
    }

    /// User-facing text for a known code
    pub fn message(&self) -> Option<&'static str> {
        MESSAGES
            .iter()
            .find(|(code, _)| *code == self.0)
            .map(|(_, text)| *text)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Translate a raw server message into user-facing text
///
/// Total: an unknown code, or no code at all, returns the raw message.
pub fn translate(raw: &str) -> String {
    ErrorCode::extract(raw)
        .and_then(|code| code.message())
        .map(str::to_string)
        .unwrap_or_else(|| raw.to_string())
}
