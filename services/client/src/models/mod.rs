//! Board API payloads

pub mod auth;
pub mod comment;
pub mod image;
pub mod post;
pub mod user;

// Re-export for convenience
pub use auth::{AuthTokens, LoginCredentials, Registration};
pub use comment::{Comment, CommentId, CommentPage, Pagination};
pub use image::{ImageFile, ImageId, ImageUpload};
pub use post::{NewPost, Post, PostId, PostPage, PostStats, PostUpdate};
pub use user::{Author, PasswordChange, ProfileImageChange, ProfileUpdate, User};

/// Lenient timestamp decoding
///
/// The API sends RFC 3339 strings, or naive `YYYY-MM-DDTHH:MM:SS[.fff]`
/// strings in UTC. Anything else decodes as `None` instead of failing the
/// whole payload.
pub(crate) mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().and_then(parse))
    }

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Some(parsed.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
            .ok()
            .map(|naive| naive.and_utc())
    }

}
