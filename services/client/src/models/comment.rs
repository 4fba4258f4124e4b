//! Comment model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::timestamp;
use crate::models::user::Author;

/// Comment identifier
pub type CommentId = i64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(alias = "comment_id")]
    pub comment_id: CommentId,
    #[serde(alias = "comment")]
    pub content: String,
    pub author: Author,
    #[serde(default, alias = "created_at", deserialize_with = "timestamp::deserialize")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Offset pagination metadata
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default, alias = "totalCount")]
    pub total_count: u64,
}

/// One page of comments
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommentPage {
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub pagination: Pagination,
}

/// Create/update payload
#[derive(Debug, Clone, Serialize)]
pub(crate) struct CommentBody<'a> {
    pub comment: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn total_comes_from_pagination() {
        let page: CommentPage = serde_json::from_value(json!({
            "comments": [{
                "commentId": 1,
                "content": "first",
                "author": {"userId": 2, "nickname": "lee"},
                "createdAt": "2025-10-16T10:00:00Z"
            }],
            "pagination": {"total_count": 57}
        }))
        .unwrap();

        assert_eq!(page.comments.len(), 1);
        assert_eq!(page.pagination.total_count, 57);
    }

    #[test]
    fn missing_pagination_is_zero() {
        let page: CommentPage = serde_json::from_value(json!({"comments": []})).unwrap();
        assert_eq!(page.pagination.total_count, 0);
    }
}
