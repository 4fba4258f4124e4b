//! Post model and related payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::image::ImageId;
use crate::models::timestamp;
use crate::models::user::Author;

/// Post identifier
pub type PostId = i64;

/// Counters shown on a post
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostStats {
    #[serde(default, alias = "like_count")]
    pub like_count: u64,
    #[serde(default, alias = "comment_count")]
    pub comment_count: u64,
    #[serde(default, alias = "view_count")]
    pub view_count: u64,
}

/// Post, as listed in the feed or shown in detail
///
/// Feed entries omit the content and carry a single `imageUrl`; detail
/// responses carry `images` and the viewer's like flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(alias = "post_id")]
    pub post_id: PostId,
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub author: Author,
    #[serde(default, alias = "image_url")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default, alias = "image_id")]
    pub image_id: Option<ImageId>,
    #[serde(default)]
    pub stats: PostStats,
    #[serde(default, alias = "is_liked_by_current_user")]
    pub is_liked_by_current_user: bool,
    #[serde(default, alias = "created_at", deserialize_with = "timestamp::deserialize")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "updated_at", deserialize_with = "timestamp::deserialize")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Post {
    /// First image to show, from either representation
    pub fn primary_image(&self) -> Option<&str> {
        self.images
            .first()
            .map(String::as_str)
            .or(self.image_url.as_deref())
    }
}

/// One page of the feed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPage {
    #[serde(default)]
    pub posts: Vec<Post>,
    #[serde(default, alias = "next_cursor")]
    pub next_cursor: Option<i64>,
    #[serde(default, alias = "has_more")]
    pub has_more: bool,
}

/// New post payload
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub image_id: Option<ImageId>,
}

/// Post update payload
///
/// `remove_image` is an explicit removal signal; when it is set
/// `image_id` is not sent.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostUpdate {
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_id: Option<ImageId>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub remove_image: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn feed_entry_without_content_decodes() {
        let post: Post = serde_json::from_value(json!({
            "postId": 12,
            "title": "hello",
            "author": {"userId": 1, "nickname": "kim"},
            "imageUrl": "http://img/1.png",
            "stats": {"likeCount": 3, "commentCount": 1, "viewCount": 40},
            "createdAt": "2025-10-16T10:00:00"
        }))
        .unwrap();

        assert_eq!(post.content, "");
        assert_eq!(post.stats.view_count, 40);
        assert_eq!(post.primary_image(), Some("http://img/1.png"));
        assert!(post.created_at.is_some());
        assert!(!post.is_liked_by_current_user);
    }

    #[test]
    fn missing_stats_default_to_zero() {
        let post: Post = serde_json::from_value(json!({
            "postId": 1, "title": "t", "author": {"userId": 2}, "images": ["a", "b"]
        }))
        .unwrap();
        assert_eq!(post.stats, PostStats::default());
        assert_eq!(post.primary_image(), Some("a"));
    }

    #[test]
    fn update_sends_removal_signal_only_when_set() {
        let keep = serde_json::to_value(PostUpdate {
            title: "t".into(),
            content: "c".into(),
            image_id: Some(4),
            remove_image: false,
        })
        .unwrap();
        assert_eq!(keep, json!({"title": "t", "content": "c", "imageId": 4}));

        let remove = serde_json::to_value(PostUpdate {
            title: "t".into(),
            content: "c".into(),
            image_id: None,
            remove_image: true,
        })
        .unwrap();
        assert_eq!(remove, json!({"title": "t", "content": "c", "removeImage": true}));
    }

    #[test]
    fn new_post_sends_null_image() {
        let body = serde_json::to_value(NewPost {
            title: "t".into(),
            content: "c".into(),
            image_id: None,
        })
        .unwrap();
        assert_eq!(body["imageId"], serde_json::Value::Null);
    }
}
