//! User model and related payloads

use serde::{Deserialize, Serialize};

use crate::models::image::ImageFile;
use crate::session::UserId;

/// User profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(alias = "user_id")]
    pub user_id: UserId,
    #[serde(default)]
    pub email: String,
    pub nickname: String,
    #[serde(default, alias = "profile_image")]
    pub profile_image: Option<String>,
}

/// Author summary embedded in posts and comments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    #[serde(alias = "user_id")]
    pub user_id: UserId,
    #[serde(default)]
    pub nickname: String,
    #[serde(default, alias = "profile_image")]
    pub profile_image: Option<String>,
}

impl Author {
    /// Name to display; the API may omit it for deleted accounts
    pub fn display_name(&self) -> &str {
        if self.nickname.is_empty() {
            "Unknown"
        } else {
            &self.nickname
        }
    }
}

/// What to do with the profile image on update
#[derive(Debug, Clone, Default)]
pub enum ProfileImageChange {
    #[default]
    Keep,
    Replace(ImageFile),
    Remove,
}

/// Profile update payload, sent as multipart form data
#[derive(Debug, Clone)]
pub struct ProfileUpdate {
    pub nickname: String,
    pub image: ProfileImageChange,
}

/// Password change payload
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChange {
    pub new_password: String,
    pub new_password_confirm: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn user_accepts_camel_and_snake_case() {
        let camel: User = serde_json::from_value(json!({
            "userId": 3, "email": "a@b.c", "nickname": "kim", "profileImage": "http://img"
        }))
        .unwrap();
        let snake: User = serde_json::from_value(json!({
            "user_id": 3, "email": "a@b.c", "nickname": "kim", "profile_image": "http://img"
        }))
        .unwrap();
        assert_eq!(camel, snake);
    }

    #[test]
    fn anonymous_author_has_placeholder_name() {
        let author: Author = serde_json::from_value(json!({"userId": 1})).unwrap();
        assert_eq!(author.display_name(), "Unknown");
    }

    #[test]
    fn password_change_is_camel_case() {
        let body = serde_json::to_value(PasswordChange {
            new_password: "Secret!23".into(),
            new_password_confirm: "Secret!23".into(),
        })
        .unwrap();
        assert_eq!(body, json!({"newPassword": "Secret!23", "newPasswordConfirm": "Secret!23"}));
    }
}
