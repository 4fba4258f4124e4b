//! Authentication payloads

use serde::{Deserialize, Serialize};

use crate::models::image::ImageFile;
use crate::session::UserId;

/// Login request body
#[derive(Debug, Clone, Serialize)]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

/// Payload of a successful login, registration or refresh
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthTokens {
    #[serde(default, alias = "access_token")]
    pub access_token: Option<String>,
    #[serde(default, alias = "user_id")]
    pub user_id: Option<UserId>,
}

/// Sign-up form, sent as multipart form data
#[derive(Debug, Clone)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub nickname: String,
    pub profile_image: Option<ImageFile>,
}
