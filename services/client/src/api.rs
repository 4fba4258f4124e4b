//! Typed board API
//!
//! Thin request builders over [`ApiGateway`]. Every call is authenticated,
//! refreshed and classified by the gateway; nothing here inspects errors.

use std::sync::Arc;

use common::ApiResult;

use crate::gateway::ApiGateway;
use crate::models::comment::CommentBody;
use crate::models::{
    AuthTokens, Comment, CommentId, CommentPage, ImageFile, ImageUpload, LoginCredentials, NewPost,
    PasswordChange, Post, PostId, PostPage, PostUpdate, ProfileImageChange, ProfileUpdate,
    Registration, User,
};
use crate::session::UserId;
use crate::transport::{ApiRequest, FormPart};

/// Sort order requested for the feed
const FEED_SORT: &str = "latest";

/// Board API client
#[derive(Clone)]
pub struct BoardApi {
    gateway: Arc<ApiGateway>,
}

impl BoardApi {
    pub fn new(gateway: Arc<ApiGateway>) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &Arc<ApiGateway> {
        &self.gateway
    }

    // Auth

    pub async fn login(&self, credentials: &LoginCredentials) -> ApiResult<AuthTokens> {
        self.gateway
            .call(ApiRequest::post("/auth/login").json(credentials))
            .await
    }

    pub async fn register(&self, registration: &Registration) -> ApiResult<AuthTokens> {
        let mut parts = vec![
            text_part("email", &registration.email),
            text_part("password", &registration.password),
            text_part("nickname", &registration.nickname),
        ];
        if let Some(image) = &registration.profile_image {
            parts.push(image.to_part("profileImage"));
        }

        self.gateway
            .call(ApiRequest::post("/users/signup").multipart(parts))
            .await
    }

    pub async fn logout(&self) -> ApiResult<()> {
        self.gateway.execute(ApiRequest::post("/auth/logout")).await
    }

    // Users

    pub async fn get_user(&self, user_id: UserId) -> ApiResult<User> {
        self.gateway
            .call(ApiRequest::get(format!("/users/{user_id}")))
            .await
    }

    pub async fn update_profile(&self, user_id: UserId, update: &ProfileUpdate) -> ApiResult<()> {
        let mut parts = vec![text_part("nickname", &update.nickname)];
        match &update.image {
            ProfileImageChange::Keep => {}
            ProfileImageChange::Replace(image) => parts.push(image.to_part("profileImage")),
            ProfileImageChange::Remove => parts.push(text_part("removeImage", "true")),
        }

        self.gateway
            .execute(ApiRequest::patch(format!("/users/{user_id}")).multipart(parts))
            .await
    }

    pub async fn change_password(&self, user_id: UserId, change: &PasswordChange) -> ApiResult<()> {
        self.gateway
            .execute(ApiRequest::patch(format!("/users/{user_id}/password")).json(change))
            .await
    }

    /// Deactivate the account
    pub async fn withdraw(&self, user_id: UserId) -> ApiResult<()> {
        self.gateway
            .execute(ApiRequest::put(format!("/users/{user_id}")))
            .await
    }

    // Posts

    /// Fetch a feed page; `cursor` is the previous page's `nextCursor`
    pub async fn list_posts(&self, limit: u32, cursor: Option<i64>) -> ApiResult<PostPage> {
        let mut request = ApiRequest::get("/posts")
            .query("limit", limit)
            .query("sort", FEED_SORT);
        if let Some(cursor) = cursor {
            request = request.query("cursor", cursor);
        }
        self.gateway.call(request).await
    }

    pub async fn get_post(&self, post_id: PostId) -> ApiResult<Post> {
        self.gateway
            .call(ApiRequest::get(format!("/posts/{post_id}")))
            .await
    }

    pub async fn create_post(&self, post: &NewPost) -> ApiResult<Post> {
        self.gateway
            .call(ApiRequest::post("/posts").json(post))
            .await
    }

    pub async fn update_post(&self, post_id: PostId, update: &PostUpdate) -> ApiResult<()> {
        self.gateway
            .execute(ApiRequest::patch(format!("/posts/{post_id}")).json(update))
            .await
    }

    pub async fn delete_post(&self, post_id: PostId) -> ApiResult<()> {
        self.gateway
            .execute(ApiRequest::delete(format!("/posts/{post_id}")))
            .await
    }

    // Likes

    pub async fn like(&self, post_id: PostId) -> ApiResult<()> {
        self.gateway
            .execute(ApiRequest::post(format!("/posts/{post_id}/like")))
            .await
    }

    pub async fn unlike(&self, post_id: PostId) -> ApiResult<()> {
        self.gateway
            .execute(ApiRequest::delete(format!("/posts/{post_id}/like")))
            .await
    }

    // Comments

    pub async fn list_comments(&self, post_id: PostId, offset: u32, limit: u32) -> ApiResult<CommentPage> {
        self.gateway
            .call(
                ApiRequest::get(format!("/posts/{post_id}/comments"))
                    .query("offset", offset)
                    .query("limit", limit),
            )
            .await
    }

    pub async fn create_comment(&self, post_id: PostId, content: &str) -> ApiResult<Comment> {
        self.gateway
            .call(
                ApiRequest::post(format!("/posts/{post_id}/comments"))
                    .json(&CommentBody { comment: content }),
            )
            .await
    }

    /// Update a comment; the server may answer 204 without the updated comment
    pub async fn update_comment(
        &self,
        post_id: PostId,
        comment_id: CommentId,
        content: &str,
    ) -> ApiResult<Option<Comment>> {
        self.gateway
            .call(
                ApiRequest::patch(format!("/posts/{post_id}/comments/{comment_id}"))
                    .json(&CommentBody { comment: content }),
            )
            .await
    }

    pub async fn delete_comment(&self, post_id: PostId, comment_id: CommentId) -> ApiResult<()> {
        self.gateway
            .execute(ApiRequest::delete(format!(
                "/posts/{post_id}/comments/{comment_id}"
            )))
            .await
    }

    // Images

    pub async fn upload_image(&self, image: &ImageFile) -> ApiResult<ImageUpload> {
        self.gateway
            .call(ApiRequest::post("/images").multipart(vec![image.to_part("file")]))
            .await
    }
}

fn text_part(name: &str, value: &str) -> FormPart {
    FormPart::Text {
        name: name.to_string(),
        value: value.to_string(),
    }
}
