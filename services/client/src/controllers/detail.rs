//! Post detail: post body, like toggle, comments

use std::sync::{Mutex, PoisonError};

use common::{ApiError, ApiResult, codes};
use tracing::{info, warn};

use crate::api::BoardApi;
use crate::auth::AuthService;
use crate::comments::{CommentThread, ThreadState};
use crate::controllers::{Feedback, Field, Navigation, Submission};
use crate::like::{LikeState, LikeToggle};
use crate::models::{CommentId, CommentPage, Post, PostId};
use crate::session::UserId;

/// Comments requested with the post
const COMMENT_PAGE_LIMIT: u32 = 100;

pub struct PostDetailController {
    api: BoardApi,
    auth: AuthService,
    post_id: PostId,
    viewer: Option<UserId>,
    post: Mutex<Post>,
    like: LikeToggle,
    comments: CommentThread,
}

impl PostDetailController {
    /// Load a post and its comments concurrently
    ///
    /// Fails when the post cannot be loaded; the caller goes back to the
    /// feed. A comment load failure only leaves the thread empty, unless it
    /// says the post is gone.
    pub async fn open(api: BoardApi, auth: AuthService, post_id: PostId) -> ApiResult<Self> {
        let (post, comments) = tokio::join!(
            api.get_post(post_id),
            api.list_comments(post_id, 0, COMMENT_PAGE_LIMIT)
        );
        let post = post?;
        let comments = match comments {
            Ok(page) => page,
            Err(e) if e.has_code(codes::POST_NOT_FOUND) => return Err(e),
            Err(e) => {
                warn!("Failed to load comments of post {}: {}", post_id, e);
                CommentPage::default()
            }
        };

        Ok(Self {
            viewer: auth.current_user_id(),
            like: LikeToggle::new(post_id, LikeState::of(&post)),
            comments: CommentThread::from_page(post_id, comments),
            post: Mutex::new(post),
            post_id,
            api,
            auth,
        })
    }

    pub fn post_id(&self) -> PostId {
        self.post_id
    }

    /// Post as loaded, with the live like state applied
    pub fn post(&self) -> Post {
        let mut post = self.post.lock().unwrap_or_else(PoisonError::into_inner).clone();
        let like = self.like.state();
        post.is_liked_by_current_user = like.liked;
        post.stats.like_count = like.count;
        post.stats.comment_count = self.comments.total();
        post
    }

    /// Whether the viewer wrote the post (may edit or delete it, may not like it)
    pub fn is_owner(&self) -> bool {
        let author = self.post.lock().unwrap_or_else(PoisonError::into_inner).author.user_id;
        self.viewer == Some(author)
    }

    /// Whether the viewer wrote the comment
    pub fn owns_comment(&self, comment_id: CommentId) -> bool {
        self.comments
            .state()
            .comments
            .iter()
            .any(|c| c.comment_id == comment_id && Some(c.author.user_id) == self.viewer)
    }

    pub fn like_state(&self) -> LikeState {
        self.like.state()
    }

    pub fn comments(&self) -> ThreadState {
        self.comments.state()
    }

    pub async fn toggle_like(&self) -> Submission<LikeState> {
        if !self.auth.is_authenticated() {
            return Submission::Rejected(Feedback::LoginRequired);
        }
        if self.is_owner() {
            return Submission::Rejected(Feedback::Notice("You cannot like your own post.".into()));
        }

        let outcome = self.like.toggle(&self.api).await;
        let state = self.like.state();
        Submission::from_outcome(outcome, state, "")
    }

    /// Submit the comment form: create, or update the comment being edited
    pub async fn submit_comment(&self, content: &str) -> Submission<ThreadState> {
        if self.comments.is_submitting() {
            return Submission::Ignored;
        }
        if !self.auth.is_authenticated() {
            return Submission::Rejected(Feedback::LoginRequired);
        }
        let content = content.trim();
        if content.is_empty() {
            return Submission::Rejected(Feedback::field(Field::Comment, "Please enter a comment."));
        }

        let outcome = self.comments.submit(&self.api, content).await;
        Submission::from_outcome(outcome, self.comments.state(), &deleted_comment_notice())
    }

    /// Start editing one of the viewer's comments; returns its content
    pub fn begin_edit(&self, comment_id: CommentId) -> Option<String> {
        if !self.owns_comment(comment_id) {
            return None;
        }
        self.comments.begin_edit(comment_id)
    }

    pub fn cancel_edit(&self) {
        self.comments.cancel_edit();
    }

    pub async fn delete_comment(&self, comment_id: CommentId) -> Submission<ThreadState> {
        let outcome = self.comments.delete(&self.api, comment_id).await;
        Submission::from_outcome(outcome, self.comments.state(), &deleted_comment_notice())
    }

    pub async fn delete_post(&self) -> Submission<Navigation> {
        match self.api.delete_post(self.post_id).await {
            Ok(()) => {
                info!("Deleted post {}", self.post_id);
                Submission::Completed(Navigation::Feed)
            }
            Err(e) => Submission::from_error(&e),
        }
    }

    /// Reload post and comments after returning to the screen
    pub async fn refresh(&self) -> ApiResult<()> {
        let (post, comments) = tokio::join!(
            self.api.get_post(self.post_id),
            self.api.list_comments(self.post_id, 0, COMMENT_PAGE_LIMIT)
        );
        let post = post?;
        self.like.reset(LikeState::of(&post));
        *self.post.lock().unwrap_or_else(PoisonError::into_inner) = post;
        match comments {
            Ok(page) => {
                self.comments.replace(page);
            }
            Err(e @ ApiError::AuthenticationExpired) => return Err(e),
            Err(e) => warn!("Failed to reload comments of post {}: {}", self.post_id, e),
        }
        Ok(())
    }
}

fn deleted_comment_notice() -> String {
    common::translate(codes::COMMENT_ALREADY_DELETED)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controllers::fixtures;
    use crate::testing::{self, MockTransport};
    use reqwest::{Method, StatusCode};
    use serde_json::json;
    use std::sync::Arc;

    fn detail_transport(author_id: i64) -> Arc<MockTransport> {
        Arc::new(MockTransport::new(move |req| async move {
            match (req.method.clone(), req.path.as_str()) {
                (Method::GET, "/posts/7") => {
                    testing::data(StatusCode::OK, fixtures::post_json(7, author_id))
                }
                (Method::GET, "/posts/7/comments") => testing::data(
                    StatusCode::OK,
                    json!({
                        "comments": [fixtures::comment_json(1, 2), fixtures::comment_json(2, 3)],
                        "pagination": {"total_count": 57}
                    }),
                ),
                (Method::POST, "/posts/7/comments") => {
                    testing::data(StatusCode::CREATED, fixtures::comment_json(99, 2))
                }
                _ => testing::no_content(),
            }
        }))
    }

    #[tokio::test]
    async fn opens_post_with_comments_and_total() {
        let transport = detail_transport(1);
        let (api, auth) = fixtures::client(&transport, Some(2));

        let detail = PostDetailController::open(api, auth, 7).await.unwrap();

        assert_eq!(detail.post().title, "post 7");
        assert_eq!(detail.post().stats.view_count, 100);
        assert_eq!(detail.comments().comments.len(), 2);
        assert_eq!(detail.comments().total, 57);
        assert!(!detail.is_owner());
        assert!(detail.owns_comment(1));
        assert!(!detail.owns_comment(2));
    }

    #[tokio::test]
    async fn missing_post_fails_to_open() {
        let transport = Arc::new(MockTransport::new(|_req| async {
            testing::failure(StatusCode::NOT_FOUND, "POST-001: Post not found")
        }));
        let (api, auth) = fixtures::client(&transport, None);

        let err = PostDetailController::open(api, auth, 7).await.err().unwrap();
        assert!(err.has_code(codes::POST_NOT_FOUND));
    }

    #[tokio::test]
    async fn owner_cannot_like_own_post() {
        let transport = detail_transport(2);
        let (api, auth) = fixtures::client(&transport, Some(2));
        let detail = PostDetailController::open(api, auth, 7).await.unwrap();

        assert!(detail.is_owner());
        assert!(matches!(
            detail.toggle_like().await,
            Submission::Rejected(Feedback::Notice(_))
        ));
        assert_eq!(transport.count("/posts/7/like"), 0);
    }

    #[tokio::test]
    async fn anonymous_viewer_must_log_in_to_like_or_comment() {
        let transport = detail_transport(1);
        let (api, auth) = fixtures::client(&transport, None);
        let detail = PostDetailController::open(api, auth, 7).await.unwrap();

        assert_eq!(detail.toggle_like().await, Submission::Rejected(Feedback::LoginRequired));
        assert!(matches!(
            detail.submit_comment("hi").await,
            Submission::Rejected(Feedback::LoginRequired)
        ));
    }

    #[tokio::test]
    async fn like_updates_displayed_post() {
        let transport = detail_transport(1);
        let (api, auth) = fixtures::client(&transport, Some(2));
        let detail = PostDetailController::open(api, auth, 7).await.unwrap();

        let result = detail.toggle_like().await;

        assert_eq!(result, Submission::Completed(LikeState { liked: true, count: 11 }));
        assert!(detail.post().is_liked_by_current_user);
        assert_eq!(detail.post().stats.like_count, 11);
    }

    #[tokio::test]
    async fn failed_like_repair_shows_generic_notice() {
        let transport = Arc::new(MockTransport::new(|req| async move {
            match (req.method.clone(), req.path.as_str()) {
                (Method::GET, "/posts/7") => testing::data(StatusCode::OK, fixtures::post_json(7, 1)),
                (Method::GET, _) => testing::data(StatusCode::OK, json!({"comments": []})),
                (Method::POST, _) => testing::failure(StatusCode::CONFLICT, "LIKE-001: Already liked"),
                _ => testing::failure(StatusCode::NOT_FOUND, "LIKE-002: Like not found"),
            }
        }));
        let (api, auth) = fixtures::client(&transport, Some(2));
        let detail = PostDetailController::open(api, auth, 7).await.unwrap();

        let result = detail.toggle_like().await;

        assert_eq!(
            result,
            Submission::Rejected(Feedback::Notice("Failed to process the like.".into()))
        );
        assert_eq!(detail.like_state(), LikeState { liked: false, count: 10 });
    }

    #[tokio::test]
    async fn comment_submit_and_delete_track_total() {
        let transport = detail_transport(1);
        let (api, auth) = fixtures::client(&transport, Some(2));
        let detail = PostDetailController::open(api, auth, 7).await.unwrap();

        assert!(matches!(
            detail.submit_comment("  ").await,
            Submission::Rejected(Feedback::Field { field: Field::Comment, .. })
        ));

        let created = detail.submit_comment("new comment").await;
        assert!(matches!(created, Submission::Completed(ref state) if state.total == 58));

        let deleted = detail.delete_comment(1).await;
        assert!(matches!(deleted, Submission::Completed(ref state) if state.total == 57));
        assert_eq!(detail.post().stats.comment_count, 57);
    }

    #[tokio::test]
    async fn only_own_comments_can_be_edited() {
        let transport = detail_transport(1);
        let (api, auth) = fixtures::client(&transport, Some(2));
        let detail = PostDetailController::open(api, auth, 7).await.unwrap();

        assert!(detail.begin_edit(2).is_none());
        assert_eq!(detail.begin_edit(1).as_deref(), Some("comment 1"));
        detail.cancel_edit();
        assert_eq!(detail.comments().editing, None);
    }

    #[tokio::test]
    async fn deleting_post_returns_to_feed() {
        let transport = detail_transport(2);
        let (api, auth) = fixtures::client(&transport, Some(2));
        let detail = PostDetailController::open(api, auth, 7).await.unwrap();

        assert_eq!(detail.delete_post().await, Submission::Completed(Navigation::Feed));
        assert_eq!(transport.count_method(Method::DELETE, "/posts/7"), 1);
    }
}
