//! Feed: cursor-paginated post list with automatic retry

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use common::ApiError;
use tracing::{debug, info, warn};

use crate::api::BoardApi;
use crate::config::ClientConfig;
use crate::controllers::SubmitGuard;
use crate::models::Post;

/// Result of asking for the next feed page
#[derive(Debug)]
pub enum FeedLoad {
    /// Posts appended by this load (empty on an empty first page)
    Loaded(Vec<Post>),
    /// There are no more pages
    Exhausted,
    /// A load was already running
    Ignored,
    /// Every attempt failed; call [`FeedController::retry`] to start over
    Failed { attempts: u32, error: ApiError },
}

#[derive(Debug)]
struct FeedState {
    posts: Vec<Post>,
    cursor: Option<i64>,
    has_more: bool,
}

pub struct FeedController {
    api: BoardApi,
    page_size: u32,
    max_retries: u32,
    retry_delay: Duration,
    state: Mutex<FeedState>,
    loading: SubmitGuard,
}

impl FeedController {
    pub fn new(api: BoardApi, config: &ClientConfig) -> Self {
        Self {
            api,
            page_size: config.feed_page_size,
            max_retries: config.feed_max_retries.max(1),
            retry_delay: config.feed_retry_delay(),
            state: Mutex::new(FeedState {
                posts: Vec::new(),
                cursor: None,
                has_more: true,
            }),
            loading: SubmitGuard::default(),
        }
    }

    /// Every post loaded so far
    pub fn posts(&self) -> Vec<Post> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).posts.clone()
    }

    pub fn has_more(&self) -> bool {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).has_more
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_busy()
    }

    /// Load the next page
    ///
    /// A server-side failure is retried automatically with exponential
    /// backoff, up to the configured number of attempts. The loading guard
    /// stays held across retries so scrolling cannot stack duplicate requests.
    /// An unreachable server or an expired session is never retried.
    pub async fn load_more(&self) -> FeedLoad {
        let Some(_ticket) = self.loading.try_begin() else {
            debug!("Feed load already running");
            return FeedLoad::Ignored;
        };

        let cursor = {
            let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if !state.has_more {
                return FeedLoad::Exhausted;
            }
            state.cursor
        };

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.api.list_posts(self.page_size, cursor).await {
                Ok(page) => {
                    let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
                    state.posts.extend(page.posts.iter().cloned());
                    state.cursor = page.next_cursor;
                    state.has_more = page.has_more && page.next_cursor.is_some();
                    info!(
                        "Loaded {} posts (more: {})",
                        page.posts.len(),
                        state.has_more
                    );
                    return FeedLoad::Loaded(page.posts);
                }
                Err(error @ (ApiError::AuthenticationExpired | ApiError::Unreachable(_))) => {
                    warn!("Feed load failed, not retrying: {}", error);
                    return FeedLoad::Failed {
                        attempts: attempt,
                        error,
                    };
                }
                Err(error) if attempt >= self.max_retries => {
                    warn!("Giving up on feed after {} attempts: {}", attempt, error);
                    return FeedLoad::Failed {
                        attempts: attempt,
                        error,
                    };
                }
                Err(error) => {
                    let delay = self.retry_delay * 2u32.saturating_pow(attempt - 1);
                    warn!(
                        "Feed load failed (attempt {}/{}), retrying in {:?}: {}",
                        attempt, self.max_retries, delay, error
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Start over after a failure, keeping the posts already shown
    pub async fn retry(&self) -> FeedLoad {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).has_more = true;
        self.load_more().await
    }

    /// Drop everything and load the first page again
    pub async fn reload(&self) -> FeedLoad {
        {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            state.posts.clear();
            state.cursor = None;
            state.has_more = true;
        }
        self.load_more().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controllers::fixtures;
    use crate::testing::{self, MockTransport};
    use reqwest::StatusCode;
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn config(max_retries: u32) -> ClientConfig {
        ClientConfig {
            feed_page_size: 2,
            feed_max_retries: max_retries,
            feed_retry_delay_ms: 1,
            ..ClientConfig::default()
        }
    }

    #[tokio::test]
    async fn follows_cursor_until_exhausted() {
        let transport = Arc::new(MockTransport::new(|req| async move {
            let second = req.query.iter().any(|(k, v)| k == "cursor" && v == "2");
            if second {
                testing::data(
                    StatusCode::OK,
                    json!({"posts": [fixtures::post_json(1, 1)], "nextCursor": null, "hasMore": false}),
                )
            } else {
                testing::data(
                    StatusCode::OK,
                    json!({
                        "posts": [fixtures::post_json(3, 1), fixtures::post_json(2, 1)],
                        "nextCursor": 2,
                        "hasMore": true
                    }),
                )
            }
        }));
        let (api, _) = fixtures::client(&transport, None);
        let feed = FeedController::new(api, &config(3));

        assert!(matches!(feed.load_more().await, FeedLoad::Loaded(posts) if posts.len() == 2));
        assert!(matches!(feed.load_more().await, FeedLoad::Loaded(posts) if posts.len() == 1));
        assert!(matches!(feed.load_more().await, FeedLoad::Exhausted));

        let ids: Vec<_> = feed.posts().iter().map(|p| p.post_id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
        assert_eq!(transport.count("/posts"), 2);
    }

    #[tokio::test]
    async fn server_errors_are_retried() {
        let calls = Arc::new(AtomicUsize::new(0));
        let transport = {
            let calls = Arc::clone(&calls);
            Arc::new(MockTransport::new(move |_req| {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        testing::failure(StatusCode::BAD_GATEWAY, "COMMON-999: upstream down")
                    } else {
                        testing::data(StatusCode::OK, json!({"posts": [], "hasMore": false}))
                    }
                }
            }))
        };
        let (api, _) = fixtures::client(&transport, None);
        let feed = FeedController::new(api, &config(5));

        assert!(matches!(feed.load_more().await, FeedLoad::Loaded(posts) if posts.is_empty()));
        assert_eq!(transport.count("/posts"), 3);
        assert!(!feed.has_more());
    }

    #[tokio::test]
    async fn unreachable_server_is_not_retried() {
        let transport = Arc::new(MockTransport::new(|_req| async { testing::unreachable() }));
        let (api, _) = fixtures::client(&transport, None);
        let feed = FeedController::new(api, &config(5));

        let outcome = feed.load_more().await;

        let FeedLoad::Failed { attempts, error } = outcome else {
            panic!("expected failure");
        };
        assert_eq!(attempts, 1);
        assert!(error.is_unreachable());
        assert_eq!(transport.count("/posts"), 1);
        assert!(!feed.is_loading());
    }

    #[tokio::test]
    async fn gives_up_after_max_retries_and_can_start_over() {
        let transport = Arc::new(MockTransport::new(|_req| async {
            testing::failure(StatusCode::INTERNAL_SERVER_ERROR, "COMMON-999: boom")
        }));
        let (api, _) = fixtures::client(&transport, None);
        let feed = FeedController::new(api, &config(3));

        let FeedLoad::Failed { attempts, error } = feed.load_more().await else {
            panic!("expected failure");
        };
        assert_eq!(attempts, 3);
        assert_eq!(error.user_message(), "A server error occurred.");
        assert!(!feed.is_loading());

        assert!(matches!(feed.retry().await, FeedLoad::Failed { attempts: 3, .. }));
        assert_eq!(transport.count("/posts"), 6);
    }

    #[tokio::test]
    async fn expired_session_is_not_retried() {
        let transport = Arc::new(MockTransport::new(|_req| async {
            testing::failure(StatusCode::UNAUTHORIZED, "AUTH-003: Token expired")
        }));
        let (api, _) = fixtures::client(&transport, Some(1));
        let feed = FeedController::new(api, &config(5));

        let outcome = feed.load_more().await;

        assert!(matches!(
            outcome,
            FeedLoad::Failed {
                attempts: 1,
                error: ApiError::AuthenticationExpired
            }
        ));
        assert_eq!(transport.count("/posts"), 1);
    }
}
