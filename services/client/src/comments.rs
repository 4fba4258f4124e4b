//! Comment thread of a post
//!
//! The visible list may be a subset of all comments, so the total is the
//! server-reported count adjusted by one per create or delete, never the
//! list length. One mutation at a time per thread; further submissions are
//! ignored until it settles.

use common::codes;
use tracing::{debug, info, warn};

use crate::api::BoardApi;
use crate::models::{Comment, CommentId, CommentPage, PostId};
use crate::optimistic::{MutationOutcome, OptimisticCell, Pending};

/// Comments shown for one post
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThreadState {
    /// Loaded comments, newest first
    pub comments: Vec<Comment>,
    /// Total number of comments on the post
    pub total: u64,
    /// Comment being edited, if any
    pub editing: Option<CommentId>,
}

impl ThreadState {
    fn remove(&mut self, comment_id: CommentId) {
        self.comments.retain(|c| c.comment_id != comment_id);
        self.total = self.total.saturating_sub(1);
        if self.editing == Some(comment_id) {
            self.editing = None;
        }
    }
}

/// Whether the error means the comment no longer exists
fn is_gone(error: &common::ApiError) -> bool {
    error.has_code(codes::COMMENT_NOT_FOUND) || error.has_code(codes::COMMENT_ALREADY_DELETED)
}

#[derive(Debug)]
pub struct CommentThread {
    post_id: PostId,
    state: OptimisticCell<ThreadState>,
}

impl CommentThread {
    pub fn new(post_id: PostId) -> Self {
        Self {
            post_id,
            state: OptimisticCell::new(ThreadState::default()),
        }
    }

    /// Thread seeded from a loaded page
    pub fn from_page(post_id: PostId, page: CommentPage) -> Self {
        let thread = Self::new(post_id);
        thread.state.set(ThreadState {
            comments: page.comments,
            total: page.pagination.total_count,
            editing: None,
        });
        thread
    }

    pub fn state(&self) -> ThreadState {
        self.state.get()
    }

    pub fn total(&self) -> u64 {
        self.state.get().total
    }

    pub fn is_submitting(&self) -> bool {
        self.state.is_pending()
    }

    /// Replace the loaded comments with a fresh page
    pub fn replace(&self, page: CommentPage) -> bool {
        self.state.set(ThreadState {
            comments: page.comments,
            total: page.pagination.total_count,
            editing: None,
        })
    }

    /// Enter edit mode for a comment; returns its current content
    pub fn begin_edit(&self, comment_id: CommentId) -> Option<String> {
        let mut state = self.state.get();
        let content = state
            .comments
            .iter()
            .find(|c| c.comment_id == comment_id)?
            .content
            .clone();
        state.editing = Some(comment_id);
        self.state.set(state).then_some(content)
    }

    pub fn cancel_edit(&self) {
        let mut state = self.state.get();
        if state.editing.take().is_some() {
            self.state.set(state);
        }
    }

    /// Create a comment, or update the one in edit mode
    pub async fn submit(&self, api: &BoardApi, content: &str) -> MutationOutcome {
        let mut editing = None;
        let Some(pending) = self.state.begin(|state| {
            editing = state.editing;
            if let Some(comment_id) = editing {
                if let Some(comment) = state.comments.iter_mut().find(|c| c.comment_id == comment_id) {
                    comment.content = content.to_string();
                }
            }
        }) else {
            debug!("Comment submission for post {} already pending", self.post_id);
            return MutationOutcome::Ignored;
        };

        match editing {
            Some(comment_id) => self.update(api, pending, comment_id, content).await,
            None => self.create(api, pending, content).await,
        }
    }

    async fn create(&self, api: &BoardApi, pending: Pending<ThreadState>, content: &str) -> MutationOutcome {
        match api.create_comment(self.post_id, content).await {
            Ok(comment) => {
                pending.update(|state| {
                    state.comments.insert(0, comment);
                    state.total += 1;
                });
                pending.commit();
                MutationOutcome::Applied
            }
            Err(e) => {
                warn!("Failed to create comment on post {}: {}", self.post_id, e);
                pending.rollback();
                MutationOutcome::RolledBack(e)
            }
        }
    }

    async fn update(
        &self,
        api: &BoardApi,
        pending: Pending<ThreadState>,
        comment_id: CommentId,
        content: &str,
    ) -> MutationOutcome {
        match api.update_comment(self.post_id, comment_id, content).await {
            Ok(updated) => {
                pending.update(|state| {
                    if let Some(updated) = updated {
                        if let Some(slot) = state.comments.iter_mut().find(|c| c.comment_id == comment_id) {
                            *slot = updated;
                        }
                    }
                    state.editing = None;
                });
                pending.commit();
                MutationOutcome::Applied
            }
            Err(e) if is_gone(&e) => {
                info!("Comment {} is gone, removing it from the thread", comment_id);
                pending.update(|state| state.remove(comment_id));
                pending.commit();
                MutationOutcome::Reconciled
            }
            Err(e) => {
                warn!("Failed to update comment {}: {}", comment_id, e);
                pending.rollback();
                MutationOutcome::RolledBack(e)
            }
        }
    }

    /// Delete a comment, removing it from the list before the server answers
    pub async fn delete(&self, api: &BoardApi, comment_id: CommentId) -> MutationOutcome {
        let Some(pending) = self.state.begin(|state| state.remove(comment_id)) else {
            debug!("Comment mutation for post {} already pending", self.post_id);
            return MutationOutcome::Ignored;
        };

        match api.delete_comment(self.post_id, comment_id).await {
            Ok(()) => {
                pending.commit();
                MutationOutcome::Applied
            }
            Err(e) if is_gone(&e) => {
                info!("Comment {} was already deleted", comment_id);
                pending.commit();
                MutationOutcome::Reconciled
            }
            Err(e) => {
                warn!("Failed to delete comment {}, restoring it: {}", comment_id, e);
                pending.rollback();
                MutationOutcome::RolledBack(e)
            }
        }
    }
}
