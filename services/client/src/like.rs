//! Like toggle
//!
//! The like flag and counter flip immediately and are confirmed or restored
//! when the server answers. A "already liked" rejection means the server was
//! ahead of the local flag: the flag is corrected and a compensating unlike
//! is sent so the post ends up not liked, which is what the stale flag
//! showed the user. If that unlike also fails the snapshot is restored and
//! the toggle reports `RepairFailed`.

use std::sync::{Mutex, PoisonError};

use common::codes;
use tracing::{debug, info, warn};

use crate::api::BoardApi;
use crate::models::{Post, PostId};
use crate::optimistic::{MutationOutcome, OptimisticCell};

/// Displayed like flag and counter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LikeState {
    pub liked: bool,
    pub count: u64,
}

impl LikeState {
    pub fn of(post: &Post) -> Self {
        Self {
            liked: post.is_liked_by_current_user,
            count: post.stats.like_count,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeDirection {
    Like,
    Unlike,
}

impl LikeDirection {
    fn from_state(state: &LikeState) -> Self {
        if state.liked {
            LikeDirection::Unlike
        } else {
            LikeDirection::Like
        }
    }

    fn apply(self, state: &mut LikeState) {
        match self {
            LikeDirection::Like => {
                state.liked = true;
                state.count += 1;
            }
            LikeDirection::Unlike => {
                state.liked = false;
                state.count = state.count.saturating_sub(1);
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikePhase {
    Idle,
    Pending(LikeDirection),
}

/// Like toggle for one post
#[derive(Debug)]
pub struct LikeToggle {
    post_id: PostId,
    state: OptimisticCell<LikeState>,
    in_flight: Mutex<Option<LikeDirection>>,
}

impl LikeToggle {
    pub fn new(post_id: PostId, initial: LikeState) -> Self {
        Self {
            post_id,
            state: OptimisticCell::new(initial),
            in_flight: Mutex::new(None),
        }
    }

    /// Currently displayed state
    pub fn state(&self) -> LikeState {
        self.state.get()
    }

    pub fn phase(&self) -> LikePhase {
        match *self.in_flight.lock().unwrap_or_else(PoisonError::into_inner) {
            Some(direction) => LikePhase::Pending(direction),
            None => LikePhase::Idle,
        }
    }

    /// Replace the displayed state with server truth (e.g. after a reload)
    pub fn reset(&self, state: LikeState) -> bool {
        self.state.set(state)
    }

    /// Mark a call in flight until the returned guard is dropped
    fn mark_in_flight(&self, direction: LikeDirection) -> InFlight<'_> {
        *self.in_flight.lock().unwrap_or_else(PoisonError::into_inner) = Some(direction);
        InFlight {
            slot: &self.in_flight,
        }
    }

    /// Toggle the like, optimistically
    ///
    /// Returns [`MutationOutcome::Ignored`] while a previous toggle is still
    /// pending.
    pub async fn toggle(&self, api: &BoardApi) -> MutationOutcome {
        let mut direction = LikeDirection::Like;
        let Some(pending) = self.state.begin(|state| {
            direction = LikeDirection::from_state(state);
            direction.apply(state);
        }) else {
            debug!("Like toggle for post {} already pending", self.post_id);
            return MutationOutcome::Ignored;
        };
        let _in_flight = self.mark_in_flight(direction);

        let result = match direction {
            LikeDirection::Like => api.like(self.post_id).await,
            LikeDirection::Unlike => api.unlike(self.post_id).await,
        };

        let outcome = match result {
            Ok(()) => {
                pending.commit();
                MutationOutcome::Applied
            }
            Err(e) if direction == LikeDirection::Like && e.has_code(codes::LIKE_ALREADY_LIKED) => {
                warn!(
                    "Post {} was already liked server-side, sending compensating unlike",
                    self.post_id
                );
                pending.update(|state| state.liked = true);

                match api.unlike(self.post_id).await {
                    Ok(()) => {
                        let original = *pending.snapshot();
                        pending.update(|state| {
                            *state = LikeState {
                                liked: false,
                                count: original.count,
                            }
                        });
                        pending.commit();
                        info!("Like state of post {} repaired", self.post_id);
                        MutationOutcome::Repaired
                    }
                    Err(e) => {
                        warn!("Compensating unlike for post {} failed: {}", self.post_id, e);
                        pending.rollback();
                        MutationOutcome::RepairFailed(e)
                    }
                }
            }
            Err(e) => {
                warn!("Like toggle for post {} failed, rolling back: {}", self.post_id, e);
                pending.rollback();
                MutationOutcome::RolledBack(e)
            }
        };

        outcome
    }
}

/// Clears the in-flight direction on drop, including when the toggle is
/// cancelled mid-call
struct InFlight<'a> {
    slot: &'a Mutex<Option<LikeDirection>>,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}
