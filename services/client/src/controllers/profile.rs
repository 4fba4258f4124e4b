//! Profile: nickname and image, password, withdrawal

use std::sync::{Mutex, PoisonError};

use common::{ApiError, ApiResult, codes};
use tracing::info;

use crate::api::BoardApi;
use crate::auth::AuthService;
use crate::controllers::{Feedback, Field, Navigation, SubmitGuard, Submission};
use crate::models::{PasswordChange, ProfileImageChange, ProfileUpdate, User};
use crate::session::UserId;

pub struct ProfileController {
    api: BoardApi,
    auth: AuthService,
    user_id: UserId,
    user: Mutex<User>,
    submitting: SubmitGuard,
}

impl ProfileController {
    /// Load the logged-in user's profile
    ///
    /// Without a decodable session there is no profile to show; the caller
    /// goes to login.
    pub async fn open(api: BoardApi, auth: AuthService) -> ApiResult<Self> {
        let user_id = auth.current_user_id().ok_or(ApiError::AuthenticationExpired)?;
        let user = api.get_user(user_id).await?;
        Ok(Self {
            api,
            auth,
            user_id,
            user: Mutex::new(user),
            submitting: SubmitGuard::default(),
        })
    }

    pub fn user(&self) -> User {
        self.user.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.is_busy()
    }

    /// Update nickname and image; the caller reloads to show the result
    pub async fn update_profile(&self, nickname: &str, image: ProfileImageChange) -> Submission<Navigation> {
        let Some(_ticket) = self.submitting.try_begin() else {
            return Submission::Ignored;
        };

        let update = ProfileUpdate {
            nickname: nickname.trim().to_string(),
            image,
        };
        match self.api.update_profile(self.user_id, &update).await {
            Ok(()) => {
                info!("Updated profile of user {}", self.user_id);
                if let Ok(user) = self.api.get_user(self.user_id).await {
                    *self.user.lock().unwrap_or_else(PoisonError::into_inner) = user;
                }
                Submission::Completed(Navigation::Reload)
            }
            Err(e) if e.has_code(codes::USER_NICKNAME_TAKEN) => {
                Submission::Rejected(Feedback::field(Field::Nickname, e.user_message()))
            }
            Err(e) => Submission::from_error(&e),
        }
    }

    /// Change the password, then log out so the user signs in again
    pub async fn change_password(&self, new_password: &str, confirm: &str) -> Submission<Navigation> {
        let Some(_ticket) = self.submitting.try_begin() else {
            return Submission::Ignored;
        };

        let change = PasswordChange {
            new_password: new_password.to_string(),
            new_password_confirm: confirm.to_string(),
        };
        match self.api.change_password(self.user_id, &change).await {
            Ok(()) => {
                info!("Changed password of user {}", self.user_id);
                self.auth.logout().await;
                Submission::Completed(Navigation::Login)
            }
            Err(e) if e.has_code(codes::USER_PASSWORD_MISMATCH) => {
                Submission::Rejected(Feedback::field(Field::CurrentPassword, e.user_message()))
            }
            Err(e) if e.has_code(codes::USER_PASSWORD_POLICY) => {
                Submission::Rejected(Feedback::field(Field::NewPassword, e.user_message()))
            }
            Err(e) => Submission::from_error(&e),
        }
    }

    /// Deactivate the account and end the session
    pub async fn withdraw(&self) -> Submission<Navigation> {
        let Some(_ticket) = self.submitting.try_begin() else {
            return Submission::Ignored;
        };

        match self.api.withdraw(self.user_id).await {
            Ok(()) => {
                info!("User {} withdrew", self.user_id);
                self.auth.logout().await;
                Submission::Completed(Navigation::Login)
            }
            Err(e) => Submission::from_error(&e),
        }
    }
}
