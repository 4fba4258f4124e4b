//! Sign-up form

use common::{ApiError, codes};
use tracing::info;

use crate::auth::AuthService;
use crate::controllers::{Feedback, Field, Navigation, SubmitGuard, Submission};
use crate::models::Registration;

pub struct RegisterController {
    auth: AuthService,
    submitting: SubmitGuard,
}

impl RegisterController {
    pub fn new(auth: AuthService) -> Self {
        Self {
            auth,
            submitting: SubmitGuard::default(),
        }
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.is_busy()
    }

    /// Sign up and log in; taken email or nickname is reported on its field
    pub async fn submit(&self, registration: &Registration) -> Submission<Navigation> {
        let Some(_ticket) = self.submitting.try_begin() else {
            return Submission::Ignored;
        };

        match self.auth.register(registration).await {
            Ok(user_id) => {
                info!("Registered user {:?}", user_id);
                Submission::Completed(Navigation::Feed)
            }
            Err(e) => Submission::Rejected(feedback_for(&e)),
        }
    }
}

fn feedback_for(error: &ApiError) -> Feedback {
    if error.has_code(codes::USER_EMAIL_TAKEN) {
        Feedback::field(Field::Email, error.user_message())
    } else if error.has_code(codes::USER_NICKNAME_TAKEN) {
        Feedback::field(Field::Nickname, error.user_message())
    } else {
        Feedback::from(error)
    }
}
