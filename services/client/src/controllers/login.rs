//! Login form

use common::ApiError;
use tracing::info;

use crate::auth::AuthService;
use crate::controllers::{Feedback, Field, Navigation, SubmitGuard, Submission};

pub struct LoginController {
    auth: AuthService,
    submitting: SubmitGuard,
}

impl LoginController {
    pub fn new(auth: AuthService) -> Self {
        Self {
            auth,
            submitting: SubmitGuard::default(),
        }
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.is_busy()
    }

    /// Log in; wrong credentials are reported on the password field
    pub async fn submit(&self, email: &str, password: &str) -> Submission<Navigation> {
        let Some(_ticket) = self.submitting.try_begin() else {
            return Submission::Ignored;
        };

        match self.auth.login(email.trim(), password).await {
            Ok(user_id) => {
                info!("Logged in as {:?}", user_id);
                Submission::Completed(Navigation::Feed)
            }
            Err(e @ ApiError::CredentialRejected { .. }) => {
                Submission::Rejected(Feedback::field(Field::Password, e.user_message()))
            }
            Err(e) => Submission::from_error(&e),
        }
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
    use std::time::Duration;

    #[tokio::test]
    async fn successful_login_goes_to_feed() {
        let token = fixtures::token_for(8).as_str().to_string();
        let transport = Arc::new(MockTransport::new(move |_req| {
            let token = token.clone();
            async move { testing::data(StatusCode::OK, json!({"accessToken": token})) }
        }));
        let (_, auth) = fixtures::client(&transport, None);
        let login = LoginController::new(auth.clone());

        assert_eq!(
            login.submit(" a@b.c ", "Secret!23").await,
            Submission::Completed(Navigation::Feed)
        );
        assert_eq!(auth.current_user_id(), Some(8));
    }

    #[tokio::test]
    async fn wrong_password_is_shown_on_password_field() {
        let transport = Arc::new(MockTransport::new(|_req| async {
            testing::failure(StatusCode::UNAUTHORIZED, "AUTH-001: Invalid email or password")
        }));
        let (_, auth) = fixtures::client(&transport, None);
        let login = LoginController::new(auth);

        assert_eq!(
            login.submit("a@b.c", "nope").await,
            Submission::Rejected(Feedback::field(
                Field::Password,
                "Email or password does not match."
            ))
        );
    }

    #[tokio::test]
    async fn unreachable_server_is_a_notice() {
        let transport = Arc::new(MockTransport::new(|_req| async { testing::unreachable() }));
        let (_, auth) = fixtures::client(&transport, None);
        let login = LoginController::new(auth);

        assert!(matches!(
            login.submit("a@b.c", "pw").await,
            Submission::Rejected(Feedback::Notice(_))
        ));
    }

    #[tokio::test]
    async fn second_submit_while_pending_is_ignored() {
        let transport = Arc::new(MockTransport::new(|_req| async {
            tokio::time::sleep(Duration::from_millis(30)).await;
            testing::failure(StatusCode::UNAUTHORIZED, "AUTH-001: Invalid email or password")
        }));
        let (_, auth) = fixtures::client(&transport, None);
        let login = LoginController::new(auth);

        let (_, second) = tokio::join!(login.submit("a@b.c", "pw"), async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            login.submit("a@b.c", "pw").await
        });

        assert_eq!(second, Submission::Ignored);
        assert_eq!(transport.count("/auth/login"), 1);
    }
}
