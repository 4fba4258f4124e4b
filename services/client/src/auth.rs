//! Login, registration and logout

use common::{ApiError, ApiResult};
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::api::BoardApi;
use crate::credentials::{Credential, CredentialStore};
use crate::models::{AuthTokens, LoginCredentials, Registration};
use crate::session::{self, SessionEvent, UserId};

/// Session lifecycle on top of the board API
#[derive(Clone)]
pub struct AuthService {
    api: BoardApi,
}

impl AuthService {
    pub fn new(api: BoardApi) -> Self {
        Self { api }
    }

    /// Log in and store the issued access token
    ///
    /// Wrong credentials surface as [`ApiError::CredentialRejected`].
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<Option<UserId>> {
        let tokens = self
            .api
            .login(&LoginCredentials {
                email: email.to_string(),
                password: password.to_string(),
            })
            .await?;
        self.start_session(tokens)
    }

    /// Sign up; the server logs the new account in directly
    pub async fn register(&self, registration: &Registration) -> ApiResult<Option<UserId>> {
        let tokens = self.api.register(registration).await?;
        self.start_session(tokens)
    }

    /// End the session
    ///
    /// The server call is best effort; the local credential is always
    /// cleared.
    pub async fn logout(&self) {
        if let Err(e) = self.api.logout().await {
            warn!("Server-side logout failed: {}", e);
        }
        self.api.gateway().credentials().clear();
        self.api.gateway().notify(SessionEvent::Ended);
        info!("Logged out");
    }

    pub fn is_authenticated(&self) -> bool {
        self.api.gateway().credentials().is_authenticated()
    }

    /// Subject of the stored access token, for UI personalization only
    pub fn current_user_id(&self) -> Option<UserId> {
        session::current_user_id(self.api.gateway().credentials().as_ref())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.api.gateway().subscribe()
    }

    fn start_session(&self, tokens: AuthTokens) -> ApiResult<Option<UserId>> {
        let token = tokens
            .access_token
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| ApiError::malformed(None, "Response carried no access token"))?;

        let credential = Credential::new(token);
        let user_id = session::subject_of(&credential).or(tokens.user_id);
        self.api.gateway().credentials().set(credential);
        self.api.gateway().notify(SessionEvent::Started);

        info!("Session started for user {:?}", user_id);
        Ok(user_id)
    }
}
