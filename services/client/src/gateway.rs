//! Authenticated request gateway
//!
//! Every API call goes through [`ApiGateway`]. It attaches the bearer token
//! and anti-forgery token, unwraps the `{ data }` envelope, and handles an
//! authentication failure by refreshing once and retrying once. Errors are
//! classified here into [`ApiError`] and nowhere else.

use std::sync::Arc;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use common::{ApiEnvelope, ApiError, ApiResult, ErrorCode, ErrorEnvelope};

use crate::credentials::CredentialStore;
use crate::refresh::{RefreshCoordinator, RefreshOutcome};
use crate::session::SessionEvent;
use crate::transport::{ApiRequest, HttpResponse, Transport};

/// Cookie carrying the anti-forgery token
pub const XSRF_COOKIE: &str = "XSRF-TOKEN";
/// Header echoing the anti-forgery token
pub const XSRF_HEADER: &str = "X-XSRF-TOKEN";

/// Fallback message for an error body without one
const FALLBACK_ERROR: &str = "API request failed";

/// Gateway wrapping every outbound API call
pub struct ApiGateway {
    transport: Arc<dyn Transport>,
    credentials: Arc<dyn CredentialStore>,
    refresher: RefreshCoordinator,
    events: broadcast::Sender<SessionEvent>,
}

impl ApiGateway {
    /// Create a new gateway sharing `transport` and `credentials`
    pub fn new(transport: Arc<dyn Transport>, credentials: Arc<dyn CredentialStore>) -> Self {
        let refresher = RefreshCoordinator::new(Arc::clone(&transport), Arc::clone(&credentials));
        let (events, _) = broadcast::channel(16);
        Self {
            transport,
            credentials,
            refresher,
            events,
        }
    }

    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        &self.credentials
    }

    pub fn refresher(&self) -> &RefreshCoordinator {
        &self.refresher
    }

    /// Subscribe to session lifecycle events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub(crate) fn notify(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    /// Perform a call and deserialize the unwrapped payload
    ///
    /// A 204 response, or a body without `data`, deserializes from `null`,
    /// which suits `()` and `Option<T>` payloads.
    pub async fn call<T: DeserializeOwned>(&self, request: ApiRequest) -> ApiResult<T> {
        let (status, data) = self.send(&request).await?;
        serde_json::from_value(data).map_err(|e| {
            error!(
                "Unexpected payload from {} {}: {}",
                request.method, request.path, e
            );
            ApiError::malformed(Some(status.as_u16()), format!("Unexpected response payload: {e}"))
        })
    }

    /// Perform a call whose payload is not needed
    pub async fn execute(&self, request: ApiRequest) -> ApiResult<()> {
        self.send(&request).await.map(|_| ())
    }

    async fn send(&self, request: &ApiRequest) -> ApiResult<(StatusCode, Value)> {
        let response = self.dispatch(request).await?;
        if response.status != StatusCode::UNAUTHORIZED {
            return settle(response);
        }

        // The body is buffered, so peeking does not consume it.
        if let Some(code) = peek_code(&response) {
            if code.is_credential_mismatch() {
                debug!("Credentials rejected with {}", code);
                let raw = error_message(&response);
                return Err(ApiError::CredentialRejected { code, raw });
            }
        }

        info!(
            "{} {} returned 401, attempting token refresh",
            request.method, request.path
        );
        match self.refresher.refresh().await {
            RefreshOutcome::Refreshed => {
                // Exactly one retry, whatever its outcome.
                let retry = self.dispatch(request).await?;
                settle(retry)
            }
            RefreshOutcome::Failed => {
                warn!("Token refresh failed, ending session");
                self.credentials.clear();
                self.notify(SessionEvent::Ended);
                Err(ApiError::AuthenticationExpired)
            }
        }
    }

    async fn dispatch(&self, request: &ApiRequest) -> ApiResult<HttpResponse> {
        let mut outgoing = request.clone();
        if let Some(credential) = self.credentials.get().filter(|c| !c.is_empty()) {
            outgoing.headers.push(("Authorization".to_string(), credential.bearer()));
        }
        if outgoing.is_mutating() {
            if let Some(token) = self.transport.cookie(XSRF_COOKIE) {
                outgoing.headers.push((XSRF_HEADER.to_string(), token));
            }
        }

        self.transport.send(&outgoing).await.map_err(|e| {
            error!(
                "{} {} unreachable: {}",
                request.method, request.path, e
            );
            ApiError::Unreachable(Box::new(e))
        })
    }
}

/// Error code in a 401 body, if the body is a readable error envelope
fn peek_code(response: &HttpResponse) -> Option<ErrorCode> {
    match ErrorEnvelope::parse(&response.body) {
        Some(envelope) => envelope.message.as_deref().and_then(ErrorCode::extract),
        None => {
            warn!("Failed to parse 401 error response");
            None
        }
    }
}

fn error_message(response: &HttpResponse) -> String {
    ErrorEnvelope::parse(&response.body)
        .and_then(|envelope| envelope.message)
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| FALLBACK_ERROR.to_string())
}

/// Turn a final response into the unwrapped payload or a classified error
fn settle(response: HttpResponse) -> ApiResult<(StatusCode, Value)> {
    let status = response.status;
    if status == StatusCode::NO_CONTENT {
        return Ok((status, Value::Null));
    }

    if !status.is_success() {
        return Err(ApiError::from_server(status.as_u16(), error_message(&response)));
    }

    if response.body.iter().all(u8::is_ascii_whitespace) {
        return Ok((status, Value::Null));
    }

    serde_json::from_slice::<ApiEnvelope>(&response.body)
        .map(|envelope| (status, envelope.data))
        .map_err(|e| {
            error!("Malformed success body: {}", e);
            ApiError::malformed(Some(status.as_u16()), format!("Malformed response body: {e}"))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::{Credential, MemoryCredentialStore};
    use crate::refresh::REFRESH_PATH;
    use crate::testing::{self, MockTransport};
    use serde_json::json;
    use std::sync::Arc;
    use tokio::sync::Barrier;

    fn gateway(transport: &Arc<MockTransport>, token: Option<&str>) -> (ApiGateway, Arc<MemoryCredentialStore>) {
        let store = Arc::new(match token {
            Some(token) => MemoryCredentialStore::with_credential(Credential::new(token)),
            None => MemoryCredentialStore::new(),
        });
        (ApiGateway::new(transport.clone(), store.clone()), store)
    }

    fn refresh_ok(token: &str) -> Result<HttpResponse, crate::transport::TransportError> {
        testing::data(StatusCode::OK, json!({ "accessToken": token }))
    }

    #[tokio::test]
    async fn unwraps_data_and_attaches_bearer() {
        let transport = Arc::new(MockTransport::new(|_req| async {
            testing::data(StatusCode::OK, json!({"userId": 5, "nickname": "kim"}))
        }));
        let (gateway, _) = gateway(&transport, Some("tok"));

        let user: Value = gateway.call(ApiRequest::get("/users/5")).await.unwrap();

        assert_eq!(user["nickname"], "kim");
        let sent = transport.requests();
        assert_eq!(sent[0].header_value("authorization"), Some("Bearer tok"));
    }

    #[tokio::test]
    async fn anonymous_calls_carry_no_bearer() {
        let transport = Arc::new(MockTransport::new(|_req| async {
            testing::data(StatusCode::OK, json!({"posts": []}))
        }));
        let (gateway, _) = gateway(&transport, None);

        gateway.execute(ApiRequest::get("/posts")).await.unwrap();

        assert!(transport.requests()[0].header_value("authorization").is_none());
    }

    #[tokio::test]
    async fn xsrf_token_only_on_mutating_calls() {
        let transport = Arc::new(MockTransport::new(|_req| async { testing::no_content() }));
        transport.set_cookie(XSRF_COOKIE, "csrf-1");
        let (gateway, _) = gateway(&transport, Some("tok"));

        gateway.execute(ApiRequest::get("/posts/1")).await.unwrap();
        gateway.execute(ApiRequest::delete("/posts/1")).await.unwrap();

        let sent = transport.requests();
        assert!(sent[0].header_value(XSRF_HEADER).is_none());
        assert_eq!(sent[1].header_value(XSRF_HEADER), Some("csrf-1"));
    }

    #[tokio::test]
    async fn no_content_is_acknowledgement() {
        let transport = Arc::new(MockTransport::new(|_req| async { testing::no_content() }));
        let (gateway, _) = gateway(&transport, Some("tok"));

        let ack: Option<Value> = gateway.call(ApiRequest::delete("/posts/1/like")).await.unwrap();
        assert!(ack.is_none());
    }

    #[tokio::test]
    async fn transport_failure_is_unreachable_without_refresh() {
        let transport = Arc::new(MockTransport::new(|_req| async { testing::unreachable() }));
        let (gateway, store) = gateway(&transport, Some("tok"));

        let err = gateway.execute(ApiRequest::get("/posts")).await.unwrap_err();

        assert!(err.is_unreachable());
        assert_eq!(transport.count(REFRESH_PATH), 0);
        assert!(store.get().is_some());
    }

    #[tokio::test]
    async fn domain_error_carries_code() {
        let transport = Arc::new(MockTransport::new(|_req| async {
            testing::failure(StatusCode::NOT_FOUND, "POST-001: Post not found")
        }));
        let (gateway, _) = gateway(&transport, None);

        let err = gateway.execute(ApiRequest::get("/posts/9")).await.unwrap_err();

        assert!(matches!(err, ApiError::Domain { status: 404, .. }));
        assert!(err.has_code(common::codes::POST_NOT_FOUND));
    }

    #[tokio::test]
    async fn error_without_json_body_is_unclassified() {
        let transport = Arc::new(MockTransport::new(|_req| async {
            Ok(HttpResponse::new(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>"))
        }));
        let (gateway, _) = gateway(&transport, None);

        let err = gateway.execute(ApiRequest::get("/posts")).await.unwrap_err();

        match err {
            ApiError::Unclassified { status, raw } => {
                assert_eq!(status, Some(502));
                assert_eq!(raw, FALLBACK_ERROR);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn credential_mismatch_never_refreshes() {
        let transport = Arc::new(MockTransport::new(|_req| async {
            testing::failure(StatusCode::UNAUTHORIZED, "AUTH-001: Invalid credentials")
        }));
        let (gateway, _) = gateway(&transport, None);

        let err = gateway
            .execute(ApiRequest::post("/auth/login").json(&json!({"email": "a@b.c", "password": "x"})))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::CredentialRejected { .. }));
        assert_eq!(err.user_message(), "Email or password does not match.");
        assert_eq!(transport.count(REFRESH_PATH), 0);
    }

    #[tokio::test]
    async fn expired_token_is_refreshed_and_retried_once() {
        let transport = Arc::new(MockTransport::new(|req| async move {
            if req.path == REFRESH_PATH {
                return refresh_ok("new");
            }
            match req.header_value("authorization") {
                Some("Bearer new") => testing::data(StatusCode::OK, json!({"postId": 1})),
                _ => testing::failure(StatusCode::UNAUTHORIZED, "AUTH-003: Token expired"),
            }
        }));
        let (gateway, store) = gateway(&transport, Some("old"));

        let post: Value = gateway.call(ApiRequest::get("/posts/1")).await.unwrap();

        assert_eq!(post["postId"], 1);
        assert_eq!(transport.count("/posts/1"), 2);
        assert_eq!(transport.count(REFRESH_PATH), 1);
        assert_eq!(store.get().unwrap().as_str(), "new");
    }

    #[tokio::test]
    async fn undecodable_401_body_still_refreshes() {
        let transport = Arc::new(MockTransport::new(|req| async move {
            if req.path == REFRESH_PATH {
                return refresh_ok("new");
            }
            match req.header_value("authorization") {
                Some("Bearer new") => testing::no_content(),
                _ => Ok(HttpResponse::new(StatusCode::UNAUTHORIZED, "not json")),
            }
        }));
        let (gateway, _) = gateway(&transport, Some("old"));

        gateway.execute(ApiRequest::delete("/posts/1")).await.unwrap();

        assert_eq!(transport.count(REFRESH_PATH), 1);
    }

    #[tokio::test]
    async fn retry_failing_again_is_not_refreshed_twice() {
        let transport = Arc::new(MockTransport::new(|req| async move {
            if req.path == REFRESH_PATH {
                return refresh_ok("new");
            }
            testing::failure(StatusCode::UNAUTHORIZED, "AUTH-002: Invalid token")
        }));
        let (gateway, store) = gateway(&transport, Some("old"));

        let err = gateway.execute(ApiRequest::get("/posts/1")).await.unwrap_err();

        assert!(matches!(err, ApiError::Domain { status: 401, .. }));
        assert_eq!(transport.count("/posts/1"), 2);
        assert_eq!(transport.count(REFRESH_PATH), 1);
        assert!(store.get().is_some());
    }

    #[tokio::test]
    async fn failed_refresh_ends_session() {
        let transport = Arc::new(MockTransport::new(|req| async move {
            if req.path == REFRESH_PATH {
                return testing::failure(StatusCode::UNAUTHORIZED, "AUTH-004: Invalid refresh token");
            }
            testing::failure(StatusCode::UNAUTHORIZED, "AUTH-003: Token expired")
        }));
        let (gateway, store) = gateway(&transport, Some("old"));
        let mut events = gateway.subscribe();

        let err = gateway.execute(ApiRequest::get("/posts/1")).await.unwrap_err();

        assert!(matches!(err, ApiError::AuthenticationExpired));
        assert!(store.get().is_none());
        assert_eq!(events.try_recv().unwrap(), SessionEvent::Ended);
        assert_eq!(transport.count("/posts/1"), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_401s_share_a_single_refresh() {
        const CALLS: usize = 4;
        let barrier = Arc::new(Barrier::new(CALLS));
        let transport = Arc::new(MockTransport::new(move |req| {
            let barrier = Arc::clone(&barrier);
            async move {
                if req.path == REFRESH_PATH {
                    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
                    return refresh_ok("new");
                }
                match req.header_value("authorization") {
                    Some("Bearer new") => testing::data(StatusCode::OK, json!({"path": req.path})),
                    _ => {
                        // Hold every stale call until all of them are in flight.
                        barrier.wait().await;
                        testing::failure(StatusCode::UNAUTHORIZED, "AUTH-003: Token expired")
                    }
                }
            }
        }));
        let (gateway, _) = gateway(&transport, Some("old"));
        let gateway = Arc::new(gateway);

        let handles: Vec<_> = (0..CALLS)
            .map(|i| {
                let gateway = Arc::clone(&gateway);
                tokio::spawn(async move {
                    gateway
                        .call::<Value>(ApiRequest::get(format!("/resource/{i}")))
                        .await
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(transport.count(REFRESH_PATH), 1);
        let retries: Vec<_> = transport
            .requests()
            .into_iter()
            .filter(|r| r.path != REFRESH_PATH && r.header_value("authorization") == Some("Bearer new"))
            .collect();
        assert_eq!(retries.len(), CALLS);
    }
}
