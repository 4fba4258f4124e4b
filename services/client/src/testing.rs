//! Scripted transport for unit tests

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;
use reqwest::StatusCode;
use serde_json::{Value, json};

use crate::transport::{ApiRequest, HttpResponse, Transport, TransportError};

type Handler =
    Arc<dyn Fn(ApiRequest) -> BoxFuture<'static, Result<HttpResponse, TransportError>> + Send + Sync>;

/// Transport answering every request with a test-provided async handler
pub struct MockTransport {
    handler: Handler,
    requests: Mutex<Vec<ApiRequest>>,
    cookies: Mutex<HashMap<String, String>>,
}

impl MockTransport {
    pub fn new<F, Fut>(handler: F) -> Self
    where
        F: Fn(ApiRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<HttpResponse, TransportError>> + Send + 'static,
    {
        Self {
            handler: Arc::new(move |request| handler(request).boxed()),
            requests: Mutex::new(Vec::new()),
            cookies: Mutex::new(HashMap::new()),
        }
    }

    pub fn set_cookie(&self, name: &str, value: &str) {
        self.cookies
            .lock()
            .unwrap()
            .insert(name.to_string(), value.to_string());
    }

    /// Every request seen so far
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of requests sent to `path`
    pub fn count(&self, path: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.path == path)
            .count()
    }

    /// Number of requests with `method` sent to `path`
    pub fn count_method(&self, method: reqwest::Method, path: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: &ApiRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        (self.handler)(request.clone()).await
    }

    fn cookie(&self, name: &str) -> Option<String> {
        self.cookies.lock().unwrap().get(name).cloned()
    }
}

/// `{ "data": payload }` with the given status
pub fn data(status: StatusCode, payload: Value) -> Result<HttpResponse, TransportError> {
    Ok(HttpResponse::json(status, &json!({ "data": payload })))
}

/// `{ "message": message }` with the given status
pub fn failure(status: StatusCode, message: &str) -> Result<HttpResponse, TransportError> {
    Ok(HttpResponse::json(status, &json!({ "message": message })))
}

pub fn no_content() -> Result<HttpResponse, TransportError> {
    Ok(HttpResponse::new(StatusCode::NO_CONTENT, ""))
}

pub fn unreachable() -> Result<HttpResponse, TransportError> {
    Err(TransportError::new("connection refused"))
}
