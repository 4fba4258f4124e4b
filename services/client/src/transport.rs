//! HTTP transport for the board API
//!
//! The gateway talks to the network through the [`Transport`] trait. Responses
//! are fully buffered so the gateway can inspect an error body and still hand
//! the same body to the normal response path.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, StatusCode, Url};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::error::{ClientError, ClientResult};

/// Transport-level failure: no HTTP response was obtained
#[derive(Error, Debug)]
#[error("{message}")]
pub struct TransportError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// One part of a multipart body
#[derive(Debug, Clone)]
pub enum FormPart {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        file_name: String,
        content_type: String,
        bytes: Bytes,
    },
}

/// Request body
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Value),
    Multipart(Vec<FormPart>),
}

/// An API request, relative to the API base URL
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set a JSON body
    pub fn json(mut self, body: &impl Serialize) -> Self {
        // Plain data structs; serialization to Value does not fail for them.
        self.body = RequestBody::Json(serde_json::to_value(body).unwrap_or(Value::Null));
        self
    }

    pub fn multipart(mut self, parts: Vec<FormPart>) -> Self {
        self.body = RequestBody::Multipart(parts);
        self
    }

    /// Whether the method changes server state
    pub fn is_mutating(&self) -> bool {
        !matches!(self.method, Method::GET | Method::HEAD | Method::OPTIONS)
    }

    /// Value of a header set on this request
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A buffered HTTP response
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn json(status: StatusCode, body: &Value) -> Self {
        Self::new(status, body.to_string())
    }
}

/// Network access used by the gateway and the refresh coordinator
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform the request; `Err` only when no response was received
    async fn send(&self, request: &ApiRequest) -> Result<HttpResponse, TransportError>;

    /// Value of an ambient cookie for the API origin
    fn cookie(&self, name: &str) -> Option<String>;
}

/// Reqwest-backed transport with a shared cookie jar
pub struct ReqwestTransport {
    client: Client,
    base_url: Url,
    jar: Arc<Jar>,
}

impl ReqwestTransport {
    /// Build a transport for `base_url` with the given request timeout
    pub fn new(base_url: &str, timeout: Duration) -> ClientResult<Self> {
        let base_url = Url::parse(base_url).map_err(|e| ClientError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidBaseUrl {
                url: base_url.to_string(),
                reason: "not a base URL".to_string(),
            });
        }

        let jar = Arc::new(Jar::default());
        let client = Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url,
            jar,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// API origin used to scope durable client state
    pub fn origin(&self) -> String {
        self.base_url.origin().ascii_serialization()
    }

    fn url_for(&self, path: &str) -> Result<Url, TransportError> {
        let joined = format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path);
        Url::parse(&joined).map_err(|e| TransportError::with_source(format!("Invalid URL {joined}"), e))
    }
}

fn multipart_form(parts: &[FormPart]) -> Result<Form, TransportError> {
    let mut form = Form::new();
    for part in parts {
        form = match part {
            FormPart::Text { name, value } => form.text(name.clone(), value.clone()),
            FormPart::File {
                name,
                file_name,
                content_type,
                bytes,
            } => {
                let file = Part::bytes(bytes.to_vec())
                    .file_name(file_name.clone())
                    .mime_str(content_type)
                    .map_err(|e| TransportError::with_source("Invalid content type", e))?;
                form.part(name.clone(), file)
            }
        };
    }
    Ok(form)
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &ApiRequest) -> Result<HttpResponse, TransportError> {
        let url = self.url_for(&request.path)?;
        debug!("{} {}", request.method, url);

        let mut builder = self.client.request(request.method.clone(), url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        // The multipart form is rebuilt from owned parts on every attempt.
        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Multipart(parts) => builder.multipart(multipart_form(parts)?),
        };

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::with_source("Request failed", e))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::with_source("Failed to read response body", e))?;

        Ok(HttpResponse { status, body })
    }

    fn cookie(&self, name: &str) -> Option<String> {
        let header = self.jar.cookies(&self.base_url)?;
        let header = header.to_str().ok()?;
        cookie_value(header, name)
    }
}

/// Find `name` in a `Cookie` header value ("a=1; b=2")
pub(crate) fn cookie_value(header: &str, name: &str) -> Option<String> {
    header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then(|| value.to_string())
    })
}
