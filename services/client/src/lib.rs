//! Board client core
//!
//! Session handling and request plumbing for the community board API: the
//! credential store, the token decoder, the single-flight refresh on 401, the
//! authenticated gateway every call goes through, optimistic likes and
//! comments, and headless controllers for each screen.

pub mod api;
pub mod auth;
pub mod client;
pub mod comments;
pub mod config;
pub mod controllers;
pub mod credentials;
pub mod display;
pub mod error;
pub mod gateway;
pub mod like;
pub mod models;
pub mod optimistic;
pub mod refresh;
pub mod session;
pub mod transport;

#[cfg(test)]
mod testing;

pub use api::BoardApi;
pub use auth::AuthService;
pub use client::BoardClient;
pub use config::ClientConfig;
pub use credentials::{Credential, CredentialStore, FileCredentialStore, MemoryCredentialStore};
pub use error::{ClientError, ClientResult};
pub use gateway::ApiGateway;
pub use session::{SessionEvent, UserId};
pub use transport::{ApiRequest, HttpResponse, ReqwestTransport, Transport, TransportError};

pub use common::{ApiError, ApiResult};
