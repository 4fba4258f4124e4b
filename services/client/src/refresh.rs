//! Single-flight access token refresh
//!
//! When several requests fail authentication at once (a page firing parallel
//! calls with an expired token), only one refresh call is made and every
//! caller awaits its outcome.

use std::sync::Arc;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use common::ApiEnvelope;

use crate::credentials::{Credential, CredentialStore};
use crate::transport::{ApiRequest, Transport};

/// Refresh endpoint
pub const REFRESH_PATH: &str = "/auth/refresh_token";

/// Result of a refresh attempt, shared by every waiter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Refreshed,
    Failed,
}

/// Payload of a successful refresh response
#[derive(Debug, Deserialize)]
struct RefreshedToken {
    #[serde(rename = "accessToken", alias = "access_token")]
    access_token: String,
}

type InFlight = Shared<BoxFuture<'static, RefreshOutcome>>;

/// Coordinates access token refreshes so at most one is in flight
pub struct RefreshCoordinator {
    transport: Arc<dyn Transport>,
    credentials: Arc<dyn CredentialStore>,
    in_flight: Arc<Mutex<Option<InFlight>>>,
}

impl RefreshCoordinator {
    /// Create a new refresh coordinator
    pub fn new(transport: Arc<dyn Transport>, credentials: Arc<dyn CredentialStore>) -> Self {
        Self {
            transport,
            credentials,
            in_flight: Arc::new(Mutex::new(None)),
        }
    }

    /// Refresh the access token, joining an in-flight refresh if there is one
    ///
    /// On success the new token is already stored when this returns. On
    /// failure the store is left untouched; ending the session is the
    /// caller's decision.
    pub async fn refresh(&self) -> RefreshOutcome {
        let operation = {
            let mut slot = self.in_flight.lock().await;
            match slot.as_ref() {
                Some(operation) => {
                    debug!("Joining in-flight token refresh");
                    operation.clone()
                }
                None => {
                    let operation = self.start();
                    *slot = Some(operation.clone());
                    operation
                }
            }
        };

        operation.await
    }

    /// Whether a refresh is currently in flight
    pub async fn is_refreshing(&self) -> bool {
        self.in_flight.lock().await.is_some()
    }

    fn start(&self) -> InFlight {
        info!("Starting token refresh");

        let transport = Arc::clone(&self.transport);
        let credentials = Arc::clone(&self.credentials);
        let marker = Arc::clone(&self.in_flight);

        // Runs to completion even if every waiter is dropped, so the marker
        // is always reset.
        let task = tokio::spawn(async move {
            let outcome = perform_refresh(transport.as_ref(), credentials.as_ref()).await;
            *marker.lock().await = None;
            info!("Token refresh settled: {:?}", outcome);
            outcome
        });

        async move {
            task.await.unwrap_or_else(|e| {
                error!("Token refresh task failed: {}", e);
                RefreshOutcome::Failed
            })
        }
        .boxed()
        .shared()
    }
}

async fn perform_refresh(
    transport: &dyn Transport,
    credentials: &dyn CredentialStore,
) -> RefreshOutcome {
    let response = match transport.send(&ApiRequest::post(REFRESH_PATH)).await {
        Ok(response) => response,
        Err(e) => {
            warn!("Token refresh request failed: {}", e);
            return RefreshOutcome::Failed;
        }
    };

    if !response.status.is_success() {
        warn!("Token refresh rejected with status {}", response.status);
        return RefreshOutcome::Failed;
    }

    let token = serde_json::from_slice::<ApiEnvelope>(&response.body)
        .ok()
        .and_then(|envelope| serde_json::from_value::<RefreshedToken>(envelope.data).ok())
        .map(|payload| payload.access_token)
        .filter(|token| !token.trim().is_empty());

    match token {
        Some(token) => {
            credentials.set(Credential::new(token));
            RefreshOutcome::Refreshed
        }
        None => {
            warn!("Token refresh response carried no access token");
            RefreshOutcome::Failed
        }
    }
}
