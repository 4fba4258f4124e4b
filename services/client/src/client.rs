//! Client context
//!
//! One [`BoardClient`] per process owns the credential store, the transport
//! and the gateway. Everything else borrows from it, so tests build isolated
//! instances instead of sharing globals.

use std::sync::Arc;

use tracing::info;

use crate::api::BoardApi;
use crate::auth::AuthService;
use crate::config::ClientConfig;
use crate::credentials::{CredentialStore, FileCredentialStore, MemoryCredentialStore};
use crate::error::ClientResult;
use crate::gateway::ApiGateway;
use crate::transport::{ReqwestTransport, Transport};

#[derive(Clone)]
pub struct BoardClient {
    config: ClientConfig,
    api: BoardApi,
    auth: AuthService,
}

impl BoardClient {
    /// Build a client over a reqwest transport for `config.api_base_url`
    ///
    /// The durable credential file is used when one can be resolved,
    /// otherwise the session lives in memory only.
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let transport = ReqwestTransport::new(&config.api_base_url, config.request_timeout())?;
        let credentials: Arc<dyn CredentialStore> = match config.credential_path() {
            Some(path) => Arc::new(FileCredentialStore::open(path, transport.origin())),
            None => Arc::new(MemoryCredentialStore::new()),
        };

        info!("Board client for {}", transport.base_url());
        Ok(Self::with_transport(config, Arc::new(transport), credentials))
    }

    /// Build a client over any transport and credential store
    pub fn with_transport(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        credentials: Arc<dyn CredentialStore>,
    ) -> Self {
        let gateway = Arc::new(ApiGateway::new(transport, credentials));
        let api = BoardApi::new(gateway);
        let auth = AuthService::new(api.clone());
        Self { config, api, auth }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn api(&self) -> &BoardApi {
        &self.api
    }

    pub fn auth(&self) -> &AuthService {
        &self.auth
    }
}
