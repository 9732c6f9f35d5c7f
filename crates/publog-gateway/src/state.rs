//! Gateway application state.

use std::sync::Arc;

use publog_service::PublogService;
use publog_store::Store;

use crate::config::GatewayConfig;
use crate::error::ApiError;

/// Shared application state for the gateway.
pub struct GatewayState<S: Store> {
    /// The dataset service.
    pub service: Arc<PublogService<S>>,
    /// Gateway configuration.
    pub config: GatewayConfig,
}

impl<S: Store + 'static> GatewayState<S> {
    /// Create a new gateway state.
    #[must_use]
    pub fn new(service: Arc<PublogService<S>>, config: GatewayConfig) -> Self {
        Self { service, config }
    }

    /// Run a service call on the blocking pool.
    ///
    /// # Errors
    ///
    /// Returns the call's error mapped to an [`ApiError`], or
    /// `ApiError::Internal` if the task panicked.
    pub async fn run<T, F>(&self, call: F) -> Result<T, ApiError>
    where
        T: Send + 'static,
        F: FnOnce(&PublogService<S>) -> publog_service::Result<T> + Send + 'static,
    {
        let service = Arc::clone(&self.service);
        let result = tokio::task::spawn_blocking(move || call(&service)).await?;
        Ok(result?)
    }
}

impl<S: Store> Clone for GatewayState<S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            config: self.config.clone(),
        }
    }
}
