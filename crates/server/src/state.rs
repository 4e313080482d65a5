use std::sync::Arc;

use mulearr_core::{
    Authenticator, Config, DownloadController, HashIdentityStore, SanitizedConfig,
    SearchFeedBuilder, SearchGateway,
};

/// Shared application state
pub struct AppState {
    config: Config,
    authenticator: Arc<dyn Authenticator>,
    controller: Arc<DownloadController>,
    gateway: Arc<SearchGateway>,
    feed: SearchFeedBuilder,
    hash_store: Arc<dyn HashIdentityStore>,
}

impl AppState {
    pub fn new(
        config: Config,
        authenticator: Arc<dyn Authenticator>,
        controller: Arc<DownloadController>,
        gateway: Arc<SearchGateway>,
        hash_store: Arc<dyn HashIdentityStore>,
    ) -> Self {
        let feed = SearchFeedBuilder::new("mulearr", config.search.max_results);
        Self {
            config,
            authenticator,
            controller,
            gateway,
            feed,
            hash_store,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn authenticator(&self) -> &dyn Authenticator {
        self.authenticator.as_ref()
    }

    pub fn controller(&self) -> &DownloadController {
        self.controller.as_ref()
    }

    /// Owned handle, for work that must outlive the request.
    pub fn gateway(&self) -> Arc<SearchGateway> {
        Arc::clone(&self.gateway)
    }

    pub fn feed(&self) -> &SearchFeedBuilder {
        &self.feed
    }

    pub fn hash_store(&self) -> &dyn HashIdentityStore {
        self.hash_store.as_ref()
    }
}
