use crate::{config::CollectorConfig, requests::RequestClient};

/// Everything a collection job needs: the env-derived config and the
/// rate-limited HTTP client shared by all scrapers.
pub struct CollectContext {
    pub config: CollectorConfig,
    pub request_client: RequestClient,
}

impl CollectContext {
    pub fn new() -> anyhow::Result<Self> {
        let config = CollectorConfig::new()?;
        let request_client = RequestClient::new()?;
        Ok(CollectContext {
            config,
            request_client,
        })
    }
}
