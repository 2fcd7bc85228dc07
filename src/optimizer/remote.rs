//! HTTP client for an optimizer exposed as a service

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::{OptimizationRequest, OptimizationResult, Optimizer};
use crate::error::Result;

/// Posts the request as JSON to `{base_url}/optimize`.
pub struct RemoteOptimizer {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl RemoteOptimizer {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            api_key,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/optimize", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl Optimizer for RemoteOptimizer {
    async fn optimize(&self, request: OptimizationRequest) -> Result<OptimizationResult> {
        let url = self.endpoint();
        debug!(%url, materials = request.materials.len(), "posting optimization request");

        let mut call = self.client.post(&url).json(&request);
        if let Some(ref key) = self.api_key {
            call = call.bearer_auth(key);
        }

        let res = call.send().await?.error_for_status()?;
        let result = res.json::<OptimizationResult>().await?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_base_url() {
        let remote = RemoteOptimizer::new("http://localhost:8080/", None);
        assert_eq!(remote.endpoint(), "http://localhost:8080/optimize");

        let remote = RemoteOptimizer::new("http://solver.internal/api", Some("k".into()));
        assert_eq!(remote.endpoint(), "http://solver.internal/api/optimize");
    }
}
