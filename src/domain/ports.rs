use crate::utils::error::Result;
use async_trait::async_trait;
use serde_json::Value;

/// A paginated listing keyed by relative path (`/regions`, `/clusters/{id}/nodes`, ...).
#[async_trait]
pub trait ResourceSource: Send + Sync {
    /// Every item across every page, in page order. Any failed page fails the
    /// whole call; partially fetched pages are never returned.
    async fn fetch(&self, path: &str) -> Result<Vec<Value>>;
}
