// SearchProvider — the seam between chat commands and web/video search backends.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One search result, reduced to what the chat reply shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Return at most `limit` results for `query`, best first.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>>;
}
