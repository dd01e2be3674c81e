// Google Programmable Search (Custom Search JSON API) client.
//
// API docs: https://developers.google.com/custom-search/v1/reference/rest/v1/cse/list

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::traits::{SearchHit, SearchProvider};

pub const DEFAULT_API_URL: &str = "https://www.googleapis.com/customsearch/v1";

/// The API never returns more than 10 results per request.
const MAX_RESULTS: usize = 10;

pub struct GoogleSearch {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    engine_id: String,
}

impl GoogleSearch {
    pub fn new(api_key: String, engine_id: String, timeout: Duration) -> Result<Self> {
        Self::with_url(DEFAULT_API_URL, api_key, engine_id, timeout)
    }

    pub fn with_url(
        api_url: &str,
        api_key: String,
        engine_id: String,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_url: api_url.to_string(),
            api_key,
            engine_id,
        })
    }
}

#[async_trait]
impl SearchProvider for GoogleSearch {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        let num = limit.clamp(1, MAX_RESULTS).to_string();
        let response = self
            .client
            .get(&self.api_url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("cx", self.engine_id.as_str()),
                ("q", query),
                ("num", num.as_str()),
                ("safe", "off"),
            ])
            .send()
            .await
            .context("Google search request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Google search returned {}: {}", status, body);
        }

        let result: CseResponse = response
            .json()
            .await
            .context("Failed to parse Google search response")?;

        debug!(query, hits = result.items.len(), "Google search complete");

        Ok(into_hits(result, limit))
    }
}

fn into_hits(response: CseResponse, limit: usize) -> Vec<SearchHit> {
    response
        .items
        .into_iter()
        .take(limit)
        .map(|item| SearchHit {
            title: item.title,
            url: item.link,
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct CseResponse {
    /// Absent entirely when the search has no results.
    #[serde(default)]
    items: Vec<CseItem>,
}

#[derive(Debug, Deserialize)]
struct CseItem {
    title: String,
    link: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_items_means_no_hits() {
        let resp: CseResponse =
            serde_json::from_str(r#"{"kind":"customsearch#search"}"#).unwrap();
        assert!(into_hits(resp, 3).is_empty());
    }

    #[test]
    fn test_hits_are_truncated_to_limit() {
        let resp: CseResponse = serde_json::from_str(
            r#"{"items":[
                {"title":"One","link":"https://one.example"},
                {"title":"Two","link":"https://two.example"},
                {"title":"Three","link":"https://three.example"},
                {"title":"Four","link":"https://four.example"}
            ]}"#,
        )
        .unwrap();
        let hits = into_hits(resp, 3);
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].url, "https://one.example");
    }
}
