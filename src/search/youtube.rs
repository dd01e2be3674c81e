// YouTube Data API v3 video search client.
//
// API docs: https://developers.google.com/youtube/v3/docs/search/list

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::traits::{SearchHit, SearchProvider};

pub const DEFAULT_API_URL: &str = "https://www.googleapis.com/youtube/v3/search";

const MAX_RESULTS: usize = 50;

pub struct YouTubeSearch {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl YouTubeSearch {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_url: DEFAULT_API_URL.to_string(),
            api_key,
        })
    }
}

#[async_trait]
impl SearchProvider for YouTubeSearch {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        let max_results = limit.clamp(1, MAX_RESULTS).to_string();
        let response = self
            .client
            .get(&self.api_url)
            .query(&[
                ("part", "snippet"),
                ("type", "video"),
                ("q", query),
                ("maxResults", max_results.as_str()),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await
            .context("YouTube search request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("YouTube search returned {}: {}", status, body);
        }

        let result: SearchListResponse = response
            .json()
            .await
            .context("Failed to parse YouTube search response")?;

        debug!(query, hits = result.items.len(), "YouTube search complete");

        Ok(into_hits(result, limit))
    }
}

fn into_hits(response: SearchListResponse, limit: usize) -> Vec<SearchHit> {
    response
        .items
        .into_iter()
        .filter_map(|item| {
            let video_id = item.id.video_id?;
            Some(SearchHit {
                title: item.snippet.title,
                url: format!("https://www.youtube.com/watch?v={video_id}"),
            })
        })
        .take(limit)
        .collect()
}

#[derive(Debug, Deserialize)]
struct SearchListResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: ResourceId,
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceId {
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Snippet {
    title: String,
}
