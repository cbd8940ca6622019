#![forbid(unsafe_code)]

//! YouTube Data API v3 client.
//!
//! `ureq` is blocking, so every request runs on Tokio's blocking pool. That
//! keeps the collector on a single task while concurrent lookups still hit the
//! network in parallel.

use anyhow::{Context, Result, anyhow};
use log::debug;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::api::{PAGE_SIZE, VideoApi};
use crate::config::CollectorConfig;
use crate::models::{SearchPage, Thumbnail, VideoRef, VideoStatRecord};

const SEARCH_ENDPOINT: &str = "search";
const VIDEOS_ENDPOINT: &str = "videos";
const ERROR_BODY_LIMIT: usize = 512;

#[derive(Clone)]
pub struct YouTubeClient {
    agent: ureq::Agent,
    api_base: String,
    api_key: String,
}

impl YouTubeClient {
    pub fn new(api_base: &str, api_key: &str, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            agent,
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    pub fn from_config(config: &CollectorConfig) -> Self {
        Self::new(&config.api_base, &config.api_key, config.http_timeout)
    }

    async fn get_json<T>(
        &self,
        endpoint: &'static str,
        params: Vec<(&'static str, String)>,
    ) -> Result<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let agent = self.agent.clone();
        let url = format!("{}/{endpoint}", self.api_base);
        let api_key = self.api_key.clone();

        tokio::task::spawn_blocking(move || {
            let mut request = agent.get(&url);
            for (name, value) in &params {
                request = request.query(name, value);
            }
            let response = request
                .query("key", &api_key)
                .call()
                .map_err(|err| describe_error(endpoint, err))?;
            response
                .into_json::<T>()
                .with_context(|| format!("decoding {endpoint} response"))
        })
        .await
        .with_context(|| format!("{endpoint} request worker failed"))?
    }
}

fn describe_error(endpoint: &str, err: ureq::Error) -> anyhow::Error {
    match err {
        ureq::Error::Status(code, response) => {
            let mut body = response.into_string().unwrap_or_default();
            if body.len() > ERROR_BODY_LIMIT {
                let mut cut = ERROR_BODY_LIMIT;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            anyhow!("{endpoint} returned HTTP {code}: {}", body.trim())
        }
        // Transport's Display includes the URL, which carries the API key.
        ureq::Error::Transport(transport) => match transport.message() {
            Some(message) => anyhow!("{endpoint} request failed: {}: {message}", transport.kind()),
            None => anyhow!("{endpoint} request failed: {}", transport.kind()),
        },
    }
}

impl VideoApi for YouTubeClient {
    async fn search_videos(
        &self,
        channel_id: &str,
        page_token: Option<&str>,
    ) -> Result<SearchPage> {
        debug!(
            "Requesting search page for {channel_id} (token: {})",
            page_token.unwrap_or("<first>")
        );
        let params = vec![
            ("part", "id".to_string()),
            ("channelId", channel_id.to_string()),
            ("type", "video".to_string()),
            ("maxResults", PAGE_SIZE.to_string()),
            ("pageToken", page_token.unwrap_or_default().to_string()),
        ];
        let response: SearchResponse = self.get_json(SEARCH_ENDPOINT, params).await?;
        Ok(response.into_page())
    }

    async fn video_stats(&self, video_id: &str) -> Result<Option<VideoStatRecord>> {
        debug!("Requesting statistics for {video_id}");
        let params = vec![
            ("part", "statistics,snippet".to_string()),
            ("id", video_id.to_string()),
        ];
        let response: VideosResponse = self.get_json(VIDEOS_ENDPOINT, params).await?;
        Ok(response.into_record())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItemId {
    video_id: Option<String>,
}

impl SearchResponse {
    fn into_page(self) -> SearchPage {
        let videos = self
            .items
            .into_iter()
            .filter_map(|item| item.id.video_id)
            .filter(|id| !id.is_empty())
            .map(VideoRef::new)
            .collect();
        let next_page_token = self.next_page_token.filter(|token| !token.is_empty());
        SearchPage {
            videos,
            next_page_token,
        }
    }
}

#[derive(Debug, Deserialize)]
struct VideosResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    id: String,
    #[serde(default)]
    snippet: VideoSnippet,
    #[serde(default)]
    statistics: VideoStatistics,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoSnippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    published_at: String,
    #[serde(default)]
    thumbnails: BTreeMap<String, Thumbnail>,
}

/// The API sends counts as decimal strings.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoStatistics {
    view_count: Option<String>,
    like_count: Option<String>,
}

fn parse_count(value: Option<String>) -> Option<u64> {
    value.and_then(|raw| raw.trim().parse().ok())
}

impl VideosResponse {
    fn into_record(self) -> Option<VideoStatRecord> {
        let item = self.items.into_iter().next()?;
        Some(VideoStatRecord {
            id: item.id,
            title: item.snippet.title,
            description: item.snippet.description,
            view_count: parse_count(item.statistics.view_count),
            like_count: parse_count(item.statistics.like_count),
            published_at: item.snippet.published_at,
            thumbnails: item.snippet.thumbnails,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_response_collects_video_ids_and_token() {
        let raw = r#"{
            "kind": "youtube#searchListResponse",
            "nextPageToken": "CDIQAA",
            "pageInfo": {"totalResults": 3, "resultsPerPage": 50},
            "items": [
                {"kind": "youtube#searchResult", "id": {"kind": "youtube#video", "videoId": "abc"}},
                {"kind": "youtube#searchResult", "id": {"kind": "youtube#channel", "channelId": "UC1"}},
                {"kind": "youtube#searchResult", "id": {"kind": "youtube#video", "videoId": "def"}}
            ]
        }"#;
        let page = serde_json::from_str::<SearchResponse>(raw)
            .unwrap()
            .into_page();
        assert_eq!(page.videos, vec![VideoRef::new("abc"), VideoRef::new("def")]);
        assert_eq!(page.next_page_token.as_deref(), Some("CDIQAA"));
    }

    #[test]
    fn search_response_without_items_is_empty_last_page() {
        let raw = r#"{"kind":"youtube#searchListResponse"}"#;
        let page = serde_json::from_str::<SearchResponse>(raw)
            .unwrap()
            .into_page();
        assert!(page.videos.is_empty());
        assert!(page.next_page_token.is_none());
    }

    #[test]
    fn videos_response_maps_statistics_and_snippet() {
        let raw = r#"{
            "items": [{
                "id": "abc",
                "snippet": {
                    "publishedAt": "2023-02-11T16:00:08Z",
                    "title": "Launch day",
                    "description": "We shipped it.",
                    "thumbnails": {
                        "default": {"url": "https://i.ytimg.com/vi/abc/default.jpg", "width": 120, "height": 90},
                        "high": {"url": "https://i.ytimg.com/vi/abc/hqdefault.jpg", "width": 480, "height": 360}
                    }
                },
                "statistics": {"viewCount": "12345", "likeCount": "678", "commentCount": "9"}
            }]
        }"#;
        let record = serde_json::from_str::<VideosResponse>(raw)
            .unwrap()
            .into_record()
            .expect("record present");
        assert_eq!(record.id, "abc");
        assert_eq!(record.title, "Launch day");
        assert_eq!(record.view_count, Some(12345));
        assert_eq!(record.like_count, Some(678));
        assert_eq!(record.published_at, "2023-02-11T16:00:08Z");
        assert_eq!(record.thumbnails.len(), 2);
        assert_eq!(record.thumbnails["high"].width, Some(480));
    }

    #[test]
    fn videos_response_hidden_likes_are_absent() {
        let raw = r#"{"items": [{"id": "x", "snippet": {"title": "t"}, "statistics": {"viewCount": "7"}}]}"#;
        let record = serde_json::from_str::<VideosResponse>(raw)
            .unwrap()
            .into_record()
            .unwrap();
        assert_eq!(record.view_count, Some(7));
        assert_eq!(record.like_count, None);
        assert!(record.thumbnails.is_empty());
    }

    #[test]
    fn videos_response_without_items_is_none() {
        let response = serde_json::from_str::<VideosResponse>(r#"{"items": []}"#).unwrap();
        assert!(response.into_record().is_none());
    }

    #[test]
    fn client_trims_trailing_slash_from_base() {
        let client = YouTubeClient::new("http://localhost:3000/v3/", "key", Duration::from_secs(1));
        assert_eq!(client.api_base, "http://localhost:3000/v3");
    }
}
