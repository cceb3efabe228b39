//! Instagram Graph API client for the home page feed.
//!
//! Fetches the brand account's recent media and normalizes it into
//! [`InstagramPost`]s. Responses are cached for 10 minutes per limit.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use moka::future::Cache;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use crate::config::InstagramConfig;

/// Media fields requested from the Graph API.
const MEDIA_FIELDS: &str = "id,caption,media_type,media_url,permalink,thumbnail_url,timestamp";

/// Posts returned when no limit is given.
pub const DEFAULT_LIMIT: u32 = 12;

/// Largest accepted limit.
pub const MAX_LIMIT: u32 = 25;

const CACHE_TTL: Duration = Duration::from_secs(600);

/// Errors that can occur when interacting with the Instagram API.
#[derive(Debug, Error)]
pub enum InstagramError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
}

/// Kind of Instagram media.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MediaType {
    Image,
    Video,
    CarouselAlbum,
}

/// A post ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstagramPost {
    pub id: String,
    pub caption: Option<String>,
    pub media_type: MediaType,
    /// Image to show; the thumbnail for videos.
    pub image_url: String,
    pub permalink: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct MediaResponse {
    data: Vec<RawMedia>,
}

#[derive(Debug, Deserialize)]
struct RawMedia {
    id: String,
    caption: Option<String>,
    media_type: MediaType,
    media_url: Option<String>,
    permalink: String,
    thumbnail_url: Option<String>,
    #[serde(deserialize_with = "graph_timestamp")]
    timestamp: DateTime<Utc>,
}

/// Graph API timestamps use `+0000` offsets rather than RFC 3339's `+00:00`.
fn graph_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    DateTime::parse_from_rfc3339(&raw)
        .or_else(|_| DateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%z"))
        .map(|at| at.with_timezone(&Utc))
        .map_err(serde::de::Error::custom)
}

impl RawMedia {
    fn into_post(self) -> Option<InstagramPost> {
        let image_url = match self.media_type {
            MediaType::Video => self.thumbnail_url.or(self.media_url),
            MediaType::Image | MediaType::CarouselAlbum => self.media_url,
        }?;

        Some(InstagramPost {
            id: self.id,
            caption: self.caption,
            media_type: self.media_type,
            image_url,
            permalink: self.permalink,
            timestamp: self.timestamp,
        })
    }
}

/// Clamp a requested limit to `1..=25`, defaulting to 12.
#[must_use]
pub fn clamp_limit(requested: Option<u32>) -> u32 {
    requested.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

/// Instagram Graph API client.
#[derive(Clone)]
pub struct InstagramClient {
    client: reqwest::Client,
    access_token: SecretString,
    media_url: String,
    cache: Cache<u32, Arc<Vec<InstagramPost>>>,
}

impl InstagramClient {
    /// Create a new Instagram client.
    #[must_use]
    pub fn new(config: &InstagramConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(u64::from(MAX_LIMIT))
            .time_to_live(CACHE_TTL)
            .build();

        Self {
            client: reqwest::Client::new(),
            access_token: config.access_token.clone(),
            media_url: format!(
                "{}/{}/media",
                config.api_base.trim_end_matches('/'),
                config.user_id
            ),
            cache,
        }
    }

    /// Fetch the most recent posts.
    ///
    /// Media without a displayable image is skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or returns a non-success status.
    #[instrument(skip(self))]
    pub async fn recent_posts(&self, limit: u32) -> Result<Arc<Vec<InstagramPost>>, InstagramError> {
        let limit = limit.clamp(1, MAX_LIMIT);

        if let Some(posts) = self.cache.get(&limit).await {
            tracing::debug!(limit, "Instagram cache hit");
            return Ok(posts);
        }

        let limit_param = limit.to_string();
        let response = self
            .client
            .get(&self.media_url)
            .query(&[
                ("fields", MEDIA_FIELDS),
                ("limit", limit_param.as_str()),
                ("access_token", self.access_token.expose_secret()),
            ])
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "Instagram API error");
            return Err(InstagramError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let media: MediaResponse = response.json().await?;
        let posts: Arc<Vec<InstagramPost>> = Arc::new(
            media
                .data
                .into_iter()
                .filter_map(RawMedia::into_post)
                .collect(),
        );

        self.cache.insert(limit, Arc::clone(&posts)).await;
        Ok(posts)
    }

    /// Lightweight reachability probe for health checks.
    ///
    /// # Errors
    ///
    /// Returns an error if the API cannot be reached or rejects the token.
    pub async fn ping(&self) -> Result<(), InstagramError> {
        self.cache.invalidate(&1).await;
        self.recent_posts(1).await.map(|_| ())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;

    fn client_for(server: &MockServer) -> InstagramClient {
        InstagramClient::new(&InstagramConfig {
            access_token: SecretString::from("ig-token"),
            user_id: "17841400000000000".to_string(),
            api_base: server.base_url(),
        })
    }

    fn media_body() -> serde_json::Value {
        json!({ "data": [
            {
                "id": "1",
                "caption": "New drop",
                "media_type": "IMAGE",
                "media_url": "https://scontent.cdninstagram.com/1.jpg",
                "permalink": "https://www.instagram.com/p/1/",
                "timestamp": "2025-06-01T12:00:00+0000"
            },
            {
                "id": "2",
                "media_type": "VIDEO",
                "media_url": "https://video.cdninstagram.com/2.mp4",
                "thumbnail_url": "https://scontent.cdninstagram.com/2.jpg",
                "permalink": "https://www.instagram.com/reel/2/",
                "timestamp": "2025-05-30T08:00:00+0000"
            }
        ] })
    }

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(None), 12);
        assert_eq!(clamp_limit(Some(0)), 1);
        assert_eq!(clamp_limit(Some(5)), 5);
        assert_eq!(clamp_limit(Some(100)), 25);
    }

    #[tokio::test]
    async fn test_recent_posts_uses_video_thumbnail() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/17841400000000000/media")
                .query_param("limit", "6")
                .query_param("access_token", "ig-token");
            then.status(200).json_body(media_body());
        });

        let posts = client_for(&server).recent_posts(6).await.unwrap();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].caption.as_deref(), Some("New drop"));
        assert_eq!(posts[1].media_type, MediaType::Video);
        assert_eq!(posts[1].image_url, "https://scontent.cdninstagram.com/2.jpg");
        mock.assert();
    }

    #[tokio::test]
    async fn test_recent_posts_are_cached() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/17841400000000000/media");
            then.status(200).json_body(media_body());
        });

        let client = client_for(&server);
        client.recent_posts(12).await.unwrap();
        client.recent_posts(12).await.unwrap();
        mock.assert_calls(1);
    }

    #[tokio::test]
    async fn test_api_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET);
            then.status(400)
                .json_body(json!({ "error": { "message": "Invalid OAuth access token" } }));
        });

        let err = client_for(&server).recent_posts(12).await.unwrap_err();
        assert!(matches!(err, InstagramError::Api { status: 400, .. }));
    }
}
