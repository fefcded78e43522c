use crate::error::HeraldError;
use crate::herald::config::HeraldConfig;
use crate::herald::duration::format_duration;
use crate::herald::lifecycle::{self, LiveStreamingDetails};
use crate::herald::model::VideoApiInfo;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use serde::Deserialize;

/// Metadata lookups against the video platform: per-video lifecycle fields and
/// the channel avatar used on notifications.
pub trait VideoApi {
    /// `Ok(None)` means the API answered but had no information for the id;
    /// the caller treats that the same as the `none` lifecycle sentinel.
    fn video_info(&self, video_id: &str) -> Result<Option<VideoApiInfo>, HeraldError>;

    fn channel_icon_url(&self, channel_id: &str) -> Result<Option<String>, HeraldError>;
}

pub struct DataApi {
    client: Client,
    base_url: String,
    api_key: String,
}

impl DataApi {
    pub fn new(cfg: &HeraldConfig, api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(cfg.http_timeout)
            .build()
            .context("failed to build api http client")?;
        Ok(Self {
            client,
            base_url: cfg.api_base_url.clone(),
            api_key,
        })
    }

    fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        id: &str,
    ) -> Result<T, HeraldError> {
        let failed = |reason: String| HeraldError::LookupFailed {
            video_id: id.to_string(),
            reason,
        };
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|err| failed(err.to_string()))?;
        if !response.status().is_success() {
            return Err(failed(format!("http status {}", response.status())));
        }
        response.json::<T>().map_err(|err| failed(err.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoItem {
    snippet: Option<VideoSnippet>,
    live_streaming_details: Option<LiveStreamingDetailsDto>,
    content_details: Option<ContentDetails>,
}

#[derive(Debug, Deserialize)]
struct VideoSnippet {
    #[serde(default)]
    title: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LiveStreamingDetailsDto {
    scheduled_start_time: Option<DateTime<Utc>>,
    actual_start_time: Option<DateTime<Utc>>,
    actual_end_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct ContentDetails {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChannelListResponse {
    #[serde(default)]
    items: Vec<ChannelItem>,
}

#[derive(Debug, Deserialize)]
struct ChannelItem {
    snippet: Option<ChannelSnippet>,
}

#[derive(Debug, Deserialize)]
struct ChannelSnippet {
    thumbnails: Option<Thumbnails>,
}

#[derive(Debug, Deserialize)]
struct Thumbnails {
    default: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: Option<String>,
}

fn video_info_from_item(item: VideoItem) -> VideoApiInfo {
    let details = item.live_streaming_details.map(|dto| LiveStreamingDetails {
        scheduled_start: dto.scheduled_start_time,
        actual_start: dto.actual_start_time,
        actual_end: dto.actual_end_time,
    });
    let stage = lifecycle::classify(details.as_ref());
    let details = details.unwrap_or_default();
    let raw_duration = item
        .content_details
        .and_then(|c| c.duration)
        .unwrap_or_else(|| "P0D".to_string());

    VideoApiInfo {
        stage,
        title: item.snippet.map(|s| s.title).unwrap_or_default(),
        scheduled_start: details.scheduled_start,
        actual_start: details.actual_start,
        duration_text: format_duration(&raw_duration),
    }
}

impl VideoApi for DataApi {
    fn video_info(&self, video_id: &str) -> Result<Option<VideoApiInfo>, HeraldError> {
        let url = format!(
            "{}/videos?part=snippet,liveStreamingDetails,contentDetails&id={}&key={}",
            self.base_url, video_id, self.api_key
        );
        let response: VideoListResponse = self.get_json(&url, video_id)?;
        Ok(response.items.into_iter().next().map(video_info_from_item))
    }

    fn channel_icon_url(&self, channel_id: &str) -> Result<Option<String>, HeraldError> {
        let url = format!(
            "{}/channels?part=snippet&id={}&maxResults=1&key={}",
            self.base_url, channel_id, self.api_key
        );
        let response: ChannelListResponse = self.get_json(&url, channel_id)?;
        Ok(response
            .items
            .into_iter()
            .next()
            .and_then(|item| item.snippet)
            .and_then(|snippet| snippet.thumbnails)
            .and_then(|thumbs| thumbs.default)
            .and_then(|thumb| thumb.url))
    }
}
