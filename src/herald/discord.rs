use crate::error::HeraldError;
use crate::herald::config::HeraldConfig;
use anyhow::{Context, Result};
use reqwest::blocking::Client;
use std::thread;
use std::time::Duration;

const YOUTUBE_WATCH_URL: &str = "https://www.youtube.com/watch?v=";
const FALLBACK_AVATAR_URL: &str =
    "https://www.youtube.com/s/desktop/28b0985e/img/favicon_144x144.png";

/// One outbound notification, already composed; the sink only delivers it.
#[derive(Debug, Clone)]
pub struct Notification {
    pub channel_name: String,
    pub avatar_url: Option<String>,
    pub video_id: String,
    pub text: String,
    pub target: Option<String>,
}

pub trait NotificationSink {
    fn send(&self, note: &Notification) -> Result<(), HeraldError>;
}

pub struct DiscordWebhook {
    client: Client,
    config: HeraldConfig,
}

impl DiscordWebhook {
    pub fn new(cfg: &HeraldConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(cfg.http_timeout)
            .build()
            .context("failed to build webhook http client")?;
        Ok(Self {
            client,
            config: cfg.clone(),
        })
    }
}

impl NotificationSink for DiscordWebhook {
    fn send(&self, note: &Notification) -> Result<(), HeraldError> {
        let target_label = note.target.clone().unwrap_or_else(|| "default".to_string());
        let url = self
            .config
            .webhook_for_target(note.target.as_deref())
            .ok_or(HeraldError::WebhookMissing(target_label))?;

        let payload = serde_json::json!({
            "username": note.channel_name,
            "avatar_url": note.avatar_url.as_deref().unwrap_or(FALLBACK_AVATAR_URL),
            "tts": false,
            "content": format!("[{}]({}{})", note.text, YOUTUBE_WATCH_URL, note.video_id),
        });

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .map_err(|err| HeraldError::WebhookRejected(err.to_string()))?;
        if !response.status().is_success() {
            return Err(HeraldError::WebhookRejected(format!(
                "http status {}",
                response.status()
            )));
        }

        // Fixed pacing for the webhook rate limit; the only intentional delay
        // in a run.
        thread::sleep(self.config.send_cooldown);
        Ok(())
    }
}

/// Reachability probe for cached icon URLs.
pub trait UrlProbe {
    fn is_reachable(&self, url: &str) -> bool;
}

pub struct HttpProbe {
    client: Client,
}

impl HttpProbe {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build probe http client")?;
        Ok(Self { client })
    }
}

impl UrlProbe for HttpProbe {
    fn is_reachable(&self, url: &str) -> bool {
        match self.client.get(url).send() {
            Ok(response) => response.status().as_u16() == 200,
            Err(_) => false,
        }
    }
}
