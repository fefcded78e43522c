use anyhow::Result;
use chrono_tz::Tz;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_FEED_BASE_URL: &str = "https://www.youtube.com";
pub const DEFAULT_API_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";
pub const DEFAULT_SEND_COOLDOWN_MS: u64 = 400;
pub const DEFAULT_LOCK_WAIT_SECS: u64 = 10;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct HeraldConfig {
    pub state_file: PathBuf,
    pub api_key: Option<String>,
    pub default_webhook_url: Option<String>,
    pub feed_base_url: String,
    pub api_base_url: String,
    pub display_tz: Tz,
    pub send_cooldown: Duration,
    pub lock_wait: Duration,
    pub http_timeout: Duration,
}

pub fn env_non_empty(var: &str) -> Option<String> {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => Some(v.trim().to_string()),
        _ => None,
    }
}

fn env_u64_or(var: &str, fallback: u64) -> u64 {
    env_non_empty(var)
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(fallback)
}

fn required_home_dir() -> Result<PathBuf> {
    if let Some(home) = dirs::home_dir() {
        return Ok(home);
    }
    Err(anyhow::anyhow!("HOME directory could not be resolved"))
}

pub fn state_file_path() -> Result<PathBuf> {
    if let Some(custom) = env_non_empty("HERALD_STATE_FILE") {
        return Ok(PathBuf::from(custom));
    }
    if let Some(home) = env_non_empty("HERALD_HOME") {
        return Ok(PathBuf::from(home).join("state.json"));
    }
    Ok(required_home_dir()?.join(".yt-herald").join("state.json"))
}

fn display_tz_from_inputs(raw: Option<&str>) -> Tz {
    raw.and_then(|v| v.trim().parse::<Tz>().ok())
        .unwrap_or(chrono_tz::Asia::Tokyo)
}

pub fn load() -> Result<HeraldConfig> {
    let display_tz = display_tz_from_inputs(env_non_empty("HERALD_DISPLAY_TZ").as_deref());

    Ok(HeraldConfig {
        state_file: state_file_path()?,
        api_key: env_non_empty("HERALD_YOUTUBE_API_KEY"),
        default_webhook_url: env_non_empty("HERALD_WEBHOOK_URL"),
        feed_base_url: env_non_empty("HERALD_FEED_BASE_URL")
            .unwrap_or_else(|| DEFAULT_FEED_BASE_URL.to_string()),
        api_base_url: env_non_empty("HERALD_API_BASE_URL")
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
        display_tz,
        send_cooldown: Duration::from_millis(env_u64_or(
            "HERALD_SEND_COOLDOWN_MS",
            DEFAULT_SEND_COOLDOWN_MS,
        )),
        lock_wait: Duration::from_secs(env_u64_or("HERALD_LOCK_WAIT_SECS", DEFAULT_LOCK_WAIT_SECS)),
        http_timeout: Duration::from_secs(env_u64_or(
            "HERALD_HTTP_TIMEOUT_SECS",
            DEFAULT_HTTP_TIMEOUT_SECS,
        )),
    })
}

/// Environment variable naming for a per-channel webhook target, mirroring the
/// script-property lookup the stored target ids were written for:
/// target `ops-room` resolves through `HERALD_WEBHOOK_URL_OPS_ROOM`.
pub fn webhook_env_var(target: &str) -> String {
    let mut name = String::from("HERALD_WEBHOOK_URL_");
    for ch in target.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            name.push(ch.to_ascii_uppercase());
        } else {
            name.push('_');
        }
    }
    name
}

impl HeraldConfig {
    /// Resolve the webhook for an optional per-channel target, falling back to
    /// the default webhook when the target is absent or unconfigured.
    pub fn webhook_for_target(&self, target: Option<&str>) -> Option<String> {
        if let Some(target) = target
            && !target.trim().is_empty()
            && let Some(url) = env_non_empty(&webhook_env_var(target))
        {
            return Some(url);
        }
        self.default_webhook_url.clone()
    }
}
