use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

use crate::reminders::aggregate::ChannelScope;
use crate::reminders::format::DEFAULT_PREVIEW_LENGTH;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub slack: SlackConfig,
    #[serde(default = "default_reminder_config")]
    pub reminder: ReminderConfig,
    #[serde(default)]
    pub schedule: Option<ScheduleConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SlackConfig {
    /// Bot token; falls back to the SLACK_BOT_TOKEN environment variable when empty
    #[serde(default)]
    pub bot_token: String,
    /// Legacy single-channel mode
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub channels: Vec<String>,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReminderConfig {
    #[serde(default = "default_marker")]
    pub marker: String,
    #[serde(default = "default_message")]
    pub message: String,
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    #[serde(default = "default_preview_length")]
    pub preview_length: usize,
    #[serde(default = "default_send_delay_ms")]
    pub send_delay_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScheduleConfig {
    /// Six-field cron expression (seconds first), e.g. "0 0 9 * * Mon-Fri"
    pub cron: String,
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            channel_id: None,
            channels: Vec::new(),
            api_base: default_api_base(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

fn default_api_base() -> String {
    "https://slack.com/api".to_string()
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_marker() -> String {
    "#important".to_string()
}

fn default_message() -> String {
    "Hi! Looks like you haven't reacted to these important messages yet:".to_string()
}

fn default_history_limit() -> usize {
    50
}

fn default_preview_length() -> usize {
    DEFAULT_PREVIEW_LENGTH
}

fn default_send_delay_ms() -> u64 {
    500
}

fn default_reminder_config() -> ReminderConfig {
    ReminderConfig {
        marker: default_marker(),
        message: default_message(),
        history_limit: default_history_limit(),
        preview_length: default_preview_length(),
        send_delay_ms: default_send_delay_ms(),
    }
}

/// Flat `config.json` layout used by the first versions of the bot.
#[derive(Debug, Deserialize)]
struct LegacyConfig {
    #[serde(rename = "SLACK_BOT_TOKEN", default)]
    bot_token: Option<String>,
    #[serde(rename = "CHANNEL_ID", default)]
    channel_id: Option<String>,
    #[serde(rename = "TARGET_HASHTAG", default)]
    marker: Option<String>,
    #[serde(rename = "REMINDER_MESSAGE", default)]
    message: Option<String>,
}

impl From<LegacyConfig> for Config {
    fn from(legacy: LegacyConfig) -> Self {
        Config {
            slack: SlackConfig {
                bot_token: legacy.bot_token.unwrap_or_default(),
                channel_id: legacy.channel_id,
                ..SlackConfig::default()
            },
            reminder: ReminderConfig {
                marker: legacy.marker.unwrap_or_else(default_marker),
                message: legacy.message.unwrap_or_else(default_message),
                ..default_reminder_config()
            },
            schedule: None,
        }
    }
}

impl Config {
    /// Channels to scan: an explicit list when any channel is configured,
    /// otherwise every channel the bot has joined.
    pub fn scope(&self) -> ChannelScope {
        let mut ids: Vec<String> = Vec::new();
        for id in self
            .slack
            .channel_id
            .iter()
            .chain(self.slack.channels.iter())
        {
            let id = id.trim();
            if !ids.iter().any(|existing| existing == id) {
                ids.push(id.to_string());
            }
        }
        if ids.is_empty() {
            ChannelScope::Joined
        } else {
            ChannelScope::Explicit(ids)
        }
    }

    pub fn send_delay(&self) -> Duration {
        Duration::from_millis(self.reminder.send_delay_ms)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let config = if is_json {
            let legacy: LegacyConfig = serde_json::from_str(&content)
                .with_context(|| format!("Config file is not valid JSON: {}", path.display()))?;
            Config::from(legacy)
        } else {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        };

        config.finish(std::env::var("SLACK_BOT_TOKEN").ok())
    }

    /// Apply the environment token fallback and reject unusable settings.
    fn finish(mut self, env_token: Option<String>) -> Result<Self> {
        if self.slack.bot_token.trim().is_empty() {
            if let Some(token) = env_token.filter(|t| !t.trim().is_empty()) {
                self.slack.bot_token = token;
            }
        }
        if self.slack.bot_token.trim().is_empty() {
            bail!("Missing Slack bot token: set [slack] bot_token or SLACK_BOT_TOKEN");
        }

        if let Some(channel_id) = &self.slack.channel_id {
            if channel_id.trim().is_empty() {
                bail!("[slack] channel_id is set but empty");
            }
        }
        if self.slack.channels.iter().any(|id| id.trim().is_empty()) {
            bail!("[slack] channels contains an empty channel id");
        }

        if self.reminder.history_limit == 0 {
            bail!("[reminder] history_limit must be at least 1");
        }

        if let Some(schedule) = &self.schedule {
            if schedule.cron.trim().is_empty() {
                bail!("[schedule] cron must not be empty");
            }
        }

        // Substring match against "" is always true
        if self.reminder.marker.is_empty() {
            warn!("Reminder marker is empty: every recent message will count as tagged");
        }

        Ok(self)
    }
}
