pub mod slack;

use async_trait::async_trait;
use serde::Deserialize;

/// Slack's own system account. Never a reminder recipient.
pub const SYSTEM_USER_ID: &str = "USLACKBOT";

/// A conversation the bot can see
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Channel {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Whether the bot itself belongs to the channel
    #[serde(default)]
    pub is_member: bool,
}

/// One reaction label and the users who applied it
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[allow(dead_code)]
pub struct Reaction {
    pub name: String,
    #[serde(default)]
    pub users: Vec<String>,
}

/// Snapshot of a channel message as returned by history
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Message {
    /// Timestamp token; doubles as the message id
    pub ts: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub reactions: Vec<Reaction>,
}

impl Message {
    /// Message text, empty when the platform sent none
    pub fn body(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UserProfile {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub real_name: Option<String>,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub deleted: bool,
}

impl UserProfile {
    /// Best human-readable name, falling back to the user id
    pub fn display_name(&self) -> &str {
        self.real_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .or(self.name.as_deref())
            .unwrap_or(self.id.as_str())
    }

    /// Humans only: bots, deleted accounts and the system account never get digests
    pub fn is_deliverable(&self) -> bool {
        !self.is_bot && !self.deleted && self.id != SYSTEM_USER_ID
    }
}

/// One page of a cursor-paginated listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    /// The API answered but reported `ok: false`
    #[error("{method} failed: {code}")]
    Api { method: String, code: String },
    #[error("{method} returned HTTP {status}")]
    Status { method: String, status: u16 },
    #[error("{method} request failed: {source}")]
    Transport {
        method: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to decode {method} response: {source}")]
    Decode {
        method: String,
        #[source]
        source: serde_json::Error,
    },
}

impl PlatformError {
    pub fn api(method: &str, code: &str) -> Self {
        Self::Api {
            method: method.to_string(),
            code: code.to_string(),
        }
    }

    /// Platform error code suitable for logs (e.g. `channel_not_found`)
    pub fn code(&self) -> String {
        match self {
            Self::Api { code, .. } => code.clone(),
            Self::Status { status: 429, .. } => "ratelimited".to_string(),
            Self::Status { status, .. } => format!("http_{}", status),
            Self::Transport { .. } => "transport_error".to_string(),
            Self::Decode { .. } => "invalid_response".to_string(),
        }
    }
}

/// The messaging workspace as seen by the reminder engine.
///
/// Every method is a single external call; callers await each one before
/// issuing the next.
#[async_trait]
pub trait Workspace: Send + Sync {
    /// User id the bot posts as
    async fn own_user_id(&self) -> Result<String, PlatformError>;

    async fn list_channels(&self, cursor: Option<&str>) -> Result<Page<Channel>, PlatformError>;

    async fn channel_info(&self, channel_id: &str) -> Result<Channel, PlatformError>;

    async fn list_members(
        &self,
        channel_id: &str,
        cursor: Option<&str>,
    ) -> Result<Page<String>, PlatformError>;

    /// Most recent `limit` messages, newest first as the platform returns them
    async fn history(&self, channel_id: &str, limit: usize) -> Result<Vec<Message>, PlatformError>;

    async fn permalink(&self, channel_id: &str, ts: &str) -> Result<String, PlatformError>;

    async fn user_profile(&self, user_id: &str) -> Result<UserProfile, PlatformError>;

    /// Deliver `text` privately to `user_id`
    async fn send_direct(&self, user_id: &str, text: &str) -> Result<(), PlatformError>;
}
