//! Slack Web API client backing the [`Workspace`] trait.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::{Channel, Message, Page, PlatformError, UserProfile, Workspace};
use crate::config::SlackConfig;

const CHANNEL_PAGE_SIZE: usize = 100;
const MEMBER_PAGE_SIZE: usize = 1000;
const CHANNEL_TYPES: &str = "public_channel,private_channel";

#[derive(Debug, Default, Deserialize)]
struct ResponseMetadata {
    #[serde(default)]
    next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AuthTestResponse {
    user_id: String,
}

#[derive(Debug, Deserialize)]
struct ChannelsResponse {
    #[serde(default)]
    channels: Vec<Channel>,
    #[serde(default)]
    response_metadata: ResponseMetadata,
}

#[derive(Debug, Deserialize)]
struct ChannelInfoResponse {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct MembersResponse {
    #[serde(default)]
    members: Vec<String>,
    #[serde(default)]
    response_metadata: ResponseMetadata,
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    #[serde(default)]
    messages: Vec<Message>,
}

#[derive(Debug, Deserialize)]
struct PermalinkResponse {
    permalink: String,
}

#[derive(Debug, Deserialize)]
struct UserInfoResponse {
    user: UserProfile,
}

#[derive(Debug, Deserialize)]
struct PostMessageResponse {}

/// Treat `""` as "no further pages", which is how Slack signals the end
fn next_cursor(metadata: ResponseMetadata) -> Option<String> {
    metadata.next_cursor.filter(|cursor| !cursor.is_empty())
}

pub struct SlackClient {
    http: reqwest::Client,
    api_base: String,
    bot_token: String,
}

impl SlackClient {
    pub fn new(config: &SlackConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("ackbot/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_millis(config.request_timeout_ms.max(1)))
            .build()
            .context("Failed to create Slack HTTP client")?;

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            bot_token: config.bot_token.trim().to_string(),
        })
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{}", self.api_base, method)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        method: &str,
        query: &[(&str, String)],
    ) -> Result<T, PlatformError> {
        let request = self
            .http
            .get(self.url(method))
            .bearer_auth(&self.bot_token)
            .query(query);
        self.send(method, request).await
    }

    async fn post<T: DeserializeOwned>(
        &self,
        method: &str,
        body: &Value,
    ) -> Result<T, PlatformError> {
        let request = self
            .http
            .post(self.url(method))
            .bearer_auth(&self.bot_token)
            .json(body);
        self.send(method, request).await
    }

    /// Single attempt: Slack errors surface to the caller, which decides
    /// whether to skip or abort.
    async fn send<T: DeserializeOwned>(
        &self,
        method: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<T, PlatformError> {
        debug!("Calling Slack {}", method);

        let response = request
            .send()
            .await
            .map_err(|source| PlatformError::Transport {
                method: method.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(PlatformError::Status {
                method: method.to_string(),
                status: status.as_u16(),
            });
        }

        let raw = response
            .text()
            .await
            .map_err(|source| PlatformError::Transport {
                method: method.to_string(),
                source,
            })?;
        let body: Value = serde_json::from_str(&raw).map_err(|source| PlatformError::Decode {
            method: method.to_string(),
            source,
        })?;

        if !body.get("ok").and_then(Value::as_bool).unwrap_or(false) {
            let code = body
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("unknown_error");
            return Err(PlatformError::api(method, code));
        }

        serde_json::from_value(body).map_err(|source| PlatformError::Decode {
            method: method.to_string(),
            source,
        })
    }
}

#[async_trait]
impl Workspace for SlackClient {
    async fn own_user_id(&self) -> Result<String, PlatformError> {
        let response: AuthTestResponse = self.post("auth.test", &json!({})).await?;
        Ok(response.user_id)
    }

    async fn list_channels(&self, cursor: Option<&str>) -> Result<Page<Channel>, PlatformError> {
        let mut query = vec![
            ("types", CHANNEL_TYPES.to_string()),
            ("limit", CHANNEL_PAGE_SIZE.to_string()),
        ];
        if let Some(cursor) = cursor {
            query.push(("cursor", cursor.to_string()));
        }
        let response: ChannelsResponse = self.get("conversations.list", &query).await?;
        Ok(Page {
            items: response.channels,
            next_cursor: next_cursor(response.response_metadata),
        })
    }

    async fn channel_info(&self, channel_id: &str) -> Result<Channel, PlatformError> {
        let response: ChannelInfoResponse = self
            .get("conversations.info", &[("channel", channel_id.to_string())])
            .await?;
        Ok(response.channel)
    }

    async fn list_members(
        &self,
        channel_id: &str,
        cursor: Option<&str>,
    ) -> Result<Page<String>, PlatformError> {
        let mut query = vec![
            ("channel", channel_id.to_string()),
            ("limit", MEMBER_PAGE_SIZE.to_string()),
        ];
        if let Some(cursor) = cursor {
            query.push(("cursor", cursor.to_string()));
        }
        let response: MembersResponse = self.get("conversations.members", &query).await?;
        Ok(Page {
            items: response.members,
            next_cursor: next_cursor(response.response_metadata),
        })
    }

    async fn history(&self, channel_id: &str, limit: usize) -> Result<Vec<Message>, PlatformError> {
        let response: HistoryResponse = self
            .get(
                "conversations.history",
                &[
                    ("channel", channel_id.to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;
        Ok(response.messages)
    }

    async fn permalink(&self, channel_id: &str, ts: &str) -> Result<String, PlatformError> {
        let response: PermalinkResponse = self
            .get(
                "chat.getPermalink",
                &[
                    ("channel", channel_id.to_string()),
                    ("message_ts", ts.to_string()),
                ],
            )
            .await?;
        Ok(response.permalink)
    }

    async fn user_profile(&self, user_id: &str) -> Result<UserProfile, PlatformError> {
        let response: UserInfoResponse = self
            .get("users.info", &[("user", user_id.to_string())])
            .await?;
        Ok(response.user)
    }

    async fn send_direct(&self, user_id: &str, text: &str) -> Result<(), PlatformError> {
        // Posting to a user id lands in the bot's DM with that user
        let _: PostMessageResponse = self
            .post(
                "chat.postMessage",
                &json!({
                    "channel": user_id,
                    "text": text,
                    "unfurl_links": false,
                    "unfurl_media": false,
                }),
            )
            .await?;
        Ok(())
    }
}
