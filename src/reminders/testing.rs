//! In-memory workspace for exercising the engine and dispatcher.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::platform::{Channel, Message, Page, PlatformError, Reaction, UserProfile, Workspace};

/// A paged listing; `fail_at` makes the fetch of that page index error out.
#[derive(Debug, Clone)]
pub struct Listing<T> {
    pub pages: Vec<Vec<T>>,
    pub fail_at: Option<usize>,
}

impl<T> Default for Listing<T> {
    fn default() -> Self {
        Self {
            pages: Vec::new(),
            fail_at: None,
        }
    }
}

impl<T: Clone> Listing<T> {
    fn page(&self, method: &str, cursor: Option<&str>) -> Result<Page<T>, PlatformError> {
        let index = match cursor {
            None => 0,
            Some(cursor) => cursor
                .strip_prefix("page-")
                .and_then(|n| n.parse().ok())
                .ok_or_else(|| PlatformError::api(method, "invalid_cursor"))?,
        };
        if self.fail_at == Some(index) {
            return Err(PlatformError::api(method, "ratelimited"));
        }
        let items = self.pages.get(index).cloned().unwrap_or_default();
        let next_cursor = (index + 1 < self.pages.len()).then(|| format!("page-{}", index + 1));
        Ok(Page { items, next_cursor })
    }
}

#[derive(Default)]
pub struct FakeWorkspace {
    pub own_id: Option<String>,
    pub channels: Listing<Channel>,
    pub histories: HashMap<String, Vec<Message>>,
    pub failing_histories: HashSet<String>,
    pub members: HashMap<String, Listing<String>>,
    pub failing_permalinks: HashSet<String>,
    pub profiles: HashMap<String, UserProfile>,
    pub failing_profiles: HashSet<String>,
    pub failing_sends: HashSet<String>,
    sent: Mutex<Vec<(String, String)>>,
    calls: Mutex<Vec<String>>,
}

impl FakeWorkspace {
    pub fn new() -> Self {
        Self {
            own_id: Some("UBOT".to_string()),
            ..Default::default()
        }
    }

    /// A joined channel with its recent history and a single page of members
    pub fn with_channel(
        mut self,
        id: &str,
        name: &str,
        history: Vec<Message>,
        members: &[&str],
    ) -> Self {
        let channel = Channel {
            id: id.to_string(),
            name: name.to_string(),
            is_member: true,
        };
        match self.channels.pages.first_mut() {
            Some(first) => first.push(channel),
            None => self.channels.pages.push(vec![channel]),
        }
        self.histories.insert(id.to_string(), history);
        self.members.insert(
            id.to_string(),
            Listing {
                pages: vec![members.iter().map(|m| m.to_string()).collect()],
                fail_at: None,
            },
        );
        self
    }

    pub fn with_profile(mut self, id: &str, is_bot: bool, deleted: bool) -> Self {
        self.profiles.insert(
            id.to_string(),
            UserProfile {
                id: id.to_string(),
                real_name: Some(format!("Name of {id}")),
                is_bot,
                deleted,
                ..Default::default()
            },
        );
        self
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

pub fn permalink_for(channel_id: &str, ts: &str) -> String {
    format!(
        "https://acme.slack.com/archives/{}/p{}",
        channel_id,
        ts.replace('.', "")
    )
}

pub fn message(ts: &str, text: &str, reactors: &[&str]) -> Message {
    let reactions = if reactors.is_empty() {
        Vec::new()
    } else {
        vec![Reaction {
            name: "eyes".to_string(),
            users: reactors.iter().map(|u| u.to_string()).collect(),
        }]
    };
    Message {
        ts: ts.to_string(),
        text: Some(text.to_string()),
        reactions,
    }
}

#[async_trait]
impl Workspace for FakeWorkspace {
    async fn own_user_id(&self) -> Result<String, PlatformError> {
        self.record("auth".to_string());
        self.own_id
            .clone()
            .ok_or_else(|| PlatformError::api("auth.test", "invalid_auth"))
    }

    async fn list_channels(&self, cursor: Option<&str>) -> Result<Page<Channel>, PlatformError> {
        self.record(format!("channels:{}", cursor.unwrap_or("-")));
        self.channels.page("conversations.list", cursor)
    }

    async fn channel_info(&self, channel_id: &str) -> Result<Channel, PlatformError> {
        self.record(format!("info:{channel_id}"));
        self.channels
            .pages
            .iter()
            .flatten()
            .find(|c| c.id == channel_id)
            .cloned()
            .ok_or_else(|| PlatformError::api("conversations.info", "channel_not_found"))
    }

    async fn list_members(
        &self,
        channel_id: &str,
        cursor: Option<&str>,
    ) -> Result<Page<String>, PlatformError> {
        self.record(format!("members:{}:{}", channel_id, cursor.unwrap_or("-")));
        match self.members.get(channel_id) {
            Some(listing) => listing.page("conversations.members", cursor),
            None => Err(PlatformError::api("conversations.members", "channel_not_found")),
        }
    }

    async fn history(&self, channel_id: &str, limit: usize) -> Result<Vec<Message>, PlatformError> {
        self.record(format!("history:{channel_id}"));
        if self.failing_histories.contains(channel_id) {
            return Err(PlatformError::api("conversations.history", "not_in_channel"));
        }
        let mut messages = self.histories.get(channel_id).cloned().unwrap_or_default();
        messages.truncate(limit);
        Ok(messages)
    }

    async fn permalink(&self, channel_id: &str, ts: &str) -> Result<String, PlatformError> {
        self.record(format!("permalink:{channel_id}:{ts}"));
        if self.failing_permalinks.contains(ts) {
            return Err(PlatformError::api("chat.getPermalink", "message_not_found"));
        }
        Ok(permalink_for(channel_id, ts))
    }

    async fn user_profile(&self, user_id: &str) -> Result<UserProfile, PlatformError> {
        self.record(format!("profile:{user_id}"));
        if self.failing_profiles.contains(user_id) {
            return Err(PlatformError::api("users.info", "user_not_found"));
        }
        Ok(self.profiles.get(user_id).cloned().unwrap_or_else(|| UserProfile {
            id: user_id.to_string(),
            ..Default::default()
        }))
    }

    async fn send_direct(&self, user_id: &str, text: &str) -> Result<(), PlatformError> {
        self.record(format!("send:{user_id}"));
        if self.failing_sends.contains(user_id) {
            return Err(PlatformError::api("chat.postMessage", "cannot_dm_bot"));
        }
        self.sent
            .lock()
            .unwrap()
            .push((user_id.to_string(), text.to_string()));
        Ok(())
    }
}
