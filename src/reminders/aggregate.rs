use std::collections::HashSet;

use tracing::{debug, info, warn};

use super::digest::PendingDigests;
use super::filter::{reacted_users, tagged};
use super::format::PendingItem;
use super::paginate::collect_pages;
use crate::platform::{Channel, PlatformError, Workspace, SYSTEM_USER_ID};

/// Which channels a run looks at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelScope {
    /// Every channel the bot has joined
    Joined,
    /// A fixed list of channel ids
    Explicit(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub marker: String,
    pub history_limit: usize,
    pub preview_length: usize,
}

#[derive(Debug, Default)]
pub struct ScanReport {
    pub digests: PendingDigests,
    pub channels_scanned: usize,
    pub channels_failed: usize,
    pub tagged_messages: usize,
}

/// Build every member's pending list.
///
/// Channels are visited in scope order and messages in the order history
/// returns them, so each member's list is reproducible for identical data.
/// Failures are confined to the channel or message they hit.
pub async fn collect_pending<W>(
    workspace: &W,
    scope: &ChannelScope,
    options: &ScanOptions,
    own_user_id: Option<&str>,
) -> ScanReport
where
    W: Workspace + ?Sized,
{
    let mut excluded: HashSet<&str> = HashSet::from([SYSTEM_USER_ID]);
    if let Some(own) = own_user_id {
        excluded.insert(own);
    }

    let channels = resolve_channels(workspace, scope).await;
    info!("Scanning {} channel(s) for '{}'", channels.len(), options.marker);

    let mut report = ScanReport::default();
    for channel in &channels {
        info!("Checking #{}", channel.name);
        match scan_channel(workspace, channel, options, &excluded, &mut report.digests).await {
            Ok(found) => {
                report.channels_scanned += 1;
                report.tagged_messages += found;
                if found > 0 {
                    info!("Found {} tagged message(s) in #{}", found, channel.name);
                }
            }
            Err(e) => {
                report.channels_failed += 1;
                warn!("Skipping #{} ({}): {}", channel.name, channel.id, e);
            }
        }
    }

    report
}

async fn resolve_channels<W>(workspace: &W, scope: &ChannelScope) -> Vec<Channel>
where
    W: Workspace + ?Sized,
{
    match scope {
        ChannelScope::Joined => {
            let listed = collect_pages(move |cursor: Option<String>| async move {
                workspace.list_channels(cursor.as_deref()).await
            })
            .await
            .unwrap_or_else(|partial| partial.salvage("channels"));

            // Non-member channels cannot be read by the bot
            listed.into_iter().filter(|c| c.is_member).collect()
        }
        ChannelScope::Explicit(ids) => {
            let mut channels = Vec::with_capacity(ids.len());
            for id in ids {
                let channel = match workspace.channel_info(id).await {
                    Ok(channel) => channel,
                    Err(e) => {
                        warn!("Could not look up channel {}: {}", id, e);
                        Channel {
                            id: id.clone(),
                            name: id.clone(),
                            is_member: true,
                        }
                    }
                };
                channels.push(channel);
            }
            channels
        }
    }
}

/// Scan one channel; returns how many tagged messages it held.
async fn scan_channel<W>(
    workspace: &W,
    channel: &Channel,
    options: &ScanOptions,
    excluded: &HashSet<&str>,
    digests: &mut PendingDigests,
) -> Result<usize, PlatformError>
where
    W: Workspace + ?Sized,
{
    let history = workspace.history(&channel.id, options.history_limit).await?;
    let matches = tagged(&history, &options.marker);
    if matches.is_empty() {
        return Ok(0);
    }

    let members = channel_members(workspace, &channel.id).await;

    for message in &matches {
        let permalink = match workspace.permalink(&channel.id, &message.ts).await {
            Ok(link) => Some(link),
            Err(e) => {
                warn!(
                    "No permalink for {} in #{}: {}",
                    message.ts,
                    channel.name,
                    e.code()
                );
                None
            }
        };
        let reacted = reacted_users(message);
        let item = PendingItem::new(
            &channel.name,
            message.text.as_deref(),
            permalink,
            options.preview_length,
        );

        for member_id in &members {
            let member_id = member_id.as_str();
            if excluded.contains(member_id) || reacted.contains(member_id) {
                continue;
            }
            digests.push(member_id, item.clone());
        }
        debug!(
            "Message {} in #{}: {} of {} member(s) reacted",
            message.ts,
            channel.name,
            reacted.len(),
            members.len()
        );
    }

    Ok(matches.len())
}

/// Current members of a channel in listing order, without duplicates.
/// A listing that breaks part-way still yields the members seen so far.
async fn channel_members<W>(workspace: &W, channel_id: &str) -> Vec<String>
where
    W: Workspace + ?Sized,
{
    let listed = collect_pages(move |cursor: Option<String>| async move {
        workspace.list_members(channel_id, cursor.as_deref()).await
    })
    .await
    .unwrap_or_else(|partial| partial.salvage(&format!("members of {}", channel_id)));

    let mut seen = HashSet::new();
    listed
        .into_iter()
        .filter(|member| seen.insert(member.clone()))
        .collect()
}
