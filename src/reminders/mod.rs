pub mod aggregate;
pub mod digest;
pub mod dispatch;
pub mod filter;
pub mod format;
pub mod paginate;

#[cfg(test)]
pub(crate) mod testing;

use tracing::{info, warn};

use crate::config::Config;
use crate::platform::Workspace;
use aggregate::{collect_pending, ChannelScope, ScanOptions};
use dispatch::{deliver_digests, DispatchOptions};

/// Everything one sweep needs, resolved from [`Config`] once at startup
#[derive(Debug, Clone)]
pub struct ReminderSettings {
    pub scope: ChannelScope,
    pub scan: ScanOptions,
    pub dispatch: DispatchOptions,
}

impl ReminderSettings {
    pub fn from_config(config: &Config, dry_run: bool) -> Self {
        Self {
            scope: config.scope(),
            scan: ScanOptions {
                marker: config.reminder.marker.clone(),
                history_limit: config.reminder.history_limit,
                preview_length: config.reminder.preview_length,
            },
            dispatch: DispatchOptions {
                base_message: config.reminder.message.clone(),
                send_delay: config.send_delay(),
                dry_run,
            },
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub channels_scanned: usize,
    pub channels_failed: usize,
    pub tagged_messages: usize,
    pub recipients: usize,
    pub sent: usize,
    pub skipped: usize,
    pub failed: usize,
    pub dry_run: bool,
}

/// One full sweep: scan the channels in scope, then deliver every digest.
pub async fn run_once<W>(workspace: &W, settings: &ReminderSettings) -> RunSummary
where
    W: Workspace + ?Sized,
{
    info!("--- Starting reminder sweep ---");

    // Without our own id we still exclude ourselves later via the bot flag
    let own_user_id = match workspace.own_user_id().await {
        Ok(id) => Some(id),
        Err(e) => {
            warn!("Could not resolve bot user id: {}", e);
            None
        }
    };

    let scan = collect_pending(
        workspace,
        &settings.scope,
        &settings.scan,
        own_user_id.as_deref(),
    )
    .await;

    info!(
        "--- Sending reminders: {} item(s) for {} member(s) ---",
        scan.digests.total_items(),
        scan.digests.len()
    );
    let delivery = deliver_digests(workspace, &scan.digests, &settings.dispatch).await;

    let summary = RunSummary {
        channels_scanned: scan.channels_scanned,
        channels_failed: scan.channels_failed,
        tagged_messages: scan.tagged_messages,
        recipients: scan.digests.len(),
        sent: delivery.sent,
        skipped: delivery.skipped,
        failed: delivery.failed,
        dry_run: delivery.dry_run,
    };

    info!(
        "Scanned {} channel(s) ({} failed), {} tagged message(s), {} recipient(s)",
        summary.channels_scanned,
        summary.channels_failed,
        summary.tagged_messages,
        summary.recipients
    );
    if summary.dry_run {
        info!(
            "--- Done (dry run). Composed {} reminder(s), none sent ({} skipped, {} failed) ---",
            summary.sent, summary.skipped, summary.failed
        );
    } else {
        info!(
            "--- Done. Sent {} reminder(s) ({} skipped, {} failed) ---",
            summary.sent, summary.skipped, summary.failed
        );
    }
    summary
}
