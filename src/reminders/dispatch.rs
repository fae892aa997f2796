use std::time::Duration;

use tracing::{debug, info, warn};

use super::digest::{compose, PendingDigests};
use crate::platform::Workspace;

#[derive(Debug, Clone)]
pub struct DispatchOptions {
    /// Greeting placed above the item list
    pub base_message: String,
    /// Pause after every attempted send
    pub send_delay: Duration,
    /// Log digests instead of sending them
    pub dry_run: bool,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    /// Digests delivered, or only composed and logged when `dry_run` is set
    pub sent: usize,
    /// Bots or deleted accounts caught by the profile check
    pub skipped: usize,
    pub failed: usize,
    pub dry_run: bool,
}

/// Send every member their digest, one at a time.
///
/// Each recipient's profile is re-checked first because channel member
/// listings carry no bot/deleted flags. A failure for one member is logged
/// and the loop moves on.
pub async fn deliver_digests<W>(
    workspace: &W,
    digests: &PendingDigests,
    options: &DispatchOptions,
) -> DispatchReport
where
    W: Workspace + ?Sized,
{
    let mut report = DispatchReport {
        dry_run: options.dry_run,
        ..DispatchReport::default()
    };
    if digests.is_empty() {
        info!("No pending reminders to send");
        return report;
    }

    for (member_id, items) in digests.iter() {
        if items.is_empty() {
            continue;
        }

        let profile = match workspace.user_profile(member_id).await {
            Ok(profile) => profile,
            Err(e) => {
                warn!(
                    "Could not look up user {} ({}), not sending",
                    member_id,
                    e.code()
                );
                report.failed += 1;
                continue;
            }
        };
        if !profile.is_deliverable() {
            debug!("Skipping {}: bot or deactivated account", member_id);
            report.skipped += 1;
            continue;
        }

        let text = compose(&options.base_message, items);

        if options.dry_run {
            info!(
                "[dry run] Would send {} item(s) to {} ({}):\n{}",
                items.len(),
                profile.display_name(),
                member_id,
                text
            );
            report.sent += 1;
            continue;
        }

        info!(
            "Sending {} item(s) to {}",
            items.len(),
            profile.display_name()
        );
        match workspace.send_direct(member_id, &text).await {
            Ok(()) => report.sent += 1,
            Err(e) => {
                warn!("Could not send reminder to {}: {}", member_id, e.code());
                report.failed += 1;
            }
        }

        // Rate limit courtesy, applied whether or not the send succeeded
        if !options.send_delay.is_zero() {
            tokio::time::sleep(options.send_delay).await;
        }
    }

    report
}
