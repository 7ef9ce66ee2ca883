//! Scheduled jobs
//!
//! Both jobs are idempotent per period: the downloaded export doubles as the
//! "already done" marker, so a cron entry can fire them repeatedly.

mod daily;
mod weekly;

pub use daily::{run_daily, DailyOutcome};
pub use weekly::{run_weekly, week_interval, week_of, WeeklyOutcome};

use std::path::Path;
use tracing::{error, warn};

use crate::ledger::LedgerApi;
use crate::notify::Notifier;
use crate::pos::ExportSource;
use crate::suppliers::CatalogLookup;

/// External systems a job talks to
pub struct Collaborators<'a> {
    pub pos: &'a mut dyn ExportSource,
    pub catalog: &'a dyn CatalogLookup,
    pub ledger: &'a dyn LedgerApi,
    pub notifier: &'a dyn Notifier,
}

/// Remove an export that turned out to be unusable
fn discard_export(path: &Path, err: &anyhow::Error) {
    warn!("Could not parse export {:?}: {:#}; removing it", path, err);
    if let Err(e) = std::fs::remove_file(path) {
        error!("Failed to remove {:?}: {}", path, e);
    }
}

/// Send an email, logging instead of failing: the artifacts are already published
fn send_or_log(
    notifier: &dyn Notifier,
    subject: &str,
    to: &str,
    html: &str,
    attachments: &[std::path::PathBuf],
) -> bool {
    if to.is_empty() {
        warn!("No recipient configured for \"{}\"; not sending", subject);
        return false;
    }
    match notifier.send_html(subject, to, html, attachments) {
        Ok(()) => true,
        Err(e) => {
            error!("Failed to send \"{}\": {:#}", subject, e);
            false
        }
    }
}
