use anyhow::Result;
use chrono::{Duration, NaiveDateTime, Timelike};
use tracing::{info, warn};

use super::{discard_export, send_or_log, Collaborators};
use crate::config::Settings;
use crate::error::is_malformed_input;
use crate::importers::{read_export, ZReport};
use crate::ledger::{process_cash_receipt, DocumentNumberStore};
use crate::pos::Grid;
use crate::reports::html;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DailyOutcome {
    /// Export already downloaded today
    AlreadyDone,
    /// Before the configured earliest hour
    TooEarly,
    /// The export was unusable and has been removed
    Discarded,
    Completed {
        /// The ledger accepted the cash receipt
        receipt_filed: bool,
        emailed: bool,
    },
}

/// Download today's Z report, file the collected cash and mail the receipt
pub fn run_daily(
    settings: &Settings,
    collab: &mut Collaborators<'_>,
    now: NaiveDateTime,
) -> Result<DailyOutcome> {
    let today = now.date();
    let file_path = settings
        .data_folder
        .join(format!("z_{}.csv", today.format("%Y-%m-%d")));

    if file_path.exists() {
        info!("{:?} already exists; nothing to do", file_path);
        return Ok(DailyOutcome::AlreadyDone);
    }
    if now.hour() < settings.daily.earliest_hour {
        info!(
            "Too early for the daily report ({}:00 < {}:00)",
            now.hour(),
            settings.daily.earliest_hour
        );
        return Ok(DailyOutcome::TooEarly);
    }

    let from = format!("{} 00:00", today.format("%Y-%m-%d"));
    let to = format!("{} 00:00", (today + Duration::days(1)).format("%Y-%m-%d"));
    collab
        .pos
        .download_export(Grid::ZReports, &from, &to, &file_path)?;

    let table = match read_export(&file_path) {
        Ok(table) => table,
        Err(e) if is_malformed_input(&e) => {
            discard_export(&file_path, &e);
            return Ok(DailyOutcome::Discarded);
        }
        Err(e) => return Err(e),
    };
    let report = ZReport::from_table(table)?;

    let receipt_filed = file_cash_receipt(settings, collab, &report, today);

    if let (Some(skip), Some(employee)) = (&settings.daily.skip_employee, report.closing_employee()) {
        if skip == employee {
            info!("{} closed the day; no receipt email", employee);
            return Ok(DailyOutcome::Completed {
                receipt_filed,
                emailed: false,
            });
        }
    }

    let body = html::daily_receipt(&report.receipt_text());
    let subject = format!("Z ataskaita {}", today.format("%Y-%m-%d"));
    let emailed = send_or_log(collab.notifier, &subject, &settings.email.daily_to, &body, &[]);

    Ok(DailyOutcome::Completed {
        receipt_filed,
        emailed,
    })
}

/// Post the day's collected cash; failures are logged, never raised
fn file_cash_receipt(
    settings: &Settings,
    collab: &Collaborators<'_>,
    report: &ZReport,
    today: chrono::NaiveDate,
) -> bool {
    let cash = match report.collected_cash() {
        Ok(Some(cash)) => cash,
        Ok(None) => {
            info!("No cash data found in Z report");
            return false;
        }
        Err(e) => {
            warn!("Could not read collected cash: {:#}", e);
            return false;
        }
    };
    let business_date = match report.business_date() {
        Ok(date) => date,
        Err(e) => {
            warn!("Could not read Z report date: {:#}", e);
            return false;
        }
    };

    let store = DocumentNumberStore::new(settings.counter_path());
    match process_cash_receipt(
        &collab.ledger,
        &store,
        &settings.ledger,
        cash,
        business_date,
        today,
    ) {
        Ok(filing) => filing.is_filed(),
        Err(e) => {
            warn!("Cash receipt processing failed: {:#}", e);
            false
        }
    }
}
