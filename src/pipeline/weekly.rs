use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use super::{discard_export, send_or_log, Collaborators};
use crate::config::Settings;
use crate::error::is_malformed_input;
use crate::importers::{discounted_sales, read_export};
use crate::pos::Grid;
use crate::reports::html::{self, WeeklyReportInfo};
use crate::reports::{excel, missing_codes, product_summaries, supplier_totals};
use crate::suppliers::{PrefixRules, SupplierResolver};
use crate::utils::publish;

const LAST_REPORT: &str = "last_report.html";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WeeklyOutcome {
    /// Export for this week already downloaded
    AlreadyDone,
    /// The export was unusable and has been removed
    Discarded,
    Completed {
        /// Discounted sale lines in the report
        rows: usize,
        /// Distinct product codes left without a supplier
        unknown: usize,
        total_discount: Decimal,
        report_path: PathBuf,
        workbook_path: PathBuf,
        emailed: bool,
    },
}

/// Monday-based seven day window for `week` of `year`, both ends inclusive.
///
/// Week 1 is the week containing January 1st, so its Monday may fall in the
/// previous year. This is not ISO numbering: when January 1st is a Friday,
/// Saturday or Sunday the ISO week number is one lower. Use [`week_of`] to
/// go from a date to a week in this numbering.
pub fn week_interval(year: i32, week: u32) -> Option<(NaiveDate, NaiveDate)> {
    let jan_first = NaiveDate::from_ymd_opt(year, 1, 1)?;
    let offset = (i64::from(week) - 1) * 7 - i64::from(jan_first.weekday().num_days_from_monday());
    let start = jan_first.checked_add_signed(Duration::days(offset))?;
    let end = start.checked_add_signed(Duration::days(6))?;
    Some((start, end))
}

/// `(year, week)` whose [`week_interval`] contains `date`
pub fn week_of(date: NaiveDate) -> (i32, u32) {
    let jan_first = date.with_ordinal(1).unwrap_or(date);
    let shifted = date.ordinal0() + jan_first.weekday().num_days_from_monday();
    (date.year(), shifted / 7 + 1)
}

fn modified_at(path: &Path) -> Option<NaiveDateTime> {
    let modified = fs::metadata(path).and_then(|m| m.modified()).ok()?;
    Some(DateTime::<Local>::from(modified).naive_local())
}

/// Download the week's transactions and publish the supplier discount report
pub fn run_weekly(
    settings: &Settings,
    collab: &mut Collaborators<'_>,
    year: i32,
    week: u32,
) -> Result<WeeklyOutcome> {
    let (start, end) = week_interval(year, week)
        .with_context(|| format!("Invalid report week {} of {}", week, year))?;
    let folder = &settings.data_folder;
    let file_path = folder.join(format!("sales_{}_{}.csv", year, week));

    if file_path.exists() {
        info!("{:?} already exists; nothing to do", file_path);
        return Ok(WeeklyOutcome::AlreadyDone);
    }

    let last_report = folder.join(LAST_REPORT);
    if last_report.exists() {
        fs::remove_file(&last_report)
            .with_context(|| format!("Failed to remove {:?}", last_report))?;
    }

    info!("Weekly report {} week {}: {} .. {}", year, week, start, end);
    let from = format!("{} 00:00", start.format("%Y-%m-%d"));
    let to = format!("{} 00:00", (end + Duration::days(1)).format("%Y-%m-%d"));
    collab
        .pos
        .download_export(Grid::Transactions, &from, &to, &file_path)?;

    match build_report(settings, collab, &file_path, year, week, (start, end)) {
        Ok(outcome) => Ok(outcome),
        Err(e) => {
            // Without the export on disk the next run retries the whole week
            warn!("Weekly report failed; removing {:?}", file_path);
            if let Err(rm) = fs::remove_file(&file_path) {
                error!("Failed to remove {:?}: {}", file_path, rm);
            }
            Err(e)
        }
    }
}

/// Everything after the download. Artifacts are rendered in memory first and
/// only published once all of them exist.
fn build_report(
    settings: &Settings,
    collab: &Collaborators<'_>,
    file_path: &Path,
    year: i32,
    week: u32,
    (start, end): (NaiveDate, NaiveDate),
) -> Result<WeeklyOutcome> {
    let folder = &settings.data_folder;

    let table = match read_export(file_path) {
        Ok(table) => table,
        Err(e) if is_malformed_input(&e) => {
            discard_export(file_path, &e);
            return Ok(WeeklyOutcome::Discarded);
        }
        Err(e) => return Err(e),
    };
    let mut rows = match discounted_sales(&table) {
        Ok(rows) => rows,
        Err(e) if is_malformed_input(&e) => {
            discard_export(file_path, &e);
            return Ok(WeeklyOutcome::Discarded);
        }
        Err(e) => return Err(e),
    };
    info!("{} discounted sale lines", rows.len());

    let mut resolver = SupplierResolver::open(
        settings.mapping_path(),
        PrefixRules::from_settings(&settings.prefix_rules),
        collab.catalog,
    )?;
    resolver.resolve_rows(&mut rows);

    let totals = supplier_totals(&rows);
    let products = product_summaries(&rows);
    let missing = missing_codes(&rows);
    if !missing.is_empty() {
        warn!("No supplier for {} product codes", missing.len());
    }

    let workbook_name = format!("Nukainavimai_{}_{}_savaite.xlsx", year, week);
    let workbook_path = folder.join(&workbook_name);
    let workbook = excel::build_workbook(&rows, &totals)?;

    let info = WeeklyReportInfo {
        shop_name: &settings.shop_name,
        year,
        week,
        start_date: start,
        end_date: end,
        generated_at: modified_at(file_path).unwrap_or_else(|| Local::now().naive_local()),
    };
    let page = html::weekly_report(&info, &products, &totals, &missing);
    let report_path = folder.join(format!("report_{}_{}.html", year, week));

    publish(&workbook_path, &workbook)?;
    publish(&report_path, page.as_bytes())?;
    publish(&folder.join(LAST_REPORT), page.as_bytes())?;
    info!("Report written to {:?}, workbook to {:?}", report_path, workbook_path);

    let subject = format!("Nukainavimų ataskaita, {} savaitė", week);
    let body = html::weekly_email(&workbook_name, &totals);
    let emailed = send_or_log(
        collab.notifier,
        &subject,
        &settings.email.reporting_to,
        &body,
        std::slice::from_ref(&workbook_path),
    );

    Ok(WeeklyOutcome::Completed {
        rows: rows.len(),
        unknown: missing.len(),
        total_discount: totals.iter().map(|t| t.discount).sum(),
        report_path,
        workbook_path,
        emailed,
    })
}
