//! Cash receipt posting to the accounting ledger
//!
//! Each business day the collected cash is filed as one cash receipt. The
//! ledger rejects a reused document number with HTTP 400, so a rejected
//! number is bumped and retried up to `max_attempts` in total. The persisted
//! counter only moves after an accepted receipt, which means a failed day is
//! retried with the same starting number on the next run.

pub mod doc_number;

use anyhow::Result;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{error, info, warn};

pub use doc_number::{date_seed, next_year_seed, DocumentNumberStore};

use crate::config::LedgerSettings;

pub const STATUS_ACCEPTED: u16 = 200;
pub const STATUS_NUMBER_TAKEN: u16 = 400;

/// Cash receipt document as accepted by the ledger API
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CashReceipt {
    pub client_account_id: i64,
    pub client_id: i64,
    pub currency_id: i64,
    pub currency_code: String,
    /// ISO date, `YYYY-MM-DD`
    pub date: String,
    pub debit_account_id: i64,
    pub series: String,
    /// Zero-padded to at least five digits
    pub number: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    /// Human readable memo
    pub attachment: String,
    pub document_status_id: i64,
    pub employee_id: i64,
}

impl CashReceipt {
    pub fn new(settings: &LedgerSettings, total: Decimal, date: NaiveDate, number: u64) -> Self {
        Self {
            client_account_id: settings.client_account_id,
            client_id: settings.client_id,
            currency_id: settings.currency_id,
            currency_code: settings.currency_code.clone(),
            date: date.format("%Y-%m-%d").to_string(),
            debit_account_id: settings.debit_account_id,
            series: settings.series.clone(),
            number: format_document_number(number),
            total,
            attachment: format!("{} {}", settings.memo_prefix, date.format("%Y %m %d")),
            document_status_id: settings.document_status_id,
            employee_id: settings.employee_id,
        }
    }
}

pub fn format_document_number(number: u64) -> String {
    format!("{:05}", number)
}

/// Raw answer of the ledger to a create request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerResponse {
    pub status: u16,
    pub body: String,
}

pub trait LedgerApi {
    fn create_cash_receipt(&self, receipt: &CashReceipt) -> Result<LedgerResponse>;
}

impl<T: LedgerApi + ?Sized> LedgerApi for &T {
    fn create_cash_receipt(&self, receipt: &CashReceipt) -> Result<LedgerResponse> {
        (**self).create_cash_receipt(receipt)
    }
}

/// How a submission ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// Accepted under `number` after `attempts` tries
    Accepted { attempts: u32, number: u64 },
    /// Every attempt collided with an existing document number
    Exhausted { attempts: u32 },
    /// The ledger answered with something other than 200 or 400
    Rejected { status: u16, body: String },
    /// The request never got an HTTP answer
    Transport { message: String },
}

impl SubmissionOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, SubmissionOutcome::Accepted { .. })
    }

    /// Attempts consumed by an accepted submission, 0 otherwise
    pub fn attempts_consumed(&self) -> u32 {
        match self {
            SubmissionOutcome::Accepted { attempts, .. } => *attempts,
            _ => 0,
        }
    }
}

/// Post a cash receipt, bumping the document number on each 400 answer.
///
/// Never fails: every failure mode is reported through the outcome.
pub fn submit_cash_receipt<L: LedgerApi>(
    api: &L,
    settings: &LedgerSettings,
    total: Decimal,
    date: NaiveDate,
    start_number: u64,
) -> SubmissionOutcome {
    let mut number = start_number;
    let mut try_count = 1;

    loop {
        let receipt = CashReceipt::new(settings, total, date, number);
        info!(
            "Posting cash receipt {} {} for {} (attempt {})",
            receipt.series, receipt.number, total, try_count
        );

        let response = match api.create_cash_receipt(&receipt) {
            Ok(response) => response,
            Err(e) => {
                error!("Cash receipt request failed: {:#}", e);
                return SubmissionOutcome::Transport {
                    message: format!("{:#}", e),
                };
            }
        };

        match response.status {
            STATUS_ACCEPTED => {
                info!("Cash receipt {} accepted", receipt.number);
                return SubmissionOutcome::Accepted {
                    attempts: try_count,
                    number,
                };
            }
            STATUS_NUMBER_TAKEN => {
                if try_count >= settings.max_attempts {
                    warn!(
                        "Document number still taken after {} attempts; giving up",
                        try_count
                    );
                    return SubmissionOutcome::Exhausted {
                        attempts: try_count,
                    };
                }
                let Some(next) = number.checked_add(1) else {
                    error!("Document number {} cannot be bumped further", number);
                    return SubmissionOutcome::Exhausted {
                        attempts: try_count,
                    };
                };
                warn!("Document number {} already used; retrying", receipt.number);
                number = next;
                try_count += 1;
            }
            status => {
                error!("Unexpected ledger response {}: {}", status, response.body);
                return SubmissionOutcome::Rejected {
                    status,
                    body: response.body,
                };
            }
        }
    }
}

/// What happened to one day's cash receipt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptFiling {
    pub start_number: u64,
    pub outcome: SubmissionOutcome,
    /// The persisted counter was moved past the numbers used
    pub counter_advanced: bool,
}

impl ReceiptFiling {
    pub fn is_filed(&self) -> bool {
        self.outcome.is_accepted()
    }
}

/// Read the counter, submit the day's receipt and advance the counter.
///
/// The counter becomes `start + attempts` only when the receipt was accepted
/// and the starting number was below the ceiling; otherwise the file is left
/// as it was. A counter that cannot be saved after acceptance is logged and
/// reported through `counter_advanced`, not as an error.
pub fn process_cash_receipt<L: LedgerApi>(
    api: &L,
    store: &DocumentNumberStore,
    settings: &LedgerSettings,
    total: Decimal,
    business_date: NaiveDate,
    today: NaiveDate,
) -> Result<ReceiptFiling> {
    let start = store.read_at(today)?;
    let ceiling = settings
        .counter_ceiling
        .unwrap_or_else(|| next_year_seed(today));

    let outcome = submit_cash_receipt(api, settings, total, business_date, start);
    let mut filing = ReceiptFiling {
        start_number: start,
        outcome,
        counter_advanced: false,
    };

    if !filing.is_filed() {
        warn!("Cash receipt for {} not filed: {:?}", business_date, filing.outcome);
        return Ok(filing);
    }

    if start >= ceiling {
        info!(
            "Counter {} is at or above ceiling {}; leaving it unchanged",
            start, ceiling
        );
        return Ok(filing);
    }

    let next = start.saturating_add(filing.outcome.attempts_consumed() as u64);
    // The receipt is already on the ledger, so a failed save must not hide it
    match store.save(next) {
        Ok(()) => {
            filing.counter_advanced = true;
            info!("Document counter advanced {} -> {}", start, next);
        }
        Err(e) => error!(
            "Cash receipt filed but counter {:?} not saved as {}: {:#}",
            store.path(),
            next,
            e
        ),
    }
    Ok(filing)
}
