#![allow(dead_code)]

//! In-process stand-ins for the POS portal, the B1 API and the mailer

use anyhow::{anyhow, Result};
use encoding_rs::WINDOWS_1257;
use posledger::config::Settings;
use posledger::error::ReportError;
use posledger::ledger::{CashReceipt, LedgerApi, LedgerResponse};
use posledger::notify::Notifier;
use posledger::pos::{ExportSource, Grid};
use posledger::suppliers::{CatalogLookup, LookupOutcome};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};

pub const TRANSACTIONS_EXPORT: &str = "\
Įmonė;Parduotuvė;Kasa;Adresas;Miestas;Šalis;Ar aktyvus?;Ar čekis atmestas?;Nuol. suma 1;Darb. vardas;Čekio nr.;Prekės kodas;Prekės pavadinimas;Kiekis;Pagr. kaina;Pagr. suma;Suma;Mok. suma;Įrašo data
UAB Demo;Demo;1;Gatvė 1;Vilnius;LT;1;0;1,50;Ona;101;04770001000012;Pienas 2,5%;1;3,00;3,00;1,50;1,50;2025-03-03 10:15:00
UAB Demo;Demo;1;Gatvė 1;Vilnius;LT;1;0;0,80;Ona;102;4770001000029;Duona juoda;2;1,20;2,40;1,60;1,60;2025-03-04 11:00:00
UAB Demo;Demo;1;Gatvė 1;Vilnius;LT;1;0;0,00;Ona;103;4770001000036;Sviestas;1;2,50;2,50;2,50;2,50;2025-03-04 11:05:00
UAB Demo;Demo;1;Gatvė 1;Vilnius;LT;0;0;2,00;Jonas;104;4770001000043;Sūris;1;4,00;4,00;2,00;2,00;2025-03-05 09:00:00
UAB Demo;Demo;1;Gatvė 1;Vilnius;LT;1;1;2,00;Jonas;105;4770001000050;Kefyras;1;1,80;1,80;0,80;0,80;2025-03-05 09:10:00
UAB Demo;Demo;1;Gatvė 1;Vilnius;LT;1;0;0,50;Jonas;106;SVER-01;Obuoliai sveriami;1,25;1\u{a0}200,00;1\u{a0}500,00;1\u{a0}499,50;1\u{a0}499,50;2025-03-06 16:30:00
UAB Demo;Demo;1;Gatvė 1;Vilnius;LT;1;0;0,40;Jonas;107;2000123;Kiaušiniai;1;2,40;2,40;2,00;2,00;2025-03-07 12:00:00
";

pub const ZREPORT_EXPORT: &str = "\
Įmonė;Parduotuvė;Kasa;Adresas;Miestas;Šalis;Data;Darb. vardas;GT;Fiskalo nr.;Grynais;Kortele;Išimta gryn. 1;Išimta gryn. 2
UAB Demo;Demo;1;Gatvė 1;Vilnius;LT;2025-03-07 20:05:00;Ona;123\u{a0}456,00;AB123;820,75;310,20;800,00;220,75
";

pub const HEADER_ONLY_EXPORT: &str = "Įmonė;Parduotuvė;Kasa;Adresas;Miestas;Šalis;Data\n";

/// Encode text the way the portal serves its CSV files
pub fn encode_export(text: &str) -> Vec<u8> {
    let (bytes, _, had_errors) = WINDOWS_1257.encode(text);
    assert!(!had_errors, "fixture contains characters outside Windows-1257");
    bytes.into_owned()
}

/// Settings rooted in `data_folder` with test recipients and one prefix rule
pub fn test_settings(data_folder: &Path) -> Settings {
    let toml = format!(
        r#"
data_folder = '{}'
shop_name = "Demo parduotuvė"

[email]
from = "shop@example.test"
reporting_to = "boss@example.test"
daily_to = "cashier@example.test"

[daily]
earliest_hour = 15

[[prefix_rules]]
prefix = "200"
supplier = "Vietinis ūkis"
"#,
        data_folder.display()
    );
    Settings::from_toml(&toml).expect("test settings should parse")
}

/// POS portal that "downloads" a fixed payload
pub struct FixturePos {
    payload: Vec<u8>,
    pub requests: Vec<(Grid, String, String)>,
}

impl FixturePos {
    pub fn new(text: &str) -> Self {
        Self {
            payload: encode_export(text),
            requests: Vec::new(),
        }
    }
}

impl ExportSource for FixturePos {
    fn download_export(&mut self, grid: Grid, from: &str, to: &str, dest: &Path) -> Result<()> {
        self.requests.push((grid, from.to_string(), to.to_string()));
        fs::write(dest, &self.payload)?;
        Ok(())
    }
}

/// POS portal whose login always fails
pub struct BrokenPos;

impl ExportSource for BrokenPos {
    fn download_export(&mut self, _grid: Grid, _from: &str, _to: &str, _dest: &Path) -> Result<()> {
        Err(ReportError::PosSession("Invalid login".into()).into())
    }
}

/// Catalog answering from a fixed table and recording every lookup
#[derive(Default)]
pub struct ScriptedCatalog {
    answers: HashMap<String, String>,
    failing: Vec<String>,
    pub calls: RefCell<Vec<String>>,
}

impl ScriptedCatalog {
    pub fn with(mut self, barcode: &str, manufacturer: &str) -> Self {
        self.answers
            .insert(barcode.to_string(), manufacturer.to_string());
        self
    }

    pub fn failing_for(mut self, barcode: &str) -> Self {
        self.failing.push(barcode.to_string());
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl CatalogLookup for ScriptedCatalog {
    fn lookup_barcode(&self, barcode: &str) -> Result<LookupOutcome> {
        self.calls.borrow_mut().push(barcode.to_string());
        if self.failing.iter().any(|b| b == barcode) {
            return Err(anyhow!("connection reset"));
        }
        Ok(match self.answers.get(barcode) {
            Some(name) => LookupOutcome::Found(name.clone()),
            None => LookupOutcome::NotFound,
        })
    }
}

/// Catalog that must never be reached
pub struct UnreachableCatalog;

impl CatalogLookup for UnreachableCatalog {
    fn lookup_barcode(&self, barcode: &str) -> Result<LookupOutcome> {
        panic!("unexpected catalog lookup for {}", barcode);
    }
}

/// Ledger answering with a scripted sequence of statuses
pub struct ScriptedLedger {
    statuses: RefCell<VecDeque<u16>>,
    fallback: u16,
    pub receipts: RefCell<Vec<CashReceipt>>,
}

impl ScriptedLedger {
    pub fn new(statuses: &[u16]) -> Self {
        Self::with_fallback(statuses, 200)
    }

    /// Once the script runs out every answer is `fallback`
    pub fn with_fallback(statuses: &[u16], fallback: u16) -> Self {
        Self {
            statuses: RefCell::new(statuses.iter().copied().collect()),
            fallback,
            receipts: RefCell::new(Vec::new()),
        }
    }

    pub fn numbers(&self) -> Vec<String> {
        self.receipts
            .borrow()
            .iter()
            .map(|r| r.number.clone())
            .collect()
    }
}

impl LedgerApi for ScriptedLedger {
    fn create_cash_receipt(&self, receipt: &CashReceipt) -> Result<LedgerResponse> {
        self.receipts.borrow_mut().push(receipt.clone());
        let status = self
            .statuses
            .borrow_mut()
            .pop_front()
            .unwrap_or(self.fallback);
        Ok(LedgerResponse {
            status,
            body: format!("{{\"code\":{}}}", status),
        })
    }
}

/// Ledger that never answers
pub struct UnreachableLedger;

impl LedgerApi for UnreachableLedger {
    fn create_cash_receipt(&self, _receipt: &CashReceipt) -> Result<LedgerResponse> {
        Err(anyhow!("operation timed out"))
    }
}

#[derive(Debug, Clone)]
pub struct SentMail {
    pub subject: String,
    pub to: String,
    pub html: String,
    pub attachments: Vec<PathBuf>,
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub fail: bool,
    pub sent: RefCell<Vec<SentMail>>,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

impl Notifier for RecordingNotifier {
    fn send_html(&self, subject: &str, to: &str, html: &str, attachments: &[PathBuf]) -> Result<()> {
        if self.fail {
            return Err(anyhow!("SMTP connection refused"));
        }
        self.sent.borrow_mut().push(SentMail {
            subject: subject.to_string(),
            to: to.to_string(),
            html: html.to_string(),
            attachments: attachments.to_vec(),
        });
        Ok(())
    }
}
