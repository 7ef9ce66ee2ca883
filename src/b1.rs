//! B1 accounting API client
//!
//! One blocking client serves both the item catalog lookups used for supplier
//! resolution and the cash receipt creation used by the ledger.

use anyhow::{anyhow, Context, Result};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::B1Settings;
use crate::ledger::{CashReceipt, LedgerApi, LedgerResponse};
use crate::suppliers::{CatalogLookup, LookupOutcome};

const API_KEY_HEADER: &str = "B1-Api-Key";
const ITEMS_LIST_PATH: &str = "reference-book/items/list";
const CASH_RECEIPT_CREATE_PATH: &str = "cash-flow/cash-receipts/create";
const CATALOG_PAGE_SIZE: u32 = 100;

#[derive(Debug, Serialize)]
struct ListRequest<'a> {
    rows: u32,
    page: u32,
    filters: ListFilters<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ListFilters<'a> {
    group_op: &'a str,
    rules: Vec<FilterRule<'a>>,
}

#[derive(Debug, Serialize)]
struct FilterRule<'a> {
    field: &'a str,
    op: &'a str,
    data: &'a str,
}

#[derive(Debug, Deserialize)]
struct ItemsListResponse {
    data: Option<Vec<CatalogItem>>,
}

#[derive(Debug, Deserialize)]
struct CatalogItem {
    #[serde(rename = "manufacturerName")]
    manufacturer_name: Option<String>,
}

pub struct B1Client {
    client: Client,
    base_url: String,
    api_key: String,
}

impl B1Client {
    pub fn new(settings: &B1Settings) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.timeout())
            .build()
            .context("Failed to build B1 HTTP client")?;

        let mut base_url = settings.base_url.clone();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        Ok(Self {
            client,
            base_url,
            api_key: settings.api_key.clone(),
        })
    }

    fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<(u16, String)> {
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(body)
            .send()
            .with_context(|| format!("Failed to send request to {}", url))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .context("Failed to read B1 response body")?;
        Ok((status, text))
    }
}

fn barcode_query(barcode: &str) -> ListRequest<'_> {
    ListRequest {
        rows: CATALOG_PAGE_SIZE,
        page: 1,
        filters: ListFilters {
            group_op: "AND",
            rules: vec![FilterRule {
                field: "barcode",
                op: "eq",
                data: barcode,
            }],
        },
    }
}

fn parse_items_response(body: &str) -> Result<LookupOutcome> {
    let parsed: ItemsListResponse =
        serde_json::from_str(body).context("Failed to parse B1 items response")?;
    let manufacturer = parsed
        .data
        .unwrap_or_default()
        .into_iter()
        .next()
        .and_then(|item| item.manufacturer_name)
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty());

    Ok(match manufacturer {
        Some(name) => LookupOutcome::Found(name),
        None => LookupOutcome::NotFound,
    })
}

impl CatalogLookup for B1Client {
    fn lookup_barcode(&self, barcode: &str) -> Result<LookupOutcome> {
        let (status, body) = self.post(ITEMS_LIST_PATH, &barcode_query(barcode))?;
        if status != 200 {
            debug!("B1 items list returned {} for {}", status, barcode);
            return Ok(LookupOutcome::NotFound);
        }
        parse_items_response(&body).map_err(|e| anyhow!("barcode {}: {:#}", barcode, e))
    }
}

impl LedgerApi for B1Client {
    fn create_cash_receipt(&self, receipt: &CashReceipt) -> Result<LedgerResponse> {
        let (status, body) = self.post(CASH_RECEIPT_CREATE_PATH, receipt)?;
        Ok(LedgerResponse { status, body })
    }
}
