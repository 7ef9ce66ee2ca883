// Reports module - discount aggregation and report artifacts

pub mod excel;
pub mod html;

use itertools::Itertools;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};

use crate::models::{SalesRow, UNKNOWN_SUPPLIER};

/// Discount total for one supplier
#[derive(Debug, Clone, PartialEq)]
pub struct SupplierTotal {
    pub supplier: String,
    pub discount: Decimal,
}

/// One line of the product table: a product of a supplier over the period
#[derive(Debug, Clone, PartialEq)]
pub struct ProductSummary {
    /// Display form of the supplier name, see [`display_supplier`]
    pub supplier: String,
    /// "name (code)"
    pub product: String,
    pub mean_price: Decimal,
    pub quantity: Decimal,
    pub discount: Decimal,
    /// Receipts grouped per employee and day, e.g. "12, 15 (Ona, 03-07); 40 (Jonas, 03-08)"
    pub receipts: String,
}

/// Sum discounts per supplier, largest first
pub fn supplier_totals(rows: &[SalesRow]) -> Vec<SupplierTotal> {
    let mut totals: BTreeMap<&str, Decimal> = BTreeMap::new();
    for row in rows {
        *totals.entry(row.supplier_name()).or_insert(Decimal::ZERO) += row.discount;
    }

    totals
        .into_iter()
        .map(|(supplier, discount)| SupplierTotal {
            supplier: supplier.to_string(),
            discount,
        })
        .sorted_by(|a, b| b.discount.cmp(&a.discount).then_with(|| a.supplier.cmp(&b.supplier)))
        .collect()
}

/// Group rows by (supplier, product) for the detailed table
pub fn product_summaries(rows: &[SalesRow]) -> Vec<ProductSummary> {
    // Receipt lists follow supplier order, larger sales first
    let ordered: Vec<&SalesRow> = rows
        .iter()
        .sorted_by(|a, b| {
            a.supplier_name()
                .cmp(b.supplier_name())
                .then_with(|| b.amount.cmp(&a.amount))
        })
        .collect();

    // Distinct receipt numbers per (employee and day, product)
    let mut receipts_by_shift: HashMap<(String, String), Vec<&str>> = HashMap::new();
    for row in &ordered {
        let entry = receipts_by_shift
            .entry((employee_day(row), row.product_label()))
            .or_default();
        if !entry.contains(&row.receipt_no.as_str()) {
            entry.push(row.receipt_no.as_str());
        }
    }

    struct Acc {
        price_sum: Decimal,
        count: u32,
        quantity: Decimal,
        discount: Decimal,
        receipts: Vec<String>,
    }

    let mut groups: BTreeMap<(String, String), Acc> = BTreeMap::new();
    for row in &ordered {
        let shift = employee_day(row);
        let label = row.product_label();
        let receipts = format!(
            "{} ({})",
            receipts_by_shift[&(shift.clone(), label.clone())].join(", "),
            shift
        );

        let acc = groups
            .entry((display_supplier(row.supplier_name()), label))
            .or_insert_with(|| Acc {
                price_sum: Decimal::ZERO,
                count: 0,
                quantity: Decimal::ZERO,
                discount: Decimal::ZERO,
                receipts: Vec::new(),
            });
        acc.price_sum += row.base_price;
        acc.count += 1;
        acc.quantity += row.quantity;
        acc.discount += row.discount;
        if !acc.receipts.contains(&receipts) {
            acc.receipts.push(receipts);
        }
    }

    groups
        .into_iter()
        .map(|((supplier, product), acc)| ProductSummary {
            supplier,
            product,
            mean_price: acc.price_sum / Decimal::from(acc.count),
            quantity: acc.quantity,
            discount: acc.discount,
            receipts: acc.receipts.join("; "),
        })
        .collect()
}

fn employee_day(row: &SalesRow) -> String {
    format!("{}, {}", row.employee, row.recorded_at.format("%m-%d"))
}

/// Distinct product codes no supplier could be found for
pub fn missing_codes(rows: &[SalesRow]) -> Vec<String> {
    rows.iter()
        .filter(|row| row.supplier_name() == UNKNOWN_SUPPLIER)
        .map(|row| row.product_code.clone())
        .unique()
        .collect()
}

/// Shorten a legal supplier name for display: drops "UAB "/"AB " and quotes,
/// then title-cases the rest
pub fn display_supplier(name: &str) -> String {
    let stripped = name.replace("UAB ", "").replace("AB ", "").replace('"', "");
    title_case(&stripped)
}

fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_is_letter = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if prev_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(c);
            prev_is_letter = false;
        }
    }
    out
}
