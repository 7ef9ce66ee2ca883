use anyhow::{anyhow, Context, Result};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use tracing::{info, warn};

use super::pos_csv::ExportTable;
use crate::models::{normalize_product_code, SalesRow};

// Transactions grid column names as exported by the portal
pub const COL_ACTIVE: &str = "Ar aktyvus?";
pub const COL_REJECTED: &str = "Ar čekis atmestas?";
pub const COL_DISCOUNT: &str = "Nuol. suma 1";
pub const COL_EMPLOYEE: &str = "Darb. vardas";
pub const COL_RECEIPT: &str = "Čekio nr.";
pub const COL_PRODUCT_CODE: &str = "Prekės kodas";
pub const COL_PRODUCT_NAME: &str = "Prekės pavadinimas";
pub const COL_QUANTITY: &str = "Kiekis";
pub const COL_BASE_PRICE: &str = "Pagr. kaina";
pub const COL_BASE_AMOUNT: &str = "Pagr. suma";
pub const COL_AMOUNT: &str = "Suma";
pub const COL_PAID_AMOUNT: &str = "Mok. suma";
pub const COL_RECORDED_AT: &str = "Įrašo data";

#[derive(Debug)]
struct SalesColumns {
    active: usize,
    rejected: usize,
    discount: usize,
    employee: usize,
    receipt: usize,
    product_code: usize,
    product_name: usize,
    quantity: usize,
    base_price: usize,
    base_amount: usize,
    amount: usize,
    paid_amount: usize,
    recorded_at: usize,
}

fn find_columns(table: &ExportTable) -> Result<SalesColumns> {
    Ok(SalesColumns {
        active: table.require_column(COL_ACTIVE)?,
        rejected: table.require_column(COL_REJECTED)?,
        discount: table.require_column(COL_DISCOUNT)?,
        employee: table.require_column(COL_EMPLOYEE)?,
        receipt: table.require_column(COL_RECEIPT)?,
        product_code: table.require_column(COL_PRODUCT_CODE)?,
        product_name: table.require_column(COL_PRODUCT_NAME)?,
        quantity: table.require_column(COL_QUANTITY)?,
        base_price: table.require_column(COL_BASE_PRICE)?,
        base_amount: table.require_column(COL_BASE_AMOUNT)?,
        amount: table.require_column(COL_AMOUNT)?,
        paid_amount: table.require_column(COL_PAID_AMOUNT)?,
        recorded_at: table.require_column(COL_RECORDED_AT)?,
    })
}

/// Extract active, non-rejected lines that carry a discount.
///
/// Rows that fail to parse are logged and skipped; a missing column is an error.
pub fn discounted_sales(table: &ExportTable) -> Result<Vec<SalesRow>> {
    let cols = find_columns(table)?;
    let mut sales = Vec::new();

    for row in 0..table.len() {
        match parse_row(table, &cols, row) {
            Ok(Some(sale)) => sales.push(sale),
            Ok(None) => continue,
            Err(e) => {
                warn!("Skipping export row {}: {:#}", row + 2, e);
                continue;
            }
        }
    }

    info!(
        "Selected {} discounted sales out of {} rows",
        sales.len(),
        table.len()
    );
    Ok(sales)
}

fn parse_row(table: &ExportTable, cols: &SalesColumns, row: usize) -> Result<Option<SalesRow>> {
    let active = table.decimal(row, cols.active)?;
    let rejected = table.decimal(row, cols.rejected)?;
    let discount = table.decimal(row, cols.discount)?;

    if active != Decimal::ONE || rejected != Decimal::ZERO || discount <= Decimal::ZERO {
        return Ok(None);
    }

    let product_code = normalize_product_code(table.cell(row, cols.product_code));
    if product_code.is_empty() {
        return Err(anyhow!("empty product code"));
    }

    let recorded_at = parse_timestamp(table.cell(row, cols.recorded_at))?;

    Ok(Some(SalesRow {
        employee: table.cell(row, cols.employee).to_string(),
        receipt_no: table.cell(row, cols.receipt).to_string(),
        product_code,
        product_name: table.cell(row, cols.product_name).to_string(),
        quantity: table.decimal(row, cols.quantity)?,
        base_price: table.decimal(row, cols.base_price)?,
        base_amount: table.decimal(row, cols.base_amount)?,
        amount: table.decimal(row, cols.amount)?,
        paid_amount: table.decimal(row, cols.paid_amount)?,
        discount,
        recorded_at,
        supplier: None,
    }))
}

/// Parse the portal's record timestamp; a few layouts have been seen in the wild
pub fn parse_timestamp(text: &str) -> Result<NaiveDateTime> {
    const FORMATS: [&str; 6] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y.%m.%d %H:%M:%S",
        "%Y.%m.%d %H:%M",
        "%d.%m.%Y %H:%M:%S",
        "%d/%m/%Y %H:%M:%S",
    ];
    let text = text.trim();
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            chrono::NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .with_context(|| format!("Could not parse timestamp: {}", text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    const HEADERS: [&str; 13] = [
        COL_ACTIVE,
        COL_REJECTED,
        COL_DISCOUNT,
        COL_EMPLOYEE,
        COL_RECEIPT,
        COL_PRODUCT_CODE,
        COL_PRODUCT_NAME,
        COL_QUANTITY,
        COL_BASE_PRICE,
        COL_BASE_AMOUNT,
        COL_AMOUNT,
        COL_PAID_AMOUNT,
        COL_RECORDED_AT,
    ];

    fn table(rows: &[[&str; 13]]) -> ExportTable {
        ExportTable::new(
            HEADERS.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn test_only_active_unrejected_discounted_rows_selected() {
        let t = table(&[
            ["1", "0", "0,50", "Ona", "101", "0004770001", "Pienas", "2", "1,20", "2,40", "1,90", "1,90", "2025-03-07 10:15:00"],
            ["0", "0", "0,50", "Ona", "102", "4770002", "Sūris", "1", "3", "3", "2,5", "2,5", "2025-03-07 10:16:00"],
            ["1", "1", "0,50", "Ona", "103", "4770003", "Duona", "1", "1", "1", "0,5", "0,5", "2025-03-07 10:17:00"],
            ["1", "0", "0", "Ona", "104", "4770004", "Vanduo", "1", "1", "1", "1", "1", "2025-03-07 10:18:00"],
        ]);
        let sales = discounted_sales(&t).unwrap();
        assert_eq!(sales.len(), 1);
        let sale = &sales[0];
        assert_eq!(sale.product_code, "4770001");
        assert_eq!(sale.receipt_no, "101");
        assert_eq!(sale.quantity, dec!(2));
        assert_eq!(sale.base_price, dec!(1.20));
        assert_eq!(sale.discount, dec!(0.50));
        assert_eq!(sale.supplier, None);
        assert_eq!(
            sale.recorded_at,
            NaiveDate::from_ymd_opt(2025, 3, 7).unwrap().and_hms_opt(10, 15, 0).unwrap()
        );
    }

    #[test]
    fn test_unparseable_row_is_skipped() {
        let t = table(&[
            ["1", "0", "0,50", "Ona", "101", "4770001", "Pienas", "2", "1,20", "2,40", "1,90", "1,90", "not a date"],
            ["1", "0", "1,00", "Jonas", "102", "4770002", "Sūris", "1", "3", "3", "2", "2", "2025-03-07 11:00"],
        ]);
        let sales = discounted_sales(&t).unwrap();
        assert_eq!(sales.len(), 1);
        assert_eq!(sales[0].employee, "Jonas");
    }

    #[test]
    fn test_missing_column_is_an_error() {
        let t = ExportTable::new(vec!["Kiekis".into()], vec![vec!["1".into()]]);
        assert!(discounted_sales(&t).is_err());
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap().and_hms_opt(9, 5, 0).unwrap();
        assert_eq!(parse_timestamp("2025-03-07 09:05:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2025-03-07 09:05").unwrap(), expected);
        assert_eq!(parse_timestamp("2025.03.07 09:05:00").unwrap(), expected);
        assert!(parse_timestamp("yesterday").is_err());
    }
}
