use anyhow::{Context, Result};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_xlsxwriter::{Format, Workbook, Worksheet};

use super::SupplierTotal;
use crate::models::SalesRow;

pub const SALES_SHEET: &str = "Pardavimai";
pub const TOTALS_SHEET: &str = "Sumiškai pagal tiekėją";

const SALES_HEADERS: [&str; 12] = [
    "Darb. vardas",
    "Čekio nr.",
    "Prekės kodas",
    "Tiekėjas",
    "Prekės pavadinimas",
    "Kiekis",
    "Pagr. kaina",
    "Pagr. suma",
    "Suma",
    "Mok. suma",
    "Nuolaida",
    "Įrašo data",
];

fn write_headers(sheet: &mut Worksheet, headers: &[&str], bold: &Format) -> Result<()> {
    for (col, header) in headers.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *header, bold)?;
    }
    Ok(())
}

fn write_decimal(sheet: &mut Worksheet, row: u32, col: u16, value: Decimal) -> Result<()> {
    sheet.write_number(row, col, value.to_f64().unwrap_or_default())?;
    Ok(())
}

/// Build the weekly workbook: every discounted sale, and totals per supplier
pub fn build_workbook(rows: &[SalesRow], totals: &[SupplierTotal]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    {
        let sheet = workbook.add_worksheet();
        sheet.set_name(SALES_SHEET)?;
        write_headers(sheet, &SALES_HEADERS, &bold)?;

        for (idx, sale) in rows.iter().enumerate() {
            let r = idx as u32 + 1;
            sheet.write_string(r, 0, &sale.employee)?;
            sheet.write_string(r, 1, &sale.receipt_no)?;
            sheet.write_string(r, 2, &sale.product_code)?;
            sheet.write_string(r, 3, sale.supplier_name())?;
            sheet.write_string(r, 4, &sale.product_name)?;
            write_decimal(sheet, r, 5, sale.quantity)?;
            write_decimal(sheet, r, 6, sale.base_price)?;
            write_decimal(sheet, r, 7, sale.base_amount)?;
            write_decimal(sheet, r, 8, sale.amount)?;
            write_decimal(sheet, r, 9, sale.paid_amount)?;
            write_decimal(sheet, r, 10, sale.discount)?;
            sheet.write_string(r, 11, sale.recorded_at.format("%Y-%m-%d %H:%M:%S").to_string())?;
        }
    }

    {
        let sheet = workbook.add_worksheet();
        sheet.set_name(TOTALS_SHEET)?;
        write_headers(sheet, &["Tiekėjas", "Nuolaida"], &bold)?;
        for (idx, total) in totals.iter().enumerate() {
            let r = idx as u32 + 1;
            sheet.write_string(r, 0, &total.supplier)?;
            write_decimal(sheet, r, 1, total.discount)?;
        }
    }

    workbook
        .save_to_buffer()
        .context("Failed to render Excel workbook")
}
