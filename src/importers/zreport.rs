use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::pos_csv::{parse_locale_decimal, ExportTable};

/// Leading columns in every grid export that only describe the store
pub const STORE_METADATA_COLUMNS: usize = 6;

const DROPPED_COLUMNS: [&str; 2] = ["GT", "Fiskalo nr."];

pub const COL_DATE: &str = "Data";
pub const COL_EMPLOYEE: &str = "Darb. vardas";
pub const COL_CASH_OUT_1: &str = "Išimta gryn. 1";
pub const COL_CASH_OUT_2: &str = "Išimta gryn. 2";

/// The first (most recent) Z report of the day
#[derive(Debug, Clone)]
pub struct ZReport {
    fields: Vec<(String, String)>,
}

impl ZReport {
    /// Build from a ZReports grid export, dropping store metadata and noise columns
    pub fn from_table(mut table: ExportTable) -> Result<Self> {
        table.drop_leading(STORE_METADATA_COLUMNS);
        for name in DROPPED_COLUMNS {
            table.drop_column(name);
        }

        let first = table
            .rows()
            .first()
            .ok_or_else(|| anyhow!("Z report export has no rows"))?;

        let fields = table
            .headers()
            .iter()
            .cloned()
            .zip(first.iter().cloned())
            .collect();

        Ok(Self { fields })
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(header, _)| header == name)
            .map(|(_, value)| value.as_str())
    }

    /// Business date: the date part of the `Data` column
    pub fn business_date(&self) -> Result<NaiveDate> {
        let raw = self
            .field(COL_DATE)
            .ok_or_else(|| anyhow!("Z report has no {} column", COL_DATE))?;
        let date_part = raw.split(' ').next().unwrap_or(raw);
        NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
            .or_else(|_| NaiveDate::parse_from_str(date_part, "%Y.%m.%d"))
            .with_context(|| format!("Could not parse Z report date: {}", raw))
    }

    /// Employee who closed the day
    pub fn closing_employee(&self) -> Option<&str> {
        self.field(COL_EMPLOYEE)
    }

    /// Cash taken out of both registers. `None` when either column is absent.
    pub fn collected_cash(&self) -> Result<Option<Decimal>> {
        let (Some(first), Some(second)) = (self.field(COL_CASH_OUT_1), self.field(COL_CASH_OUT_2))
        else {
            return Ok(None);
        };
        Ok(Some(parse_locale_decimal(first)? + parse_locale_decimal(second)?))
    }

    /// Fixed-width receipt text listing every non-empty, non-zero field
    pub fn receipt_text(&self) -> String {
        let mut text = String::new();
        for (name, value) in &self.fields {
            if value.is_empty() {
                continue;
            }
            if matches!(parse_locale_decimal(value), Ok(n) if n.is_zero()) {
                continue;
            }
            text.push_str(&format!("{:<22} {:>20}\n", name, value));
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn export(headers: &[&str], row: &[&str]) -> ExportTable {
        let mut all_headers: Vec<String> = (1..=6).map(|i| format!("Parduotuvė {}", i)).collect();
        all_headers.extend(headers.iter().map(|h| h.to_string()));
        let mut cells: Vec<String> = (1..=6).map(|i| i.to_string()).collect();
        cells.extend(row.iter().map(|c| c.to_string()));
        ExportTable::new(all_headers, vec![cells])
    }

    #[test]
    fn test_cash_and_date_from_first_row() {
        let report = ZReport::from_table(export(
            &[COL_DATE, COL_EMPLOYEE, "GT", COL_CASH_OUT_1, COL_CASH_OUT_2],
            &["2025-03-07 21:05", "Ona", "999", "1000,50", "20,25"],
        ))
        .unwrap();

        assert_eq!(report.business_date().unwrap(), NaiveDate::from_ymd_opt(2025, 3, 7).unwrap());
        assert_eq!(report.closing_employee(), Some("Ona"));
        assert_eq!(report.collected_cash().unwrap(), Some(dec!(1020.75)));
        assert_eq!(report.field("GT"), None);
        assert_eq!(report.field("Parduotuvė 1"), None);
    }

    #[test]
    fn test_missing_cash_column_yields_none() {
        let report = ZReport::from_table(export(
            &[COL_DATE, COL_CASH_OUT_1],
            &["2025-03-07 21:05", "10"],
        ))
        .unwrap();
        assert_eq!(report.collected_cash().unwrap(), None);
    }

    #[test]
    fn test_receipt_text_skips_empty_and_zero_fields() {
        let report = ZReport::from_table(export(
            &[COL_DATE, "Grąža", "Kortelė", "Grynais"],
            &["2025-03-07 21:05", "0", "", "15,30"],
        ))
        .unwrap();
        let text = report.receipt_text();
        assert!(text.contains("Grynais"));
        assert!(text.contains("15,30"));
        assert!(!text.contains("Grąža"));
        assert!(!text.contains("Kortelė"));
        assert_eq!(text.lines().count(), 2);
        assert_eq!(
            text.lines().next().unwrap(),
            format!("{:<22} {:>20}", COL_DATE, "2025-03-07 21:05")
        );
    }
}
