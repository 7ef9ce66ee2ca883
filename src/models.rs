// Domain models shared by the importers, the supplier resolver and the reports

use chrono::NaiveDateTime;
use rust_decimal::Decimal;

/// Supplier assigned when every resolution step came up empty
pub const UNKNOWN_SUPPLIER: &str = "Nežinomas";

/// One discounted transaction line from the Transactions grid export
#[derive(Debug, Clone, PartialEq)]
pub struct SalesRow {
    pub employee: String,
    pub receipt_no: String,
    pub product_code: String,
    pub product_name: String,
    pub quantity: Decimal,
    /// List price per unit before discounts
    pub base_price: Decimal,
    pub base_amount: Decimal,
    pub amount: Decimal,
    pub paid_amount: Decimal,
    pub discount: Decimal,
    pub recorded_at: NaiveDateTime,
    /// Filled in by the supplier resolver
    pub supplier: Option<String>,
}

impl SalesRow {
    /// Supplier name, falling back to the unknown sentinel
    pub fn supplier_name(&self) -> &str {
        self.supplier.as_deref().unwrap_or(UNKNOWN_SUPPLIER)
    }

    /// Label used in the product table: "name (code)"
    pub fn product_label(&self) -> String {
        format!("{} ({})", self.product_name, self.product_code)
    }
}

/// Normalize a product code as exported by the POS.
///
/// Purely numeric codes are reduced to their integer form so that `000123`
/// and `123` key the same mapping entry. Anything else is only trimmed.
pub fn normalize_product_code(raw: &str) -> String {
    let trimmed = raw.trim();
    if is_numeric_code(trimmed) {
        let stripped = trimmed.trim_start_matches('0');
        if stripped.is_empty() {
            "0".to_string()
        } else {
            stripped.to_string()
        }
    } else {
        trimmed.to_string()
    }
}

/// Barcodes are digits only
pub fn is_numeric_code(code: &str) -> bool {
    !code.is_empty() && code.bytes().all(|b| b.is_ascii_digit())
}
