//! Utility functions for formatting and publishing artifacts
//!
//! Amounts are shown the Lithuanian way: space as thousands separator and a
//! decimal comma.

use anyhow::{Context, Result};
use rust_decimal::{Decimal, RoundingStrategy};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

/// Currency symbol options for formatting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurrencySymbol {
    /// Append " €"
    Eur,
    /// No currency symbol (for table cells)
    None,
}

/// Format a Decimal with two decimals, space grouping and decimal comma.
///
/// # Examples
/// ```
/// use posledger::utils::{format_amount_with_symbol, CurrencySymbol};
/// use rust_decimal_macros::dec;
///
/// assert_eq!(format_amount_with_symbol(dec!(1234.5), CurrencySymbol::Eur), "1 234,50 €");
/// assert_eq!(format_amount_with_symbol(dec!(-3), CurrencySymbol::None), "-3,00");
/// ```
pub fn format_amount_with_symbol(value: Decimal, symbol: CurrencySymbol) -> String {
    let is_negative = value < Decimal::ZERO;
    let rounded = value
        .abs()
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

    let formatted = format!("{:.2}", rounded);
    let (integer_part, decimal_part) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));

    let with_separators: String = integer_part
        .chars()
        .rev()
        .enumerate()
        .flat_map(|(i, c)| {
            if i > 0 && i % 3 == 0 {
                vec![' ', c]
            } else {
                vec![c]
            }
        })
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();

    let sign = if is_negative && !rounded.is_zero() { "-" } else { "" };
    let suffix = match symbol {
        CurrencySymbol::Eur => " €",
        CurrencySymbol::None => "",
    };

    format!("{}{},{}{}", sign, with_separators, decimal_part, suffix)
}

/// "1 234,56"
pub fn format_amount(value: Decimal) -> String {
    format_amount_with_symbol(value, CurrencySymbol::None)
}

/// "1 234,56 €"
pub fn format_eur(value: Decimal) -> String {
    format_amount_with_symbol(value, CurrencySymbol::Eur)
}

/// Quantities keep their own precision, trailing zeros dropped
pub fn format_quantity(value: Decimal) -> String {
    value.normalize().to_string().replace('.', ",")
}

/// Escape text for inclusion in HTML
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn tmp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("artifact"));
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write `bytes` to `path` through a temporary sibling, so readers never see
/// a half-written artifact
pub fn publish(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp_path = tmp_sibling(path);
    fs::write(&tmp_path, bytes).with_context(|| format!("Failed to write {:?}", tmp_path))?;
    fs::rename(&tmp_path, path).with_context(|| format!("Failed to finalize {:?}", path))?;
    Ok(())
}
