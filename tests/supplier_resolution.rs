//! Integration tests for supplier resolution against a mapping file on disk
//!
//! Tests:
//! - Mapping hits never reach the catalog
//! - One catalog lookup per distinct barcode, persisted on success
//! - Non-numeric codes fall through to the unknown supplier without a lookup
//! - Catalog failures degrade to the unknown supplier

mod stubs;

use chrono::NaiveDate;
use posledger::models::{SalesRow, UNKNOWN_SUPPLIER};
use posledger::suppliers::{
    MappingTable, PrefixRules, ResolutionSource, SupplierResolver,
};
use rust_decimal_macros::dec;
use std::fs;
use stubs::{ScriptedCatalog, UnreachableCatalog};
use tempfile::TempDir;

// =============================================================================
// Test Helpers
// =============================================================================

fn sale(code: &str, receipt: &str) -> SalesRow {
    SalesRow {
        employee: "Ona".to_string(),
        receipt_no: receipt.to_string(),
        product_code: code.to_string(),
        product_name: format!("Prekė {}", code),
        quantity: dec!(1),
        base_price: dec!(2.00),
        base_amount: dec!(2.00),
        amount: dec!(1.50),
        paid_amount: dec!(1.50),
        discount: dec!(0.50),
        recorded_at: NaiveDate::from_ymd_opt(2025, 3, 3)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap(),
        supplier: None,
    }
}

fn no_prefixes() -> PrefixRules {
    PrefixRules::new(Vec::<(String, String)>::new())
}

// =============================================================================
// Tests
// =============================================================================

#[test]
fn mapped_codes_need_no_network() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("mapping.csv");
    fs::write(
        &path,
        "product_code,supplier_name\n4770001000012,UAB Pieno žvaigždės\n4770001000029,Vilniaus duona\n",
    )
    .unwrap();

    let mut resolver = SupplierResolver::open(&path, no_prefixes(), UnreachableCatalog).unwrap();
    let mut rows = vec![
        sale("4770001000012", "1"),
        sale("4770001000029", "2"),
        sale("4770001000012", "3"),
    ];
    resolver.resolve_rows(&mut rows);

    let suppliers: Vec<&str> = rows.iter().map(|r| r.supplier_name()).collect();
    assert_eq!(
        suppliers,
        vec!["UAB Pieno žvaigždės", "Vilniaus duona", "UAB Pieno žvaigždės"]
    );
    assert_eq!(resolver.stats().mapped, 3);
}

#[test]
fn one_remote_lookup_per_distinct_barcode() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("mapping.csv");
    let catalog = ScriptedCatalog::default().with("4770001000029", "Vilniaus duona");

    let mut resolver = SupplierResolver::open(&path, no_prefixes(), &catalog).unwrap();
    let mut rows = vec![
        sale("4770001000029", "1"),
        sale("4770001000029", "2"),
        sale("4779999999999", "3"),
        sale("4779999999999", "4"),
    ];
    resolver.resolve_rows(&mut rows);

    assert_eq!(catalog.call_count(), 2);
    assert_eq!(rows[0].supplier_name(), "Vilniaus duona");
    assert_eq!(rows[1].supplier_name(), "Vilniaus duona");
    assert_eq!(rows[2].supplier_name(), UNKNOWN_SUPPLIER);
    assert_eq!(rows[3].supplier_name(), UNKNOWN_SUPPLIER);

    // Only the positive answer is persisted
    let reloaded = MappingTable::load(&path).unwrap();
    assert_eq!(reloaded.get("4770001000029"), Some("Vilniaus duona"));
    assert_eq!(reloaded.get("4779999999999"), None);
    assert_eq!(reloaded.len(), 1);
}

#[test]
fn repeated_runs_append_once_and_stay_stable() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("mapping.csv");
    let catalog = ScriptedCatalog::default().with("4770001000029", "Vilniaus duona");

    let first = {
        let mut resolver = SupplierResolver::open(&path, no_prefixes(), &catalog).unwrap();
        resolver.resolve("4770001000029")
    };
    let second = {
        let mut resolver = SupplierResolver::open(&path, no_prefixes(), &catalog).unwrap();
        resolver.resolve_with_source("4770001000029")
    };

    assert_eq!(first, "Vilniaus duona");
    assert_eq!(second, ("Vilniaus duona".to_string(), ResolutionSource::Mapping));
    assert_eq!(catalog.call_count(), 1, "second run should use the mapping file");

    let content = fs::read_to_string(&path).unwrap();
    assert_eq!(content.matches("4770001000029").count(), 1);
    assert!(content.starts_with("product_code,supplier_name\n"));
}

#[test]
fn non_numeric_codes_skip_the_catalog() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("mapping.csv");

    let mut resolver = SupplierResolver::open(&path, no_prefixes(), UnreachableCatalog).unwrap();
    assert_eq!(
        resolver.resolve_with_source("SVER-01"),
        (UNKNOWN_SUPPLIER.to_string(), ResolutionSource::Unknown)
    );
    assert!(!path.exists(), "unknown suppliers are never persisted");
}

#[test]
fn prefix_rules_apply_before_the_catalog() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("mapping.csv");
    let prefixes = PrefixRules::new(vec![("200", "Vietinis ūkis"), ("20", "Kitas")]);

    let mut resolver = SupplierResolver::open(&path, prefixes, UnreachableCatalog).unwrap();
    assert_eq!(
        resolver.resolve_with_source("2000123"),
        ("Vietinis ūkis".to_string(), ResolutionSource::Prefix)
    );
    assert_eq!(
        resolver.resolve_with_source("2000123"),
        ("Vietinis ūkis".to_string(), ResolutionSource::Cache)
    );
}

#[test]
fn catalog_failure_is_cached_as_unknown() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("mapping.csv");
    let catalog = ScriptedCatalog::default().failing_for("4770001000036");

    let mut resolver = SupplierResolver::open(&path, no_prefixes(), &catalog).unwrap();
    assert_eq!(resolver.resolve("4770001000036"), UNKNOWN_SUPPLIER);
    assert_eq!(resolver.resolve("4770001000036"), UNKNOWN_SUPPLIER);

    assert_eq!(catalog.call_count(), 1);
    assert_eq!(resolver.stats().remote_errors, 1);
    assert!(!path.exists());
}

#[test]
fn leading_zeros_match_the_mapping() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("mapping.csv");
    fs::write(&path, "product_code,supplier_name\n4770001000012,Pienas\n").unwrap();

    let mut resolver = SupplierResolver::open(&path, no_prefixes(), UnreachableCatalog).unwrap();
    assert_eq!(resolver.resolve("004770001000012"), "Pienas");
}
