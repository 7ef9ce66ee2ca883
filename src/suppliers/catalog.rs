use anyhow::Result;

/// Result of asking the item catalog about a barcode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    /// Manufacturer name of the first matching item
    Found(String),
    /// The catalog answered but has no usable item for the barcode
    NotFound,
}

/// Remote item catalog keyed by barcode.
///
/// Transport, status and decoding failures are returned as `Err`; the resolver
/// decides what they mean for attribution.
pub trait CatalogLookup {
    fn lookup_barcode(&self, barcode: &str) -> Result<LookupOutcome>;
}

impl<T: CatalogLookup + ?Sized> CatalogLookup for &T {
    fn lookup_barcode(&self, barcode: &str) -> Result<LookupOutcome> {
        (**self).lookup_barcode(barcode)
    }
}

impl<T: CatalogLookup + ?Sized> CatalogLookup for Box<T> {
    fn lookup_barcode(&self, barcode: &str) -> Result<LookupOutcome> {
        (**self).lookup_barcode(barcode)
    }
}

/// Catalog that knows nothing; used when no API key is configured
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineCatalog;

impl CatalogLookup for OfflineCatalog {
    fn lookup_barcode(&self, _barcode: &str) -> Result<LookupOutcome> {
        Ok(LookupOutcome::NotFound)
    }
}
