//! Supplier resolution
//!
//! Every sold product gets a supplier name by trying, in order:
//! 1. the per-run resolution cache
//! 2. the persisted mapping table (joined in bulk for a batch of rows)
//! 3. the configured prefix rules
//! 4. the remote catalog, for numeric codes only; a hit is appended to the
//!    mapping table so the next run never asks again
//!
//! Anything left over is attributed to [`UNKNOWN_SUPPLIER`]. Unknown results
//! are never persisted, so a later catalog fix or manual edit still applies.

pub mod catalog;
pub mod mapping;
pub mod prefix;

use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, info, warn};

pub use catalog::{CatalogLookup, LookupOutcome, OfflineCatalog};
pub use mapping::MappingTable;
pub use prefix::PrefixRules;

use crate::models::{is_numeric_code, normalize_product_code, SalesRow, UNKNOWN_SUPPLIER};

/// Where a resolution came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionSource {
    Cache,
    Mapping,
    Prefix,
    Remote,
    Unknown,
}

impl ResolutionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionSource::Cache => "cache",
            ResolutionSource::Mapping => "mapping",
            ResolutionSource::Prefix => "prefix",
            ResolutionSource::Remote => "remote",
            ResolutionSource::Unknown => "unknown",
        }
    }
}

/// Per-run memory of resolved codes, negative results included
#[derive(Debug, Default)]
pub struct ResolutionCache {
    entries: HashMap<String, Option<String>>,
}

impl ResolutionCache {
    pub fn get(&self, code: &str) -> Option<Option<&str>> {
        self.entries.get(code).map(|v| v.as_deref())
    }

    pub fn insert(&mut self, code: &str, supplier: Option<String>) {
        self.entries.insert(code.to_string(), supplier);
    }
}

/// Counters for one resolver's lifetime, logged after a batch
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ResolutionStats {
    pub mapped: usize,
    pub cached: usize,
    pub prefixed: usize,
    pub remote: usize,
    pub unknown: usize,
    pub remote_lookups: usize,
    pub remote_errors: usize,
}

pub struct SupplierResolver<C> {
    mapping: MappingTable,
    mapping_path: PathBuf,
    prefixes: PrefixRules,
    catalog: C,
    cache: ResolutionCache,
    stats: ResolutionStats,
}

impl<C: CatalogLookup> SupplierResolver<C> {
    pub fn new(
        mapping: MappingTable,
        mapping_path: impl Into<PathBuf>,
        prefixes: PrefixRules,
        catalog: C,
    ) -> Self {
        Self {
            mapping,
            mapping_path: mapping_path.into(),
            prefixes,
            catalog,
            cache: ResolutionCache::default(),
            stats: ResolutionStats::default(),
        }
    }

    /// Load the mapping table from `mapping_path` and build a resolver around it
    pub fn open(
        mapping_path: impl Into<PathBuf>,
        prefixes: PrefixRules,
        catalog: C,
    ) -> anyhow::Result<Self> {
        let mapping_path = mapping_path.into();
        let mapping = MappingTable::load(&mapping_path)?;
        Ok(Self::new(mapping, mapping_path, prefixes, catalog))
    }

    /// Resolve one product code to a supplier name
    pub fn resolve(&mut self, product_code: &str) -> String {
        self.resolve_with_source(product_code).0
    }

    pub fn resolve_with_source(&mut self, product_code: &str) -> (String, ResolutionSource) {
        let code = normalize_product_code(product_code);

        if let Some(cached) = self.cache.get(&code) {
            self.stats.cached += 1;
            let name = cached.unwrap_or(UNKNOWN_SUPPLIER).to_string();
            return (name, ResolutionSource::Cache);
        }

        if let Some(supplier) = self.mapping.get(&code) {
            self.stats.mapped += 1;
            return (supplier.to_string(), ResolutionSource::Mapping);
        }

        let (resolved, source) = self.resolve_unmapped(&code);
        self.cache.insert(&code, resolved.clone());
        match resolved {
            Some(name) => (name, source),
            None => {
                self.stats.unknown += 1;
                (UNKNOWN_SUPPLIER.to_string(), ResolutionSource::Unknown)
            }
        }
    }

    /// Attribute a supplier to every row.
    ///
    /// The mapping table is joined onto all rows first; only rows it leaves
    /// empty go through the cache / prefix / remote chain.
    pub fn resolve_rows(&mut self, rows: &mut [SalesRow]) {
        let mut pending = Vec::new();
        for (idx, row) in rows.iter_mut().enumerate() {
            match self.mapping.get(&row.product_code) {
                Some(supplier) => {
                    self.stats.mapped += 1;
                    row.supplier = Some(supplier.to_string());
                }
                None => pending.push(idx),
            }
        }

        debug!(
            "Mapping join matched {} of {} rows",
            rows.len() - pending.len(),
            rows.len()
        );

        for idx in pending {
            let supplier = self.resolve(&rows[idx].product_code);
            rows[idx].supplier = Some(supplier);
        }

        let s = &self.stats;
        info!(
            "Supplier resolution: {} mapped, {} cached, {} by prefix, {} remote, {} unknown ({} catalog lookups, {} failed)",
            s.mapped, s.cached, s.prefixed, s.remote, s.unknown, s.remote_lookups, s.remote_errors
        );
    }

    fn resolve_unmapped(&mut self, code: &str) -> (Option<String>, ResolutionSource) {
        if let Some(supplier) = self.prefixes.lookup(code) {
            self.stats.prefixed += 1;
            return (Some(supplier.to_string()), ResolutionSource::Prefix);
        }

        if !is_numeric_code(code) {
            debug!("Code {} is not a barcode; skipping catalog lookup", code);
            return (None, ResolutionSource::Unknown);
        }

        self.stats.remote_lookups += 1;
        match self.catalog.lookup_barcode(code) {
            Ok(LookupOutcome::Found(manufacturer)) => {
                self.stats.remote += 1;
                if let Err(e) = MappingTable::append(&self.mapping_path, code, &manufacturer) {
                    warn!("Could not persist mapping {} -> {}: {:#}", code, manufacturer, e);
                }
                info!("Catalog resolved {} -> {}", code, manufacturer);
                (Some(manufacturer), ResolutionSource::Remote)
            }
            Ok(LookupOutcome::NotFound) => {
                debug!("Catalog has no manufacturer for {}", code);
                (None, ResolutionSource::Unknown)
            }
            Err(e) => {
                self.stats.remote_errors += 1;
                warn!("Catalog lookup failed for {}: {:#}", code, e);
                (None, ResolutionSource::Unknown)
            }
        }
    }

    pub fn stats(&self) -> &ResolutionStats {
        &self.stats
    }

    pub fn cache(&self) -> &ResolutionCache {
        &self.cache
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }
}
