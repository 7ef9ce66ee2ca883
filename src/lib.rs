//! posledger - back-office jobs for a single retail shop
//!
//! Pulls grid exports from the POS web portal, files the day's collected cash
//! as a cash receipt in the accounting ledger, and builds the weekly report of
//! discounts per supplier.

pub mod b1;
pub mod config;
pub mod error;
pub mod importers;
pub mod ledger;
pub mod models;
pub mod notify;
pub mod pipeline;
pub mod pos;
pub mod reports;
pub mod suppliers;
pub mod utils;
