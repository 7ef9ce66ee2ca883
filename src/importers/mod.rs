// Import module - POS portal CSV exports

pub mod pos_csv;
pub mod sales;
pub mod zreport;

pub use pos_csv::{parse_locale_decimal, read_export, ExportTable};
pub use sales::discounted_sales;
pub use zreport::ZReport;
