pub mod import_service;
pub mod report_query;
mod report_service;

pub use import_service::ReportRow;
pub use report_query::{IncrementalReveal, ReportFilter, SortOption};
pub use report_service::{ReportPage, ReportService};
