//! Operations on extracted invoices: validation, export and statistics.

pub mod export;
pub mod stats;
pub mod validation;

pub use export::{CSV_HEADERS, export_filename, records_to_csv};
pub use stats::{DashboardStats, MonthOverMonth, Trend, VendorTotal};
pub use validation::{TOLERANCE, Validation, validate};
