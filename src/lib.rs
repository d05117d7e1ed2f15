// Per-category insurance business reports built from a flat ledger of
// policy transactions.
//
// The pipeline is `loader` (CSV in) → `normalize` (fill, trim, derive
// premium and loss, split by category) → `aggregate` and `ranking` (per
// category) → `reports` (final table shape) → `output` (CSV/JSON out).
pub mod aggregate;
pub mod config;
pub mod error;
pub mod loader;
pub mod normalize;
pub mod output;
pub mod ranking;
pub mod reports;
pub mod types;
pub mod util;

pub use config::{FieldMap, OutputLabels, ReportConfig, ReportSettings};
pub use error::ReportError;
pub use reports::{build_reports, generate};
pub use types::{Cell, MetricRow, PolicyRecord, RawTable, ReportRow, ReportTable};
