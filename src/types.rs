use serde::{Serialize, Serializer};
use std::fmt;

use crate::util::format_int;

/// A CSV as read from disk: header names plus one optional cell per column.
///
/// `None` marks a missing value; the normalizer replaces it with the
/// configured fill value.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl RawTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }
}

/// One policy transaction after normalization.
///
/// `premium` and `loss` are derived once here and never recomputed.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyRecord {
    pub year: i32,
    pub category: String,
    pub product: String,
    pub company: String,
    pub month: i32,
    pub policy_premium: f64,
    pub endorsement_premium: f64,
    pub paid_loss: f64,
    pub unpaid_loss: f64,
    pub policy_count: f64,
    pub premium: f64,
    pub loss: f64,
}

/// A single report cell. Values stay typed until they are rendered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell {
    /// Rendered as a thousands-separated integer, fraction truncated.
    Amount(f64),
    /// `value` is already in percent units (50.0 means "50.0%").
    Percent { value: f64, decimals: usize },
    /// The "--" sentinel.
    Unavailable,
    /// No baseline; rendered as an empty string.
    Empty,
}

impl Cell {
    pub fn percent(value: f64, decimals: usize) -> Self {
        Cell::Percent { value, decimals }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Amount(v) => Some(*v),
            Cell::Percent { value, .. } => Some(*value),
            Cell::Unavailable | Cell::Empty => None,
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Cell::Unavailable)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Amount(v) if v.is_finite() => f.write_str(&format_int(v.trunc() as i64)),
            Cell::Amount(_) | Cell::Unavailable => f.write_str("--"),
            Cell::Percent { value, decimals } => write!(f, "{:.*}%", *decimals, value),
            Cell::Empty => Ok(()),
        }
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// The six metrics reported for every (company, year, product) key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricRow {
    pub policy_count: Cell,
    pub premium: Cell,
    pub market_share: Cell,
    pub growth_rate: Cell,
    pub loss: Cell,
    pub loss_ratio: Cell,
}

impl MetricRow {
    pub fn cells(&self) -> [Cell; 6] {
        [
            self.policy_count,
            self.premium,
            self.market_share,
            self.growth_rate,
            self.loss,
            self.loss_ratio,
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub company: String,
    pub year: i32,
    pub product: String,
    #[serde(flatten)]
    pub metrics: MetricRow,
}

/// Final table for one category: companies in ranked order, the market
/// total last; years ascending and products in encounter order within each.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportTable {
    pub category: String,
    pub rows: Vec<ReportRow>,
}

impl ReportTable {
    pub fn get(&self, company: &str, year: i32, product: &str) -> Option<&MetricRow> {
        self.rows
            .iter()
            .find(|r| r.company == company && r.year == year && r.product == product)
            .map(|r| &r.metrics)
    }

    /// Company names in table order, each listed once.
    pub fn companies(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for r in &self.rows {
            if out.last() != Some(&r.company.as_str()) {
                out.push(&r.company);
            }
        }
        out
    }
}
