// Market-level and company-level aggregation for a single category.
//
// Both passes read the same immutable record slice. Market rows cover every
// (product, year) pair of the category, zero-filled; company rows cover every
// (company, product, year) triple, with combinations that have no records
// kept as placeholders rather than zeros.

use crate::types::{Cell, PolicyRecord};
use crate::util::{pct_change, round_half_even};
use std::collections::HashMap;

/// Sums of the three additive fields for one aggregate key.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Totals {
    pub policy_count: f64,
    pub premium: f64,
    pub loss: f64,
}

impl Totals {
    fn add(&mut self, r: &PolicyRecord) {
        self.policy_count += r.policy_count;
        self.premium += r.premium;
        self.loss += r.loss;
    }
}

/// The dimensions of one category, in report order.
#[derive(Debug, Clone)]
pub struct CategoryData<'a> {
    pub name: &'a str,
    pub records: Vec<&'a PolicyRecord>,
    /// Ascending.
    pub years: Vec<i32>,
    /// First-encounter order.
    pub products: Vec<&'a str>,
    /// First-encounter order.
    pub companies: Vec<&'a str>,
}

impl<'a> CategoryData<'a> {
    pub fn new(name: &'a str, records: Vec<&'a PolicyRecord>) -> Self {
        let mut years: Vec<i32> = records.iter().map(|r| r.year).collect();
        years.sort_unstable();
        years.dedup();
        let mut products: Vec<&str> = Vec::new();
        let mut companies: Vec<&str> = Vec::new();
        for r in records.iter().copied() {
            if !products.contains(&r.product.as_str()) {
                products.push(&r.product);
            }
            if !companies.contains(&r.company.as_str()) {
                companies.push(&r.company);
            }
        }
        Self { name, records, years, products, companies }
    }

    pub fn current_year(&self) -> Option<i32> {
        self.years.last().copied()
    }

    pub fn last_year(&self) -> Option<i32> {
        self.years.first().copied()
    }

    /// Year immediately preceding `year` among the category's years.
    fn previous_year(&self, year: i32) -> Option<i32> {
        let idx = self.years.iter().position(|y| *y == year)?;
        idx.checked_sub(1).map(|i| self.years[i])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarketRow {
    pub product: String,
    pub year: i32,
    pub totals: Totals,
    pub market_share: Cell,
    pub growth_rate: Cell,
    pub loss_ratio: Cell,
}

/// Market totals per (product, year), keyed for share lookups.
pub type MarketTotals = HashMap<(String, i32), f64>;

/// Sum every company's business per (product, year).
pub fn aggregate_market(cat: &CategoryData) -> Vec<MarketRow> {
    let mut sums: HashMap<(&str, i32), Totals> = HashMap::new();
    for r in cat.records.iter().copied() {
        sums.entry((r.product.as_str(), r.year)).or_default().add(r);
    }
    let last_year = cat.last_year();

    let mut rows = Vec::with_capacity(cat.products.len() * cat.years.len());
    for product in &cat.products {
        for year in &cat.years {
            let totals = sums.get(&(*product, *year)).copied().unwrap_or_default();
            let growth_rate = if Some(*year) == last_year {
                Cell::Empty
            } else {
                let prev = cat
                    .previous_year(*year)
                    .and_then(|y| sums.get(&(*product, y)))
                    .map(|t| t.premium)
                    .unwrap_or(0.0);
                market_growth(pct_change(prev, totals.premium))
            };
            rows.push(MarketRow {
                product: product.to_string(),
                year: *year,
                totals,
                market_share: Cell::percent(100.0, 1),
                growth_rate,
                loss_ratio: market_loss_ratio(&totals),
            });
        }
    }
    rows
}

pub fn market_totals(rows: &[MarketRow]) -> MarketTotals {
    rows.iter()
        .map(|r| ((r.product.clone(), r.year), r.totals.premium))
        .collect()
}

/// Market growth: one decimal, ties to even. A zero baseline maps to
/// 100% (growth from nothing), 0% (nothing to nothing) or blank (decline
/// into negative premium).
fn market_growth(change: f64) -> Cell {
    // Applied to middle years as well as the latest year, so no "inf%" or
    // "nan%" text reaches a report.
    if change.is_nan() {
        Cell::percent(0.0, 1)
    } else if change == f64::INFINITY {
        Cell::percent(100.0, 1)
    } else if change == f64::NEG_INFINITY {
        Cell::Empty
    } else {
        Cell::percent(round_half_even(change * 100.0, 1), 1)
    }
}

fn market_loss_ratio(t: &Totals) -> Cell {
    if t.premium == 0.0 {
        Cell::Unavailable
    } else {
        Cell::percent(round_half_even(t.loss / t.premium * 100.0, 1), 1)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompanyRow {
    pub company: String,
    pub product: String,
    pub year: i32,
    /// `None` when the company wrote nothing for this product and year.
    pub totals: Option<Totals>,
    pub market_share: Cell,
    pub growth_rate: Cell,
    pub loss_ratio: Cell,
}

impl CompanyRow {
    pub fn premium(&self) -> Option<f64> {
        self.totals.map(|t| t.premium)
    }
}

/// Per-company rows for every (company, product, year) of the category.
pub fn aggregate_companies(cat: &CategoryData, market: &MarketTotals) -> Vec<CompanyRow> {
    let mut sums: HashMap<(&str, &str, i32), Totals> = HashMap::new();
    for r in cat.records.iter().copied() {
        sums.entry((r.company.as_str(), r.product.as_str(), r.year))
            .or_default()
            .add(r);
    }
    let growth = company_growth(cat, &sums);

    let mut rows = Vec::with_capacity(cat.companies.len() * cat.products.len() * cat.years.len());
    for company in &cat.companies {
        for product in &cat.products {
            for year in &cat.years {
                let totals = sums.get(&(*company, *product, *year)).copied();
                let total_premium = market
                    .get(&(product.to_string(), *year))
                    .copied()
                    .unwrap_or(0.0);
                rows.push(CompanyRow {
                    company: company.to_string(),
                    product: product.to_string(),
                    year: *year,
                    totals,
                    market_share: market_share(totals, total_premium),
                    growth_rate: growth
                        .get(&(*company, *product, *year))
                        .copied()
                        .unwrap_or(Cell::Empty),
                    loss_ratio: company_loss_ratio(totals),
                });
            }
        }
    }
    rows
}

fn market_share(totals: Option<Totals>, total_premium: f64) -> Cell {
    match totals {
        Some(t) if total_premium > 0.0 => Cell::percent(t.premium / total_premium * 100.0, 2),
        _ => Cell::Unavailable,
    }
}

/// Unlike the market path there is no rounding step before formatting.
fn company_loss_ratio(totals: Option<Totals>) -> Cell {
    match totals {
        Some(t) if t.premium != 0.0 => Cell::percent(t.loss / t.premium * 100.0, 1),
        _ => Cell::Unavailable,
    }
}

/// Current-year premium growth per (company, product). Absent combinations
/// count as zero premium; a zero-to-zero change has no value and is left out.
fn company_growth<'a>(
    cat: &CategoryData<'a>,
    sums: &HashMap<(&'a str, &'a str, i32), Totals>,
) -> HashMap<(&'a str, &'a str, i32), Cell> {
    let mut out = HashMap::new();
    let Some(current) = cat.current_year() else {
        return out;
    };
    let Some(prev_year) = cat.previous_year(current) else {
        return out;
    };
    let premium = |company: &str, product: &str, year: i32| {
        sums.get(&(company, product, year)).map(|t| t.premium).unwrap_or(0.0)
    };

    for company in &cat.companies {
        for product in &cat.products {
            let change = pct_change(
                premium(company, product, prev_year),
                premium(company, product, current),
            );
            let cell = if change.is_nan() {
                continue;
            } else if change.is_infinite() {
                Cell::percent(100.0, 1)
            } else {
                Cell::percent(change * 100.0, 2)
            };
            out.insert((*company, *product, current), cell);
        }
    }
    out
}
