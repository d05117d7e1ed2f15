use crate::aggregate::{
    aggregate_companies, aggregate_market, market_totals, CategoryData, CompanyRow, MarketRow,
};
use crate::config::{ReportConfig, ReportSettings};
use crate::error::Result;
use crate::normalize::{normalize, partition_categories};
use crate::ranking::rank_companies;
use crate::types::{Cell, MetricRow, PolicyRecord, RawTable, ReportRow, ReportTable};
use log::{debug, info, warn};
use std::collections::{BTreeMap, HashMap};

/// Normalize the raw table and build every category report.
pub fn generate(raw: &RawTable, config: &ReportConfig) -> Result<BTreeMap<String, ReportTable>> {
    config.validate()?;
    let records = normalize(
        raw,
        &config.fields,
        &config.labels.policy_count,
        config.fill_value,
    )?;
    Ok(build_reports(&records, &config.settings()))
}

/// One table per category, keyed and ordered by category name.
pub fn build_reports(
    records: &[PolicyRecord],
    settings: &ReportSettings,
) -> BTreeMap<String, ReportTable> {
    let mut tables = BTreeMap::new();
    for (name, subset) in partition_categories(records, &settings.excluded_category) {
        let table = build_category_report(CategoryData::new(name, subset), settings);
        debug!("{}: {} rows", name, table.rows.len());
        tables.insert(name.to_string(), table);
    }
    info!("built {} category reports", tables.len());
    tables
}

pub fn build_category_report(cat: CategoryData, settings: &ReportSettings) -> ReportTable {
    if total_label_clash(&cat, &settings.total_label) {
        warn!(
            "{}: a company is named '{}', the same as the market total label; \
             its rows will share keys with the market total",
            cat.name, settings.total_label
        );
    }
    let market = aggregate_market(&cat);
    let companies = aggregate_companies(&cat, &market_totals(&market));
    let order = rank_companies(&cat, &settings.pinned_companies);
    shape_report(&cat, &order, companies, market, &settings.total_label)
}

/// True when a real company in the category carries the market-total label.
pub fn total_label_clash(cat: &CategoryData, total_label: &str) -> bool {
    cat.companies.contains(&total_label)
}

/// Merge company and market rows into the final (company, year, product)
/// layout. Companies follow `order`, the market total comes last; within a
/// company rows run by year, then by product in encounter order.
pub fn shape_report(
    cat: &CategoryData,
    order: &[String],
    companies: Vec<CompanyRow>,
    market: Vec<MarketRow>,
    total_label: &str,
) -> ReportTable {
    let mut by_company: HashMap<String, HashMap<(i32, String), MetricRow>> = HashMap::new();
    for row in companies {
        let metrics = company_metrics(&row);
        by_company
            .entry(row.company)
            .or_default()
            .insert((row.year, row.product), metrics);
    }
    let mut totals: HashMap<(i32, String), MetricRow> = HashMap::new();
    for row in market {
        let metrics = market_metrics(&row);
        totals.insert((row.year, row.product), metrics);
    }

    let mut rows = Vec::new();
    let mut emit = |company: &str, cells: &mut HashMap<(i32, String), MetricRow>| {
        for year in &cat.years {
            for product in &cat.products {
                if let Some(metrics) = cells.remove(&(*year, product.to_string())) {
                    rows.push(ReportRow {
                        company: company.to_string(),
                        year: *year,
                        product: product.to_string(),
                        metrics,
                    });
                }
            }
        }
    };
    for company in order {
        if let Some(cells) = by_company.get_mut(company) {
            emit(company, cells);
        }
    }
    emit(total_label, &mut totals);

    ReportTable {
        category: cat.name.to_string(),
        rows,
    }
}

fn company_metrics(row: &CompanyRow) -> MetricRow {
    let amount = |v: Option<f64>| v.map(Cell::Amount).unwrap_or(Cell::Unavailable);
    MetricRow {
        policy_count: amount(row.totals.map(|t| t.policy_count)),
        premium: amount(row.premium()),
        market_share: row.market_share,
        growth_rate: row.growth_rate,
        loss: amount(row.totals.map(|t| t.loss)),
        loss_ratio: row.loss_ratio,
    }
}

fn market_metrics(row: &MarketRow) -> MetricRow {
    MetricRow {
        policy_count: Cell::Amount(row.totals.policy_count),
        premium: Cell::Amount(row.totals.premium),
        market_share: row.market_share,
        growth_rate: row.growth_rate,
        loss: Cell::Amount(row.totals.loss),
        loss_ratio: row.loss_ratio,
    }
}
