use crate::config::{FieldMap, OutputLabels};
use crate::error::Result;
use crate::types::ReportTable;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::io::Write;
use std::path::{Path, PathBuf};
use tabled::{builder::Builder, settings::Style};

/// How a category table is laid out in its CSV "sheet".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    /// One row per (company, year, product), one column per metric.
    #[default]
    Long,
    /// One row per (company, year), one column per (product, metric),
    /// with two header rows.
    Wide,
}

/// File name for a category sheet, with path-unsafe characters replaced.
pub fn sheet_file_name(category: &str) -> String {
    let stem: String = category
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let stem = stem.trim();
    if stem.is_empty() {
        "category.csv".to_string()
    } else {
        format!("{}.csv", stem)
    }
}

/// `sheet_file_name`, suffixed until it differs (ignoring case) from every
/// name already in `used`.
fn unique_sheet_name(category: &str, used: &mut HashSet<String>) -> String {
    let base = sheet_file_name(category);
    let stem = base.trim_end_matches(".csv").to_string();
    let mut name = base;
    let mut n = 2;
    while !used.insert(name.to_lowercase()) {
        name = format!("{}_{}.csv", stem, n);
        n += 1;
    }
    name
}

/// Write one CSV per category into `dir`. Returns the paths written, in
/// category order. Categories whose names sanitize to the same file get
/// `_2`, `_3`, ... appended so no sheet overwrites another.
pub fn write_sheets(
    dir: &Path,
    tables: &BTreeMap<String, ReportTable>,
    fields: &FieldMap,
    labels: &OutputLabels,
    layout: Layout,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    let mut written = Vec::with_capacity(tables.len());
    let mut used: HashSet<String> = HashSet::new();
    for table in tables.values() {
        let path = dir.join(unique_sheet_name(&table.category, &mut used));
        let file = std::fs::File::create(&path)?;
        let headers = key_headers(fields);
        match layout {
            Layout::Long => write_long(file, table, labels, headers)?,
            Layout::Wide => write_wide(file, table, labels, headers)?,
        }
        written.push(path);
    }
    Ok(written)
}

pub fn write_long<W: Write>(
    out: W,
    table: &ReportTable,
    labels: &OutputLabels,
    [company, year, product]: [&str; 3],
) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(out);
    let mut header = vec![company, year, product];
    header.extend(labels.metric_headers());
    wtr.write_record(&header)?;
    for r in &table.rows {
        let mut record = vec![r.company.clone(), r.year.to_string(), r.product.clone()];
        record.extend(r.metrics.cells().iter().map(|c| c.to_string()));
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// The pivoted sheet: products and metrics spread across the columns.
pub fn write_wide<W: Write>(
    out: W,
    table: &ReportTable,
    labels: &OutputLabels,
    [company, year, product]: [&str; 3],
) -> Result<()> {
    let products = table_products(table);
    let metrics = labels.metric_headers();

    let mut wtr = csv::Writer::from_writer(out);
    let mut top = vec![String::new(), product.to_string()];
    let mut sub = vec![company.to_string(), year.to_string()];
    for p in &products {
        for m in metrics {
            top.push(p.to_string());
            sub.push(m.to_string());
        }
    }
    wtr.write_record(&top)?;
    wtr.write_record(&sub)?;

    let mut i = 0;
    while i < table.rows.len() {
        let (c, y) = (&table.rows[i].company, table.rows[i].year);
        let mut record = vec![c.clone(), y.to_string()];
        let mut cells: BTreeMap<&str, Vec<String>> = BTreeMap::new();
        while i < table.rows.len() && &table.rows[i].company == c && table.rows[i].year == y {
            let r = &table.rows[i];
            cells.insert(
                r.product.as_str(),
                r.metrics.cells().iter().map(|c| c.to_string()).collect(),
            );
            i += 1;
        }
        for p in &products {
            match cells.get(p) {
                Some(values) => record.extend(values.iter().cloned()),
                None => record.extend(std::iter::repeat(String::new()).take(metrics.len())),
            }
        }
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

fn key_headers(fields: &FieldMap) -> [&str; 3] {
    [&fields.company, &fields.year, &fields.product]
}

fn table_products(table: &ReportTable) -> Vec<&str> {
    let mut products: Vec<&str> = Vec::new();
    for r in &table.rows {
        if !products.contains(&r.product.as_str()) {
            products.push(&r.product);
        }
    }
    products
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

/// Markdown preview of the first `max_rows` rows of a category table.
pub fn preview_table(
    table: &ReportTable,
    fields: &FieldMap,
    labels: &OutputLabels,
    max_rows: usize,
) -> String {
    if table.rows.is_empty() || max_rows == 0 {
        return "(no rows)".to_string();
    }
    let mut builder = Builder::default();
    let mut header: Vec<String> = key_headers(fields).iter().map(|h| h.to_string()).collect();
    header.extend(labels.metric_headers().iter().map(|h| h.to_string()));
    builder.push_record(header);
    for r in table.rows.iter().take(max_rows) {
        let mut record = vec![r.company.clone(), r.year.to_string(), r.product.clone()];
        record.extend(r.metrics.cells().iter().map(|c| c.to_string()));
        builder.push_record(record);
    }
    let mut rendered = builder.build();
    rendered.with(Style::markdown());
    rendered.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Cell, MetricRow, ReportRow};

    fn metrics(premium: f64) -> MetricRow {
        MetricRow {
            policy_count: Cell::Amount(1.0),
            premium: Cell::Amount(premium),
            market_share: Cell::percent(100.0, 1),
            growth_rate: Cell::Empty,
            loss: Cell::Amount(0.0),
            loss_ratio: Cell::Unavailable,
        }
    }

    fn table() -> ReportTable {
        let row = |company: &str, year, product: &str, premium| ReportRow {
            company: company.to_string(),
            year,
            product: product.to_string(),
            metrics: metrics(premium),
        };
        ReportTable {
            category: "Fire".to_string(),
            rows: vec![
                row("A", 2023, "P1", 1500.0),
                row("A", 2023, "P2", 20.0),
                row("Total", 2023, "P1", 1500.0),
            ],
        }
    }

    const HEADERS: [&str; 3] = ["Company", "Year", "Product"];

    #[test]
    fn long_layout() {
        let mut buf = Vec::new();
        write_long(&mut buf, &table(), &OutputLabels::default(), HEADERS).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "Company,Year,Product,PolicyCount,Premium,MarketShare,GrowthRate,Loss,LossRatio"
        );
        assert_eq!(lines[1], "A,2023,P1,1,\"1,500\",100.0%,,0,--");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn wide_layout_pads_missing_products() {
        let mut buf = Vec::new();
        write_wide(&mut buf, &table(), &OutputLabels::default(), HEADERS).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with(",Product,P1,P1"));
        assert!(lines[1].starts_with("Company,Year,PolicyCount,Premium"));
        assert!(lines[3].starts_with("Total,2023,1,\"1,500\""));
        assert!(lines[3].ends_with(",,,,,,"));
    }

    #[test]
    fn sheet_names_are_path_safe() {
        assert_eq!(sheet_file_name("Fire/Marine"), "Fire_Marine.csv");
        assert_eq!(sheet_file_name("  "), "category.csv");
    }

    #[test]
    fn writes_one_file_per_category() {
        let dir = tempfile::tempdir().unwrap();
        let mut tables = BTreeMap::new();
        tables.insert("Fire".to_string(), table());
        let paths = write_sheets(
            dir.path(),
            &tables,
            &FieldMap::default(),
            &OutputLabels::default(),
            Layout::Wide,
        )
        .unwrap();
        assert_eq!(paths, vec![dir.path().join("Fire.csv")]);
        assert!(paths[0].exists());
    }

    #[test]
    fn clashing_sheet_names_get_suffixes() {
        let dir = tempfile::tempdir().unwrap();
        let mut tables = BTreeMap::new();
        for name in ["Fire/Marine", "Fire_Marine", "Fire:Marine"] {
            let mut t = table();
            t.category = name.to_string();
            tables.insert(name.to_string(), t);
        }
        let paths = write_sheets(
            dir.path(),
            &tables,
            &FieldMap::default(),
            &OutputLabels::default(),
            Layout::Long,
        )
        .unwrap();
        assert_eq!(
            paths,
            vec![
                dir.path().join("Fire_Marine.csv"),
                dir.path().join("Fire_Marine_2.csv"),
                dir.path().join("Fire_Marine_3.csv"),
            ]
        );
        let on_disk = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(on_disk, 3);
    }

    #[test]
    fn preview_is_markdown() {
        let s = preview_table(&table(), &FieldMap::default(), &OutputLabels::default(), 2);
        assert!(s.contains("| A "));
        assert!(!s.contains("Total"));
    }
}
