use crate::config::FieldMap;
use crate::error::{ReportError, Result};
use crate::types::RawTable;
use crate::util::parse_int_safe;
use chrono::{Datelike, NaiveDate};
use csv::ReaderBuilder;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct LoadReport {
    pub total_rows: usize,
    pub short_rows: usize,
}

pub fn load_raw_table(path: &Path) -> Result<(RawTable, LoadReport)> {
    let file = std::fs::File::open(path)?;
    read_raw_table(file)
}

/// Read every row as optional strings. Columns are not interpreted here;
/// the normalizer resolves them through the configured `FieldMap`.
pub fn read_raw_table<R: Read>(reader: R) -> Result<(RawTable, LoadReport)> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();

    let mut rows = Vec::new();
    let mut short_rows = 0usize;
    for result in rdr.records() {
        let record = result?;
        if record.len() < headers.len() {
            short_rows += 1;
        }
        let row: Vec<Option<String>> = (0..headers.len())
            .map(|i| match record.get(i) {
                Some(cell) if !cell.is_empty() => Some(cell.to_string()),
                _ => None,
            })
            .collect();
        rows.push(row);
    }

    let report = LoadReport { total_rows: rows.len(), short_rows };
    Ok((RawTable { headers, rows }, report))
}

/// Reporting month for single-month runs: two months back from `today`.
pub fn statistic_month(today: NaiveDate) -> u32 {
    match today.month() {
        1 => 11,
        2 => 12,
        m => m - 2,
    }
}

/// Keep only rows whose month column equals `month`. Returns the number of
/// rows kept. Rows with an unreadable month are dropped.
pub fn filter_statistic_month(table: &mut RawTable, fields: &FieldMap, month: u32) -> Result<usize> {
    let idx = table
        .column_index(&fields.month)
        .ok_or_else(|| ReportError::MissingColumn {
            role: "month".to_string(),
            column: fields.month.clone(),
        })?;
    table
        .rows
        .retain(|row| parse_int_safe(row.get(idx).and_then(|c| c.as_deref())) == Some(month as i32));
    Ok(table.rows.len())
}
