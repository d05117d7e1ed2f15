// Record normalization and per-category partitioning.
//
// The normalizer is the only place that knows about source column names:
// it resolves every configured role against the CSV headers, fills holes
// with the fill value and derives `premium` and `loss` once per record.
use crate::config::FieldMap;
use crate::error::{ReportError, Result};
use crate::types::{PolicyRecord, RawTable};
use crate::util::{parse_f64_safe, parse_int_safe};
use log::{debug, warn};
use std::collections::BTreeMap;

/// Resolved header positions for every field a record is built from.
struct Columns {
    year: usize,
    category: usize,
    product: usize,
    company: usize,
    month: usize,
    policy_premium: usize,
    endorsement_premium: usize,
    paid_loss: usize,
    unpaid_loss: usize,
    policy_count: usize,
}

impl Columns {
    fn resolve(table: &RawTable, fields: &FieldMap, policy_count: &str) -> Result<Self> {
        let find = |role: &str, column: &str| {
            table
                .column_index(column)
                .ok_or_else(|| ReportError::MissingColumn {
                    role: role.to_string(),
                    column: column.to_string(),
                })
        };
        Ok(Self {
            year: find("year", &fields.year)?,
            category: find("category", &fields.category)?,
            product: find("product", &fields.product)?,
            company: find("company", &fields.company)?,
            month: find("month", &fields.month)?,
            policy_premium: find("policy_premium", &fields.policy_premium)?,
            endorsement_premium: find("endorsement_premium", &fields.endorsement_premium)?,
            paid_loss: find("paid_loss", &fields.paid_loss)?,
            unpaid_loss: find("unpaid_loss", &fields.unpaid_loss)?,
            policy_count: find("policy_count", policy_count)?,
        })
    }
}

/// Fill value as seen by the three kinds of columns.
#[derive(Debug, Clone, Copy)]
struct Fill(f64);

impl Fill {
    fn number(self) -> f64 {
        self.0
    }

    fn int(self) -> i32 {
        self.0 as i32
    }

    fn text(self) -> String {
        if self.0.is_finite() && self.0.fract() == 0.0 {
            format!("{}", self.0 as i64)
        } else {
            self.0.to_string()
        }
    }
}

/// A cell past the end of a short row counts as missing.
fn cell(row: &[Option<String>], idx: usize) -> Option<&str> {
    row.get(idx).and_then(|c| c.as_deref())
}

/// Build normalized records from the raw table.
///
/// Fails only when a configured column is absent from the headers. Missing
/// cells take `fill_value`; numeric cells that do not parse are treated the
/// same way and counted in a warning.
pub fn normalize(
    table: &RawTable,
    fields: &FieldMap,
    policy_count_column: &str,
    fill_value: f64,
) -> Result<Vec<PolicyRecord>> {
    let cols = Columns::resolve(table, fields, policy_count_column)?;
    let fill = Fill(fill_value);
    let mut unparsed = 0usize;

    let mut number = |row: &[Option<String>], idx: usize| -> f64 {
        match cell(row, idx) {
            None => fill.number(),
            Some(s) => parse_f64_safe(Some(s)).unwrap_or_else(|| {
                unparsed += 1;
                fill.number()
            }),
        }
    };
    let text = |row: &[Option<String>], idx: usize| -> String {
        cell(row, idx)
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|| fill.text())
    };
    let int = |row: &[Option<String>], idx: usize| -> i32 {
        parse_int_safe(cell(row, idx)).unwrap_or_else(|| fill.int())
    };

    let mut records = Vec::with_capacity(table.rows.len());
    for row in table.rows.iter().map(Vec::as_slice) {
        let policy_premium = number(row, cols.policy_premium);
        let endorsement_premium = number(row, cols.endorsement_premium);
        let paid_loss = number(row, cols.paid_loss);
        let unpaid_loss = number(row, cols.unpaid_loss);
        let policy_count = number(row, cols.policy_count);
        records.push(PolicyRecord {
            year: int(row, cols.year),
            category: text(row, cols.category),
            product: text(row, cols.product),
            company: text(row, cols.company),
            month: int(row, cols.month),
            policy_premium,
            endorsement_premium,
            paid_loss,
            unpaid_loss,
            policy_count,
            premium: policy_premium + endorsement_premium,
            loss: paid_loss + unpaid_loss,
        });
    }

    if unparsed > 0 {
        warn!("{} numeric cells could not be parsed and were replaced by {}", unparsed, fill_value);
    }
    debug!("normalized {} records", records.len());
    Ok(records)
}

/// Split records by category, dropping `excluded` if present.
///
/// Categories come back in alphabetical order; callers must not rely on
/// any relationship between categories beyond that.
pub fn partition_categories<'a>(
    records: &'a [PolicyRecord],
    excluded: &str,
) -> BTreeMap<&'a str, Vec<&'a PolicyRecord>> {
    let mut map: BTreeMap<&str, Vec<&PolicyRecord>> = BTreeMap::new();
    for r in records {
        if r.category == excluded {
            continue;
        }
        map.entry(r.category.as_str()).or_default().push(r);
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::read_raw_table;

    const HEADER: &str = "Year,Category,Product,Company,Month,PolicyPremium,EndorsementPremium,PaidLoss,UnpaidLoss,PolicyCount";

    fn table(body: &str) -> RawTable {
        let csv = format!("{}\n{}", HEADER, body);
        read_raw_table(csv.as_bytes()).unwrap().0
    }

    #[test]
    fn derives_premium_and_loss() {
        let t = table("2023, Fire ,P1, A ,9,100,20,5,7,3\n");
        let recs = normalize(&t, &FieldMap::default(), "PolicyCount", 0.0).unwrap();
        assert_eq!(recs.len(), 1);
        let r = &recs[0];
        assert_eq!(r.category, "Fire");
        assert_eq!(r.company, "A");
        assert_eq!(r.premium, 120.0);
        assert_eq!(r.loss, 12.0);
        assert_eq!(r.policy_count, 3.0);
    }

    #[test]
    fn missing_cells_take_fill_value() {
        let t = table("2023,Fire,,A,9,100,,,7,\n");
        let recs = normalize(&t, &FieldMap::default(), "PolicyCount", 0.0).unwrap();
        let r = &recs[0];
        assert_eq!(r.product, "0");
        assert_eq!(r.endorsement_premium, 0.0);
        assert_eq!(r.premium, 100.0);
        assert_eq!(r.loss, 7.0);
        assert_eq!(r.policy_count, 0.0);
    }

    #[test]
    fn short_rows_are_filled_not_fatal() {
        let mut t = table("2023,Fire,P1,A,9,100,0,0,0,1\n");
        t.rows.push(vec![Some("2022".to_string()), Some("Fire".to_string())]);
        let recs = normalize(&t, &FieldMap::default(), "PolicyCount", 0.0).unwrap();
        assert_eq!(recs.len(), 2);
        let r = &recs[1];
        assert_eq!(r.year, 2022);
        assert_eq!(r.category, "Fire");
        assert_eq!(r.product, "0");
        assert_eq!(r.company, "0");
        assert_eq!(r.month, 0);
        assert_eq!(r.premium, 0.0);
        assert_eq!(r.loss, 0.0);
    }

    #[test]
    fn missing_column_is_fatal() {
        let t = read_raw_table("Year,Category\n2023,Fire\n".as_bytes()).unwrap().0;
        let err = normalize(&t, &FieldMap::default(), "PolicyCount", 0.0).unwrap_err();
        assert!(matches!(err, ReportError::MissingColumn { ref role, .. } if role == "product"));
    }

    #[test]
    fn partition_drops_excluded_category() {
        let t = table(
            "2023,Fire,P1,A,9,1,0,0,0,1\n\
             2023,Nuclear Energy,P1,A,9,1,0,0,0,1\n\
             2023,Marine,P1,A,9,1,0,0,0,1\n\
             2022,Fire,P2,B,9,1,0,0,0,1\n",
        );
        let recs = normalize(&t, &FieldMap::default(), "PolicyCount", 0.0).unwrap();
        let parts = partition_categories(&recs, "Nuclear Energy");
        let keys: Vec<&str> = parts.keys().copied().collect();
        assert_eq!(keys, vec!["Fire", "Marine"]);
        assert_eq!(parts["Fire"].len(), 2);

        let untouched = partition_categories(&recs, "Aviation");
        assert_eq!(untouched.len(), 3);
    }
}
