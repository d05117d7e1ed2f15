use crate::aggregate::CategoryData;
use log::debug;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Company order for one category.
///
/// Baseline: descending total premium for the category's latest year,
/// summed across products. Companies without latest-year business rank
/// last; ties keep first-encounter order.
///
/// Each pinned name present in the baseline is then moved to the front,
/// one at a time in the given order, so the last pinned name processed
/// ends up first.
pub fn rank_companies(cat: &CategoryData, pinned: &[String]) -> Vec<String> {
    let baseline = baseline_order(cat);

    let mut front: Vec<&str> = Vec::new();
    for name in pinned {
        if baseline.iter().any(|c| c == name) {
            front.retain(|n| *n != name.as_str());
            front.insert(0, name.as_str());
        } else {
            debug!("pinned company '{}' has no business in {}", name, cat.name);
        }
    }

    let mut order: Vec<String> = front.iter().map(|n| n.to_string()).collect();
    order.extend(baseline.into_iter().filter(|c| !front.contains(&c.as_str())));
    order
}

fn baseline_order(cat: &CategoryData) -> Vec<String> {
    let mut latest: HashMap<&str, f64> = HashMap::new();
    if let Some(current) = cat.current_year() {
        for r in cat.records.iter().filter(|r| r.year == current) {
            *latest.entry(r.company.as_str()).or_insert(0.0) += r.premium;
        }
    }

    let mut ranked: Vec<(&str, Option<f64>)> = cat
        .companies
        .iter()
        .map(|c| (*c, latest.get(c).copied()))
        .collect();
    // Stable, so equal premiums keep encounter order.
    ranked.sort_by(|a, b| match (a.1, b.1) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    ranked.into_iter().map(|(c, _)| c.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PolicyRecord;

    fn rec(year: i32, company: &str, premium: f64) -> PolicyRecord {
        PolicyRecord {
            year,
            category: "Fire".to_string(),
            product: "P1".to_string(),
            company: company.to_string(),
            month: 9,
            policy_premium: premium,
            endorsement_premium: 0.0,
            paid_loss: 0.0,
            unpaid_loss: 0.0,
            policy_count: 1.0,
            premium,
            loss: 0.0,
        }
    }

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    fn sample() -> Vec<PolicyRecord> {
        vec![
            rec(2023, "A", 10.0),
            rec(2023, "B", 40.0),
            rec(2023, "C", 30.0),
            rec(2023, "D", 20.0),
            rec(2022, "E", 999.0),
            rec(2023, "B", 5.0),
        ]
    }

    #[test]
    fn orders_by_latest_year_premium() {
        let recs = sample();
        let cat = CategoryData::new("Fire", recs.iter().collect());
        assert_eq!(rank_companies(&cat, &[]), names(&["B", "C", "D", "A", "E"]));
    }

    #[test]
    fn pinned_names_front_inserted_in_reverse() {
        let recs = sample();
        let cat = CategoryData::new("Fire", recs.iter().collect());
        let pinned = names(&["A", "D", "E"]);
        assert_eq!(rank_companies(&cat, &pinned), names(&["E", "D", "A", "B", "C"]));
    }

    #[test]
    fn absent_pinned_names_are_skipped() {
        let recs = sample();
        let cat = CategoryData::new("Fire", recs.iter().collect());
        let pinned = names(&["Z", "C"]);
        assert_eq!(rank_companies(&cat, &pinned), names(&["C", "B", "D", "A", "E"]));
    }

    #[test]
    fn repeated_pinned_name_moves_to_front_again() {
        let recs = sample();
        let cat = CategoryData::new("Fire", recs.iter().collect());
        let pinned = names(&["A", "D", "A"]);
        assert_eq!(rank_companies(&cat, &pinned), names(&["A", "D", "B", "C", "E"]));
    }

    #[test]
    fn ties_keep_encounter_order() {
        let recs = vec![rec(2023, "X", 5.0), rec(2023, "Y", 5.0)];
        let cat = CategoryData::new("Fire", recs.iter().collect());
        assert_eq!(rank_companies(&cat, &[]), names(&["X", "Y"]));
    }
}
