// Report configuration: source column names, output labels and the
// run-level options (fill value, pinned companies, excluded category).

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::error::{ReportError, Result};

/// Logical role → source column name for the nine raw fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldMap {
    pub year: String,
    pub category: String,
    pub product: String,
    pub company: String,
    pub month: String,
    pub policy_premium: String,
    pub endorsement_premium: String,
    pub paid_loss: String,
    pub unpaid_loss: String,
}

impl Default for FieldMap {
    fn default() -> Self {
        Self {
            year: "Year".to_string(),
            category: "Category".to_string(),
            product: "Product".to_string(),
            company: "Company".to_string(),
            month: "Month".to_string(),
            policy_premium: "PolicyPremium".to_string(),
            endorsement_premium: "EndorsementPremium".to_string(),
            paid_loss: "PaidLoss".to_string(),
            unpaid_loss: "UnpaidLoss".to_string(),
        }
    }
}

impl FieldMap {
    pub fn roles(&self) -> [(&'static str, &str); 9] {
        [
            ("year", &self.year),
            ("category", &self.category),
            ("product", &self.product),
            ("company", &self.company),
            ("month", &self.month),
            ("policy_premium", &self.policy_premium),
            ("endorsement_premium", &self.endorsement_premium),
            ("paid_loss", &self.paid_loss),
            ("unpaid_loss", &self.unpaid_loss),
        ]
    }
}

/// Names of the derived columns plus the synthetic market-total company.
///
/// `policy_count` doubles as the raw column the policy count is read from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputLabels {
    pub policy_count: String,
    pub premium: String,
    pub market_share: String,
    pub growth_rate: String,
    pub loss: String,
    pub loss_ratio: String,
    pub total_label: String,
}

impl Default for OutputLabels {
    fn default() -> Self {
        Self {
            policy_count: "PolicyCount".to_string(),
            premium: "Premium".to_string(),
            market_share: "MarketShare".to_string(),
            growth_rate: "GrowthRate".to_string(),
            loss: "Loss".to_string(),
            loss_ratio: "LossRatio".to_string(),
            total_label: "Market Total".to_string(),
        }
    }
}

impl OutputLabels {
    /// Metric headers in report column order.
    pub fn metric_headers(&self) -> [&str; 6] {
        [
            &self.policy_count,
            &self.premium,
            &self.market_share,
            &self.growth_rate,
            &self.loss,
            &self.loss_ratio,
        ]
    }

    fn all(&self) -> [(&'static str, &str); 7] {
        [
            ("policy_count", &self.policy_count),
            ("premium", &self.premium),
            ("market_share", &self.market_share),
            ("growth_rate", &self.growth_rate),
            ("loss", &self.loss),
            ("loss_ratio", &self.loss_ratio),
            ("total_label", &self.total_label),
        ]
    }
}

/// Pinned company names, given either as `"A B C"` or `["A", "B", "C"]`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum NameList {
    Spaced(String),
    Listed(Vec<String>),
}

impl From<NameList> for Vec<String> {
    fn from(list: NameList) -> Self {
        match list {
            NameList::Spaced(s) => split_names(&s),
            NameList::Listed(v) => v.into_iter().map(|n| n.trim().to_string()).collect(),
        }
    }
}

fn deserialize_names<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    NameList::deserialize(deserializer).map(Vec::from)
}

pub fn split_names(s: &str) -> Vec<String> {
    s.split_whitespace().map(str::to_string).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub fields: FieldMap,
    pub labels: OutputLabels,
    /// Substituted for every missing raw value.
    pub fill_value: f64,
    #[serde(deserialize_with = "deserialize_names")]
    pub top_3_company_names: Vec<String>,
    pub excluded_category_name: String,
    /// When set, the caller keeps only one statistic month before the
    /// engine runs.
    pub single_month_mode: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            fields: FieldMap::default(),
            labels: OutputLabels::default(),
            fill_value: 0.0,
            top_3_company_names: Vec::new(),
            excluded_category_name: "Nuclear Energy".to_string(),
            single_month_mode: false,
        }
    }
}

impl ReportConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: ReportConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations no report could be built from.
    pub fn validate(&self) -> Result<()> {
        for (role, name) in self.fields.roles() {
            if name.trim().is_empty() {
                return Err(ReportError::InvalidConfig(format!(
                    "no column name configured for {}",
                    role
                )));
            }
        }
        let mut seen = HashSet::new();
        for (role, label) in self.labels.all() {
            if label.trim().is_empty() {
                return Err(ReportError::InvalidConfig(format!(
                    "no label configured for {}",
                    role
                )));
            }
            if role != "total_label" && !seen.insert(label) {
                return Err(ReportError::InvalidConfig(format!(
                    "output label '{}' is used more than once",
                    label
                )));
            }
        }
        Ok(())
    }

    pub fn settings(&self) -> ReportSettings {
        ReportSettings {
            total_label: self.labels.total_label.clone(),
            excluded_category: self.excluded_category_name.clone(),
            pinned_companies: self.top_3_company_names.clone(),
        }
    }
}

/// The subset of the configuration the aggregation engine needs once
/// records are normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportSettings {
    pub total_label: String,
    pub excluded_category: String,
    pub pinned_companies: Vec<String>,
}

impl Default for ReportSettings {
    fn default() -> Self {
        ReportConfig::default().settings()
    }
}
