use insurance_report::loader::read_raw_table;
use insurance_report::{generate, Cell, ReportConfig, ReportError};

const LEDGER: &str = "\
Year,Category,Product,Company,Month,PolicyPremium,EndorsementPremium,PaidLoss,UnpaidLoss,PolicyCount
2022,Fire,P1,A,9,90,10,20,0,4
2022,Fire,P1,B,9,200,,50,10,6
2023,Fire,P1,A,9,150,,15,15,5
2023,Fire,P1,B,9,100,0,0,0,3
2023,Nuclear Energy,P1,A,9,500,0,0,0,1
2023, Marine ,P9,C,9,10,0,0,0,1
";

fn run(config: &ReportConfig) -> std::collections::BTreeMap<String, insurance_report::ReportTable> {
    let (raw, _) = read_raw_table(LEDGER.as_bytes()).unwrap();
    generate(&raw, config).unwrap()
}

#[test]
fn fire_example_metrics() {
    let tables = run(&ReportConfig::default());
    let fire = &tables["Fire"];
    let total = &ReportConfig::default().labels.total_label;

    let a_2023 = fire.get("A", 2023, "P1").unwrap();
    assert_eq!(a_2023.premium.to_string(), "150");
    assert_eq!(a_2023.market_share.to_string(), "60.00%");
    assert_eq!(a_2023.growth_rate.to_string(), "50.00%");
    assert_eq!(a_2023.loss_ratio.to_string(), "20.0%");

    let b_2023 = fire.get("B", 2023, "P1").unwrap();
    assert_eq!(b_2023.growth_rate.to_string(), "-50.00%");
    assert_eq!(b_2023.loss_ratio.to_string(), "0.0%");

    let market_2022 = fire.get(total, 2022, "P1").unwrap();
    assert_eq!(market_2022.premium.to_string(), "300");
    assert_eq!(market_2022.policy_count.to_string(), "10");
    assert_eq!(market_2022.growth_rate, Cell::Empty);

    let market_2023 = fire.get(total, 2023, "P1").unwrap();
    assert_eq!(market_2023.premium.to_string(), "250");
    assert_eq!(market_2023.growth_rate.to_string(), "-16.7%");
    assert_eq!(market_2023.market_share.to_string(), "100.0%");
    assert_eq!(market_2023.loss_ratio.to_string(), "12.0%");

    assert_eq!(fire.companies(), vec!["A", "B", total.as_str()]);
}

#[test]
fn excluded_category_and_trimming() {
    let tables = run(&ReportConfig::default());
    let keys: Vec<&str> = tables.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["Fire", "Marine"]);
}

#[test]
fn pinned_companies_lead_in_reverse_order() {
    let mut config = ReportConfig::default();
    config.top_3_company_names = vec!["B".to_string(), "Z".to_string(), "A".to_string()];
    let tables = run(&config);
    assert_eq!(tables["Fire"].companies()[..2], ["A", "B"]);
}

#[test]
fn missing_configured_column_aborts_run() {
    let mut config = ReportConfig::default();
    config.fields.unpaid_loss = "OutstandingLoss".to_string();
    let (raw, _) = read_raw_table(LEDGER.as_bytes()).unwrap();
    let err = generate(&raw, &config).unwrap_err();
    match err {
        ReportError::MissingColumn { role, column } => {
            assert_eq!(role, "unpaid_loss");
            assert_eq!(column, "OutstandingLoss");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn same_input_same_report() {
    let config = ReportConfig::default();
    assert_eq!(run(&config), run(&config));
}

#[test]
fn short_rows_are_filled_during_generate() {
    let (mut raw, _) = read_raw_table(LEDGER.as_bytes()).unwrap();
    raw.rows.push(vec![Some("2023".to_string()), Some("Fire".to_string())]);
    let tables = generate(&raw, &ReportConfig::default()).unwrap();
    let filled = tables["Fire"].get("0", 2023, "0").unwrap();
    assert_eq!(filled.premium.to_string(), "0");
    assert_eq!(filled.loss_ratio, Cell::Unavailable);
}
